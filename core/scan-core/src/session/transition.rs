//! Maps backend results to the session's next step.
//! Anything that needs no operator decision sends the session back to scanning.

use crate::results::{CheckinResult, LookupResult, Outcome};
use crate::ticket::TicketId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Next {
    ResumeScanning,
    AwaitDecision {
        name: Option<String>,
        failed_attempts: u32,
    },
}

pub fn after_lookup(ticket: &TicketId, result: LookupResult) -> (Next, Outcome) {
    let ticket = ticket.clone();
    match result {
        LookupResult::ServerError { message, network } => (
            Next::ResumeScanning,
            Outcome::ServerError {
                ticket,
                message,
                network,
            },
        ),
        LookupResult::NotFound => (Next::ResumeScanning, Outcome::NotFound { ticket }),
        LookupResult::AlreadyCheckedIn {
            name,
            checkin_timestamp,
        } => (
            Next::ResumeScanning,
            Outcome::AlreadyCheckedIn {
                ticket,
                name,
                checked_in_at: checkin_timestamp,
            },
        ),
        LookupResult::Found { name } => (
            Next::AwaitDecision {
                name: name.clone(),
                failed_attempts: 0,
            },
            Outcome::Found { ticket, name },
        ),
    }
}

/// `max_attempts == 0` allows unlimited retries of a failed check-in.
pub fn after_checkin(
    ticket: &TicketId,
    name: Option<String>,
    failed_attempts: u32,
    max_attempts: u32,
    result: CheckinResult,
) -> (Next, Outcome) {
    let ticket = ticket.clone();
    match result {
        CheckinResult::CheckedIn {
            name: checked_name,
            checkin_timestamp,
        } => (
            Next::ResumeScanning,
            Outcome::CheckedIn {
                ticket,
                name: checked_name.or(name),
                checked_in_at: checkin_timestamp,
            },
        ),
        CheckinResult::AlreadyCheckedIn {
            name: checked_name,
            checkin_timestamp,
        } => (
            Next::ResumeScanning,
            Outcome::RaceLost {
                ticket,
                name: checked_name.or(name),
                checked_in_at: checkin_timestamp,
            },
        ),
        CheckinResult::NotFound => (
            Next::ResumeScanning,
            Outcome::CheckinFailed {
                ticket,
                message: "ticket no longer exists".to_string(),
                retry_allowed: false,
            },
        ),
        CheckinResult::ServerError { message, .. } => {
            let failed_attempts = failed_attempts.saturating_add(1);
            let exhausted = max_attempts > 0 && failed_attempts >= max_attempts;
            let outcome = Outcome::CheckinFailed {
                ticket,
                message,
                retry_allowed: !exhausted,
            };
            if exhausted {
                (Next::ResumeScanning, outcome)
            } else {
                (
                    Next::AwaitDecision {
                        name,
                        failed_attempts,
                    },
                    outcome,
                )
            }
        }
    }
}
