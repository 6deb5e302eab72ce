//! Presentation model for the operator screen.
//!
//! A pure function of the session state and the latest outcome; renderers
//! (terminal, web view) only lay it out.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::results::{Outcome, Severity};
use crate::session::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorAction {
    Start,
    Confirm,
    Hold,
    ScanNext,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultCard {
    pub title: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked_in_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayModel {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<ResultCard>,
    pub actions: Vec<OperatorAction>,
}

impl DisplayModel {
    pub fn render(state: &SessionState, outcome: Option<&Outcome>) -> Self {
        let status = status_text(state);
        let card = match state {
            SessionState::AwaitingLookup { .. } => None,
            _ => outcome.map(ResultCard::from_outcome),
        };
        let actions = match state {
            SessionState::Idle => vec![OperatorAction::Start],
            SessionState::AwaitingDecision { .. } => {
                vec![OperatorAction::Confirm, OperatorAction::Hold]
            }
            SessionState::Scanning if card.is_some() => vec![OperatorAction::ScanNext],
            _ => Vec::new(),
        };
        Self {
            status,
            card,
            actions,
        }
    }

    pub fn can_confirm(&self) -> bool {
        self.actions.contains(&OperatorAction::Confirm)
    }

    pub fn can_hold(&self) -> bool {
        self.actions.contains(&OperatorAction::Hold)
    }
}

fn status_text(state: &SessionState) -> String {
    match state {
        SessionState::Idle => "Camera off".to_string(),
        SessionState::Scanning => "Scanning for a ticket QR code".to_string(),
        SessionState::AwaitingLookup { call, .. } => format!("Looking up {}…", call.ticket),
        SessionState::AwaitingDecision { .. } => {
            "Verify the attendee, then confirm or hold".to_string()
        }
        SessionState::Confirming { ticket, .. } => format!("Checking in {}…", ticket),
        SessionState::Terminated { reason } => format!("Scanner stopped ({})", reason),
    }
}

impl ResultCard {
    pub fn from_outcome(outcome: &Outcome) -> Self {
        let mut card = ResultCard {
            title: String::new(),
            severity: outcome.severity(),
            ticket_id: outcome.ticket().map(|t| t.to_string()),
            name: None,
            checked_in_at: None,
            hint: None,
        };

        match outcome {
            Outcome::InvalidQr => {
                card.title = "Invalid QR code".to_string();
                card.hint = Some("The code does not contain a ticket id".to_string());
            }
            Outcome::NotFound { .. } => {
                card.title = "Ticket not found".to_string();
                card.hint = Some("Check that the ticket belongs to this event".to_string());
            }
            Outcome::AlreadyCheckedIn {
                name,
                checked_in_at,
                ..
            } => {
                card.title = "Already checked in".to_string();
                card.name = name.clone();
                card.checked_in_at = checked_in_at.as_deref().map(format_checkin_time);
                card.hint = Some("This ticket has been used".to_string());
            }
            Outcome::ServerError {
                message, network, ..
            } => {
                card.title = if *network {
                    "Network error".to_string()
                } else {
                    "Server error".to_string()
                };
                card.hint = Some(message.clone());
            }
            Outcome::Found { name, .. } => {
                card.title = "Ticket found".to_string();
                card.name = name.clone();
                card.hint = Some("Check the attendee, then confirm or hold".to_string());
            }
            Outcome::CheckedIn {
                name,
                checked_in_at,
                ..
            } => {
                card.title = "Checked in".to_string();
                card.name = name.clone();
                card.checked_in_at = checked_in_at.as_deref().map(format_checkin_time);
            }
            Outcome::RaceLost {
                name,
                checked_in_at,
                ..
            } => {
                card.title = "Already checked in".to_string();
                card.name = name.clone();
                card.checked_in_at = checked_in_at.as_deref().map(format_checkin_time);
                card.hint = Some("Another scanner checked this ticket in first".to_string());
            }
            Outcome::CheckinFailed {
                message,
                retry_allowed,
                ..
            } => {
                card.title = "Check-in failed".to_string();
                card.hint = Some(if *retry_allowed {
                    format!("{}; confirm again to retry", message)
                } else {
                    message.clone()
                });
            }
            Outcome::Held { .. } => {
                card.title = "On hold".to_string();
                card.hint = Some("Not checked in; scan again when ready".to_string());
            }
        }

        card
    }
}

/// Renders backend timestamps as UTC when they parse as RFC3339 and passes
/// anything else (spreadsheet display strings) through untouched.
pub fn format_checkin_time(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| {
            dt.with_timezone(&Utc)
                .format("%Y-%m-%d %H:%M:%S UTC")
                .to_string()
        })
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{PendingCall, RequestToken};
    use crate::ticket::TicketId;
    use ticket_scan_protocol::Action;

    fn ticket() -> TicketId {
        TicketId::parse("t-1").unwrap()
    }

    #[test]
    fn decision_state_offers_confirm_and_hold() {
        let state = SessionState::AwaitingDecision {
            ticket: ticket(),
            name: Some("Alice".to_string()),
            failed_attempts: 0,
        };
        let outcome = Outcome::Found {
            ticket: ticket(),
            name: Some("Alice".to_string()),
        };
        let model = DisplayModel::render(&state, Some(&outcome));
        assert_eq!(
            model.actions,
            vec![OperatorAction::Confirm, OperatorAction::Hold]
        );
        let card = model.card.unwrap();
        assert_eq!(card.title, "Ticket found");
        assert_eq!(card.name.as_deref(), Some("Alice"));
        assert_eq!(card.ticket_id.as_deref(), Some("t-1"));
    }

    #[test]
    fn actions_hidden_outside_decision() {
        let state = SessionState::Confirming {
            ticket: ticket(),
            name: None,
            call: PendingCall {
                token: RequestToken(3),
                action: Action::Checkin,
                ticket: ticket(),
            },
            failed_attempts: 0,
        };
        let model = DisplayModel::render(&state, None);
        assert!(model.actions.is_empty());
        assert_eq!(model.status, "Checking in t-1…");
    }

    #[test]
    fn scanning_with_result_offers_scan_next() {
        let outcome = Outcome::NotFound { ticket: ticket() };
        let model = DisplayModel::render(&SessionState::Scanning, Some(&outcome));
        assert_eq!(model.actions, vec![OperatorAction::ScanNext]);
        assert_eq!(model.card.unwrap().severity, Severity::Error);

        let model = DisplayModel::render(&SessionState::Scanning, None);
        assert!(model.actions.is_empty());
    }

    #[test]
    fn race_lost_card_is_warning_with_time() {
        let outcome = Outcome::RaceLost {
            ticket: ticket(),
            name: None,
            checked_in_at: Some("2024-01-01T10:00:00Z".to_string()),
        };
        let card = ResultCard::from_outcome(&outcome);
        assert_eq!(card.severity, Severity::Warning);
        assert_eq!(card.checked_in_at.as_deref(), Some("2024-01-01 10:00:00 UTC"));
    }

    #[test]
    fn network_and_server_errors_have_distinct_titles() {
        let network = ResultCard::from_outcome(&Outcome::ServerError {
            ticket: ticket(),
            message: "timeout".to_string(),
            network: true,
        });
        let server = ResultCard::from_outcome(&Outcome::ServerError {
            ticket: ticket(),
            message: "Sheet missing".to_string(),
            network: false,
        });
        assert_eq!(network.title, "Network error");
        assert_eq!(server.title, "Server error");
        assert_eq!(server.hint.as_deref(), Some("Sheet missing"));
    }

    #[test]
    fn format_checkin_time_passes_through_sheet_strings() {
        assert_eq!(format_checkin_time("1/1/2024 10:00:00"), "1/1/2024 10:00:00");
        assert_eq!(
            format_checkin_time("2024-01-01T12:00:00+02:00"),
            "2024-01-01 10:00:00 UTC"
        );
    }
}
