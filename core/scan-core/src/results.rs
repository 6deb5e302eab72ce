//! Backend results and the operator-facing outcome of a scan cycle.

use serde::Serialize;
use ticket_scan_protocol::ServiceResponse;

use crate::error::ServiceError;
use crate::ticket::TicketId;

const UNKNOWN_BACKEND_ERROR: &str = "Unknown error";

/// Result of a `lookup` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupResult {
    ServerError { message: String, network: bool },
    NotFound,
    AlreadyCheckedIn {
        name: Option<String>,
        checkin_timestamp: Option<String>,
    },
    Found { name: Option<String> },
}

/// Result of a `checkin` call. `AlreadyCheckedIn` here means the race was lost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckinResult {
    ServerError { message: String, network: bool },
    NotFound,
    AlreadyCheckedIn {
        name: Option<String>,
        checkin_timestamp: Option<String>,
    },
    CheckedIn {
        name: Option<String>,
        checkin_timestamp: Option<String>,
    },
}

impl LookupResult {
    pub fn from_response(response: ServiceResponse) -> Self {
        if !response.success {
            return LookupResult::ServerError {
                message: backend_error(response.error),
                network: false,
            };
        }
        if !response.found {
            return LookupResult::NotFound;
        }
        if response.already_checked_in {
            return LookupResult::AlreadyCheckedIn {
                name: non_empty(response.name),
                checkin_timestamp: non_empty(response.checkin_value),
            };
        }
        LookupResult::Found {
            name: non_empty(response.name),
        }
    }

    pub fn from_call(result: Result<ServiceResponse, ServiceError>) -> Self {
        match result {
            Ok(response) => Self::from_response(response),
            Err(err) => LookupResult::ServerError {
                network: err.is_network(),
                message: err.to_string(),
            },
        }
    }
}

impl CheckinResult {
    pub fn from_response(response: ServiceResponse) -> Self {
        if !response.success {
            return CheckinResult::ServerError {
                message: backend_error(response.error),
                network: false,
            };
        }
        if !response.found {
            return CheckinResult::NotFound;
        }
        let name = non_empty(response.name);
        let checkin_timestamp = non_empty(response.checkin_value);
        if response.already_checked_in {
            CheckinResult::AlreadyCheckedIn {
                name,
                checkin_timestamp,
            }
        } else {
            CheckinResult::CheckedIn {
                name,
                checkin_timestamp,
            }
        }
    }

    pub fn from_call(result: Result<ServiceResponse, ServiceError>) -> Self {
        match result {
            Ok(response) => Self::from_response(response),
            Err(err) => CheckinResult::ServerError {
                network: err.is_network(),
                message: err.to_string(),
            },
        }
    }
}

fn backend_error(error: Option<String>) -> String {
    non_empty(error).unwrap_or_else(|| UNKNOWN_BACKEND_ERROR.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

/// What the operator is shown at the end of (or during) a scan cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    InvalidQr,
    NotFound {
        ticket: TicketId,
    },
    AlreadyCheckedIn {
        ticket: TicketId,
        name: Option<String>,
        checked_in_at: Option<String>,
    },
    ServerError {
        ticket: TicketId,
        message: String,
        network: bool,
    },
    Found {
        ticket: TicketId,
        name: Option<String>,
    },
    CheckedIn {
        ticket: TicketId,
        name: Option<String>,
        checked_in_at: Option<String>,
    },
    RaceLost {
        ticket: TicketId,
        name: Option<String>,
        checked_in_at: Option<String>,
    },
    CheckinFailed {
        ticket: TicketId,
        message: String,
        retry_allowed: bool,
    },
    Held {
        ticket: TicketId,
    },
}

impl Outcome {
    pub fn ticket(&self) -> Option<&TicketId> {
        match self {
            Outcome::InvalidQr => None,
            Outcome::NotFound { ticket }
            | Outcome::AlreadyCheckedIn { ticket, .. }
            | Outcome::ServerError { ticket, .. }
            | Outcome::Found { ticket, .. }
            | Outcome::CheckedIn { ticket, .. }
            | Outcome::RaceLost { ticket, .. }
            | Outcome::CheckinFailed { ticket, .. }
            | Outcome::Held { ticket } => Some(ticket),
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Outcome::CheckedIn { .. } => Severity::Success,
            Outcome::Found { .. } | Outcome::Held { .. } => Severity::Info,
            Outcome::AlreadyCheckedIn { .. } | Outcome::RaceLost { .. } => Severity::Warning,
            Outcome::InvalidQr
            | Outcome::NotFound { .. }
            | Outcome::ServerError { .. }
            | Outcome::CheckinFailed { .. } => Severity::Error,
        }
    }

    /// Stable short name used in logs and machine-readable output.
    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::InvalidQr => "invalid_qr",
            Outcome::NotFound { .. } => "not_found",
            Outcome::AlreadyCheckedIn { .. } => "already_checked_in",
            Outcome::ServerError { network: true, .. } => "network_error",
            Outcome::ServerError { .. } => "server_error",
            Outcome::Found { .. } => "found",
            Outcome::CheckedIn { .. } => "checked_in",
            Outcome::RaceLost { .. } => "race_lost",
            Outcome::CheckinFailed { .. } => "checkin_failed",
            Outcome::Held { .. } => "held",
        }
    }
}
