//! Error types for scan-core operations.

use std::path::PathBuf;

// ═══════════════════════════════════════════════════════════════════════════════
// Session Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// All errors that can occur while driving a scan session.
///
/// Ticket outcomes (not found, already checked in, backend failures) are not
/// errors; they are reported as [`crate::Outcome`] values. These variants cover
/// operator actions that cannot be applied and resources that cannot be had.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    // ─────────────────────────────────────────────────────────────────────
    // Camera Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),

    // ─────────────────────────────────────────────────────────────────────
    // State Machine Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Cannot {operation} while {state}")]
    InvalidTransition {
        operation: &'static str,
        state: String,
    },

    #[error("A check-in for this ticket is already in flight")]
    CheckinInFlight,

    #[error("Ticket {requested} is not the pending ticket ({pending})")]
    TicketMismatch { requested: String, pending: String },

    #[error("Session has been stopped")]
    Terminated,

    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    #[error("Configuration read failed: {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No ticket service URL configured")]
    MissingServiceUrl,
}

/// Convenience type alias for Results using ScanError.
pub type Result<T> = std::result::Result<T, ScanError>;

impl From<ScanError> for String {
    fn from(err: ScanError) -> String {
        err.to_string()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Ticket Service Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Transport-level failure talking to the ticket backend.
///
/// Every variant collapses into a `ServerError` result for the operator; the
/// variant is kept so the display can tell a dead network from a bad reply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("timeout")]
    Timeout,

    #[error("backend returned HTTP {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ServiceError {
    pub fn is_network(&self) -> bool {
        matches!(self, ServiceError::Network(_) | ServiceError::Timeout)
    }
}

impl From<ticket_scan_protocol::ErrorInfo> for ServiceError {
    fn from(info: ticket_scan_protocol::ErrorInfo) -> Self {
        ServiceError::Malformed(info.to_string())
    }
}
