use std::fmt;

use ticket_scan_protocol::Action;

use crate::ticket::TicketId;

/// Identifies one network call issued by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken(pub(crate) u64);

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// The single request a session is waiting on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCall {
    pub token: RequestToken,
    pub action: Action,
    pub ticket: TicketId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Scanning,
    AwaitingLookup {
        raw: String,
        call: PendingCall,
    },
    AwaitingDecision {
        ticket: TicketId,
        name: Option<String>,
        failed_attempts: u32,
    },
    Confirming {
        ticket: TicketId,
        name: Option<String>,
        call: PendingCall,
        failed_attempts: u32,
    },
    Terminated {
        reason: String,
    },
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Scanning => "scanning",
            SessionState::AwaitingLookup { .. } => "awaiting_lookup",
            SessionState::AwaitingDecision { .. } => "awaiting_decision",
            SessionState::Confirming { .. } => "confirming",
            SessionState::Terminated { .. } => "terminated",
        }
    }

    pub fn pending_call(&self) -> Option<&PendingCall> {
        match self {
            SessionState::AwaitingLookup { call, .. } | SessionState::Confirming { call, .. } => {
                Some(call)
            }
            _ => None,
        }
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self, SessionState::Terminated { .. })
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one frame handed to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The session is not scanning; the frame was not decoded.
    Ignored,
    NoCode,
    /// Same payload as the previous detection.
    Duplicate,
    /// Payload was empty after normalization. Scanning continues.
    InvalidQr,
    /// A new ticket was read; the lookup described here is now pending.
    Detected(PendingCall),
}
