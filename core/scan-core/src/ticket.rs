//! Ticket identifiers as decoded from QR payloads.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical form of a scanned payload: newlines removed, surrounding
/// whitespace trimmed, lowercased.
pub fn normalize(raw: &str) -> String {
    raw.replace(['\r', '\n'], "").trim().to_lowercase()
}

/// A normalized, non-empty ticket identifier.
///
/// Equality is by normalized value, so `" ABC-1\n"` and `"abc-1"` are the
/// same ticket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TicketId(String);

impl TicketId {
    /// Returns `None` when the payload is empty after normalization.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = normalize(raw);
        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TicketId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TicketId::parse(&value).ok_or_else(|| "ticket id is empty".to_string())
    }
}

impl From<TicketId> for String {
    fn from(id: TicketId) -> String {
        id.0
    }
}
