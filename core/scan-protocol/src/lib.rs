//! Wire types and validation for the ticket backend.
//!
//! This crate is shared by the scanner core and its clients to prevent schema
//! drift. The backend is a spreadsheet-backed web app answering HTTP GET
//! requests of the form `?action=<lookup|checkin>&ticketId=<id>` with a flat
//! JSON object.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const ACTION_PARAM: &str = "action";
pub const TICKET_PARAM: &str = "ticketId";
pub const MAX_RESPONSE_BYTES: usize = 64 * 1024; // 64KB

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Lookup,
    Checkin,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Lookup => "lookup",
            Action::Checkin => "checkin",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response body shared by both actions.
///
/// A checkin against an already-checked-in ticket answers with
/// `alreadyCheckedIn: true` instead of an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResponse {
    pub success: bool,
    #[serde(default)]
    pub found: bool,
    #[serde(default)]
    pub already_checked_in: bool,
    #[serde(
        default,
        deserialize_with = "scalar_as_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    // Spreadsheet cells may come back as strings, numbers or dates.
    #[serde(
        default,
        deserialize_with = "scalar_as_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub checkin_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Query parameters for one request. The ticket id must already be normalized;
/// percent-encoding is left to the HTTP layer.
pub fn query_pairs(action: Action, ticket_id: &str) -> [(&'static str, String); 2] {
    [
        (ACTION_PARAM, action.as_str().to_string()),
        (TICKET_PARAM, ticket_id.to_string()),
    ]
}

pub fn parse_response(body: &[u8]) -> Result<ServiceResponse, ErrorInfo> {
    if body.len() > MAX_RESPONSE_BYTES {
        return Err(ErrorInfo::new(
            "response_too_large",
            format!("response exceeded {} bytes", MAX_RESPONSE_BYTES),
        ));
    }
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(ErrorInfo::new("empty_response", "response body was empty"));
    }

    let value: Value = serde_json::from_slice(body).map_err(|err| {
        ErrorInfo::new(
            "invalid_json",
            format!("response is not valid JSON: {}", err),
        )
    })?;
    if !value.is_object() {
        return Err(ErrorInfo::new(
            "invalid_shape",
            "response must be a JSON object",
        ));
    }

    serde_json::from_value(value).map_err(|err| {
        ErrorInfo::new(
            "invalid_shape",
            format!("response does not match the ticket schema: {}", err),
        )
    })
}

fn scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(other) => Some(other.to_string()),
    })
}
