//! HTTP client for the ticket backend.
//!
//! Every request carries the configured timeout so a hung backend surfaces as
//! a `timeout` server error instead of stalling the session.

use reqwest::blocking::Client;
use reqwest::Url;
use scan_core::{ServiceError, TicketId, TicketService};
use std::io::{self, Read};
use std::time::Duration;
use ticket_scan_protocol::{
    parse_response, query_pairs, Action, ErrorInfo, ServiceResponse, MAX_RESPONSE_BYTES,
};

pub struct HttpTicketService {
    client: Client,
    endpoint: Url,
}

impl HttpTicketService {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, String> {
        let endpoint = Url::parse(endpoint.trim())
            .map_err(|err| format!("Invalid service URL {}: {}", endpoint, err))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| format!("Failed to build HTTP client: {}", err))?;
        Ok(Self { client, endpoint })
    }

    fn request_url(&self, action: Action, ticket: &TicketId) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in query_pairs(action, ticket.as_str()) {
                query.append_pair(key, &value);
            }
        }
        url
    }
}

impl TicketService for HttpTicketService {
    fn call(&self, action: Action, ticket: &TicketId) -> Result<ServiceResponse, ServiceError> {
        let url = self.request_url(action, ticket);
        tracing::debug!(action = %action, ticket = %ticket, "Calling ticket service");

        let response = self.client.get(url).send().map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(action = %action, status = status.as_u16(), "Ticket service returned error status");
            return Err(ServiceError::Status(status.as_u16()));
        }

        let limit = MAX_RESPONSE_BYTES as u64;
        if response.content_length().is_some_and(|len| len > limit) {
            tracing::warn!(action = %action, "Ticket service response exceeds size cap");
            return Err(ServiceError::from(too_large()));
        }

        // Read one byte past the cap so parse_response can reject the body.
        let mut body = Vec::new();
        response
            .take(limit + 1)
            .read_to_end(&mut body)
            .map_err(body_error)?;
        parse_response(&body).map_err(|info| {
            tracing::warn!(action = %action, code = %info.code, "Ticket service returned malformed body");
            ServiceError::from(info)
        })
    }
}

fn too_large() -> ErrorInfo {
    ErrorInfo::new(
        "response_too_large",
        format!("response exceeded {} bytes", MAX_RESPONSE_BYTES),
    )
}

fn body_error(err: io::Error) -> ServiceError {
    if err.kind() == io::ErrorKind::TimedOut {
        return ServiceError::Timeout;
    }
    match err.get_ref().and_then(|inner| inner.downcast_ref::<reqwest::Error>()) {
        Some(inner) if inner.is_timeout() => ServiceError::Timeout,
        _ => ServiceError::Network(err.to_string()),
    }
}

fn transport_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::Timeout
    } else {
        ServiceError::Network(err.to_string())
    }
}
