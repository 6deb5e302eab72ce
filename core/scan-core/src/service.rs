//! Seam between the session and the ticket backend.

use ticket_scan_protocol::{Action, ServiceResponse};
use tracing::debug;

use crate::error::ServiceError;
use crate::results::{CheckinResult, LookupResult};
use crate::ticket::TicketId;

/// A backend that answers `lookup` and `checkin` for a normalized ticket id.
///
/// Implementations own their timeout; a call that does not complete in time
/// must return [`ServiceError::Timeout`] rather than block forever.
pub trait TicketService {
    fn call(&self, action: Action, ticket: &TicketId) -> Result<ServiceResponse, ServiceError>;
}

impl<T: TicketService + ?Sized> TicketService for &T {
    fn call(&self, action: Action, ticket: &TicketId) -> Result<ServiceResponse, ServiceError> {
        (**self).call(action, ticket)
    }
}

impl<T: TicketService + ?Sized> TicketService for Box<T> {
    fn call(&self, action: Action, ticket: &TicketId) -> Result<ServiceResponse, ServiceError> {
        (**self).call(action, ticket)
    }
}

pub fn lookup_ticket<S: TicketService + ?Sized>(service: &S, ticket: &TicketId) -> LookupResult {
    let result = service.call(Action::Lookup, ticket);
    if let Err(err) = &result {
        debug!(ticket = %ticket, error = %err, "Lookup call failed");
    }
    LookupResult::from_call(result)
}

pub fn checkin_ticket<S: TicketService + ?Sized>(service: &S, ticket: &TicketId) -> CheckinResult {
    let result = service.call(Action::Checkin, ticket);
    if let Err(err) = &result {
        debug!(ticket = %ticket, error = %err, "Check-in call failed");
    }
    CheckinResult::from_call(result)
}
