//! Single lookup or check-in outside a scan session.

use scan_core::{
    after_checkin, after_lookup, checkin_ticket, lookup_ticket, Action, DisplayModel, Outcome,
    ResultCard, Severity, TicketId, TicketService,
};
use std::io::Write;

use crate::render::write_display;

pub fn run<S, W>(
    service: &S,
    action: Action,
    raw_ticket: &str,
    json: bool,
    out: &mut W,
) -> Result<Severity, String>
where
    S: TicketService + ?Sized,
    W: Write,
{
    let ticket = TicketId::parse(raw_ticket).ok_or_else(|| "Ticket id is empty".to_string())?;

    // No operator is waiting to retry a one-shot check-in.
    let (_, outcome) = match action {
        Action::Lookup => after_lookup(&ticket, lookup_ticket(service, &ticket)),
        Action::Checkin => after_checkin(&ticket, None, 0, 1, checkin_ticket(service, &ticket)),
    };
    tracing::info!(
        action = %action,
        ticket = %ticket,
        outcome = outcome.kind(),
        "One-shot request completed"
    );

    let mut card = ResultCard::from_outcome(&outcome);
    match &outcome {
        Outcome::Found { .. } => {
            card.hint = Some(format!("Run `ticket-scan checkin {}` to admit", ticket));
        }
        Outcome::RaceLost { .. } => card.hint = Some("This ticket has been used".to_string()),
        _ => {}
    }

    let model = DisplayModel {
        status: format!("{} {}", action, ticket),
        card: Some(card),
        actions: Vec::new(),
    };
    write_display(out, &model, json).map_err(|err| format!("Failed to write output: {}", err))?;
    Ok(outcome.severity())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scan_core::{ServiceError, ServiceResponse};

    struct Fixed(Result<ServiceResponse, ServiceError>);

    impl TicketService for Fixed {
        fn call(
            &self,
            _action: Action,
            _ticket: &TicketId,
        ) -> Result<ServiceResponse, ServiceError> {
            self.0.clone()
        }
    }

    fn run_text(service: &Fixed, action: Action, ticket: &str) -> (Severity, String) {
        let mut out = Vec::new();
        let severity = run(service, action, ticket, false, &mut out).unwrap();
        (severity, String::from_utf8(out).unwrap())
    }

    #[test]
    fn checkin_of_used_ticket_is_warning() {
        let service = Fixed(Ok(ServiceResponse {
            success: true,
            found: true,
            already_checked_in: true,
            checkin_value: Some("2024-01-01T10:00:00Z".to_string()),
            ..ServiceResponse::default()
        }));
        let (severity, output) = run_text(&service, Action::Checkin, "T-1");
        assert_eq!(severity, Severity::Warning);
        assert!(output.contains("Checked in: 2024-01-01 10:00:00 UTC"));
        assert!(output.contains("checkin t-1"));
    }

    #[test]
    fn lookup_found_points_to_checkin() {
        let service = Fixed(Ok(ServiceResponse {
            success: true,
            found: true,
            name: Some("Alice".to_string()),
            ..ServiceResponse::default()
        }));
        let (severity, output) = run_text(&service, Action::Lookup, " T-1 ");
        assert_eq!(severity, Severity::Info);
        assert!(output.contains("ticket-scan checkin t-1"));
    }

    #[test]
    fn timeout_is_error() {
        let (severity, output) = run_text(&Fixed(Err(ServiceError::Timeout)), Action::Lookup, "t");
        assert_eq!(severity, Severity::Error);
        assert!(output.contains("Network error"));
    }

    #[test]
    fn empty_ticket_is_rejected_before_calling() {
        let mut out = Vec::new();
        let service = Fixed(Err(ServiceError::Timeout));
        assert!(run(&service, Action::Lookup, " \n", false, &mut out).is_err());
        assert!(out.is_empty());
    }
}
