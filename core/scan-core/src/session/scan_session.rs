use ticket_scan_protocol::Action;
use tracing::{debug, info, warn};

use super::transition::{after_checkin, after_lookup, Next};
use super::types::{FrameOutcome, PendingCall, RequestToken, SessionState};
use crate::camera::{Camera, Frame, FrameDecoder};
use crate::display::DisplayModel;
use crate::error::{Result, ScanError};
use crate::results::{CheckinResult, LookupResult, Outcome};
use crate::service::{checkin_ticket, lookup_ticket, TicketService};
use crate::ticket::{normalize, TicketId};

const STOP_REASON: &str = "stopped by operator";

/// One operator's scanning session.
///
/// Owns the camera and decoder. Not thread-safe; a driver that runs network
/// calls elsewhere hands results back through [`ScanSession::complete_lookup`]
/// and [`ScanSession::complete_checkin`].
pub struct ScanSession<C: Camera, D: FrameDecoder> {
    camera: C,
    decoder: D,
    camera_active: bool,
    state: SessionState,
    last_scanned: Option<String>,
    last_outcome: Option<Outcome>,
    next_token: u64,
    max_confirm_attempts: u32,
}

impl<C: Camera, D: FrameDecoder> ScanSession<C, D> {
    pub fn new(camera: C, decoder: D) -> Self {
        Self {
            camera,
            decoder,
            camera_active: false,
            state: SessionState::Idle,
            last_scanned: None,
            last_outcome: None,
            next_token: 1,
            max_confirm_attempts: 0,
        }
    }

    /// Caps how many failed check-ins a pending ticket may see before the
    /// session gives up and resumes scanning. `0` means unlimited.
    pub fn with_max_confirm_attempts(mut self, attempts: u32) -> Self {
        self.max_confirm_attempts = attempts;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn last_outcome(&self) -> Option<&Outcome> {
        self.last_outcome.as_ref()
    }

    pub fn last_scanned(&self) -> Option<&str> {
        self.last_scanned.as_deref()
    }

    pub fn camera_active(&self) -> bool {
        self.camera_active
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    pub fn pending_call(&self) -> Option<&PendingCall> {
        self.state.pending_call()
    }

    pub fn display(&self) -> DisplayModel {
        DisplayModel::render(&self.state, self.last_outcome.as_ref())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Camera lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Acquires the camera and begins scanning. Also the retry entry point
    /// after a camera failure left the session idle.
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            SessionState::Idle => self.resume_scanning(),
            SessionState::Terminated { .. } => Err(ScanError::Terminated),
            _ => Err(self.invalid("start")),
        }
    }

    /// Releases the camera and ends the session. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.release_camera();
        if self.state.is_terminated() {
            return;
        }
        if let Some(call) = self.state.pending_call() {
            debug!(token = %call.token, action = %call.action, "Abandoning pending call");
        }
        info!(from = %self.state, "Scan session stopped");
        self.state = SessionState::Terminated {
            reason: STOP_REASON.to_string(),
        };
    }

    /// The operator's "scan next" control: clears the result card and the
    /// duplicate filter so the same ticket can be read again.
    pub fn scan_next(&mut self) -> Result<()> {
        match self.state {
            SessionState::Scanning | SessionState::Idle => {
                self.last_outcome = None;
                self.last_scanned = None;
                self.resume_scanning()
            }
            SessionState::Terminated { .. } => Err(ScanError::Terminated),
            _ => Err(self.invalid("scan next")),
        }
    }

    fn resume_scanning(&mut self) -> Result<()> {
        if !self.camera_active {
            if let Err(err) = self.camera.acquire() {
                warn!(error = %err, "Failed to acquire camera");
                self.state = SessionState::Idle;
                return Err(ScanError::CameraUnavailable(err.to_string()));
            }
            self.camera_active = true;
            debug!("Camera acquired");
        }
        self.state = SessionState::Scanning;
        Ok(())
    }

    fn release_camera(&mut self) {
        if self.camera_active {
            self.camera.release();
            self.camera_active = false;
            debug!("Camera released");
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Frames
    // ─────────────────────────────────────────────────────────────────────

    /// Captures one frame from the camera and processes it. Capture failures
    /// count as a frame without a code.
    pub fn tick(&mut self) -> FrameOutcome {
        if self.state != SessionState::Scanning {
            return FrameOutcome::Ignored;
        }
        match self.camera.capture() {
            Ok(Some(frame)) => self.on_frame(&frame),
            Ok(None) => FrameOutcome::NoCode,
            Err(err) => {
                debug!(error = %err, "Frame capture failed");
                FrameOutcome::NoCode
            }
        }
    }

    pub fn on_frame(&mut self, frame: &Frame) -> FrameOutcome {
        if self.state != SessionState::Scanning {
            return FrameOutcome::Ignored;
        }
        match self.decoder.decode(frame) {
            Some(raw) => self.on_payload(raw),
            None => FrameOutcome::NoCode,
        }
    }

    fn on_payload(&mut self, raw: String) -> FrameOutcome {
        let normalized = normalize(&raw);
        if self.last_scanned.as_deref() == Some(normalized.as_str()) {
            return FrameOutcome::Duplicate;
        }
        self.last_scanned = Some(normalized);

        let ticket = match TicketId::parse(&raw) {
            Some(ticket) => ticket,
            None => {
                info!("Scanned code contained no ticket id");
                self.last_outcome = Some(Outcome::InvalidQr);
                return FrameOutcome::InvalidQr;
            }
        };

        info!(ticket = %ticket, "Ticket detected");
        let call = self.issue_call(Action::Lookup, ticket);
        self.last_outcome = None;
        self.state = SessionState::AwaitingLookup {
            raw,
            call: call.clone(),
        };
        self.release_camera();
        FrameOutcome::Detected(call)
    }

    fn issue_call(&mut self, action: Action, ticket: TicketId) -> PendingCall {
        let token = RequestToken(self.next_token);
        self.next_token += 1;
        PendingCall {
            token,
            action,
            ticket,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Lookup
    // ─────────────────────────────────────────────────────────────────────

    /// Runs the pending lookup against `service` and applies the result.
    pub fn lookup<S: TicketService + ?Sized>(&mut self, service: &S) -> Result<Outcome> {
        let call = match &self.state {
            SessionState::AwaitingLookup { call, .. } => call.clone(),
            SessionState::Terminated { .. } => return Err(ScanError::Terminated),
            _ => return Err(self.invalid("look up")),
        };
        let result = lookup_ticket(service, &call.ticket);
        self.complete_lookup(call.token, result)?
            .ok_or_else(|| self.invalid("look up"))
    }

    /// Applies a lookup result. Returns `Ok(None)` when the token no longer
    /// matches the pending call; the result is dropped.
    pub fn complete_lookup(
        &mut self,
        token: RequestToken,
        result: LookupResult,
    ) -> Result<Option<Outcome>> {
        let ticket = match &self.state {
            SessionState::AwaitingLookup { call, .. } if call.token == token => call.ticket.clone(),
            _ => {
                debug!(token = %token, state = %self.state, "Dropping stale lookup result");
                return Ok(None);
            }
        };

        let (next, outcome) = after_lookup(&ticket, result);
        info!(ticket = %ticket, outcome = outcome.kind(), "Lookup completed");
        self.last_outcome = Some(outcome.clone());
        self.advance(ticket, next)?;
        Ok(Some(outcome))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Decision
    // ─────────────────────────────────────────────────────────────────────

    /// Starts the check-in for the ticket awaiting a decision. A second call
    /// while the first is outstanding fails with [`ScanError::CheckinInFlight`].
    pub fn begin_confirm(&mut self, ticket: &TicketId) -> Result<PendingCall> {
        let (pending, name, failed_attempts) = match &self.state {
            SessionState::AwaitingDecision {
                ticket,
                name,
                failed_attempts,
            } => (ticket.clone(), name.clone(), *failed_attempts),
            SessionState::Confirming { .. } => return Err(ScanError::CheckinInFlight),
            SessionState::Terminated { .. } => return Err(ScanError::Terminated),
            _ => return Err(self.invalid("confirm")),
        };
        if *ticket != pending {
            return Err(ScanError::TicketMismatch {
                requested: ticket.to_string(),
                pending: pending.to_string(),
            });
        }

        let call = self.issue_call(Action::Checkin, pending.clone());
        info!(ticket = %pending, attempt = failed_attempts + 1, "Check-in confirmed by operator");
        self.state = SessionState::Confirming {
            ticket: pending,
            name,
            call: call.clone(),
            failed_attempts,
        };
        Ok(call)
    }

    /// Confirms the pending ticket and runs the check-in against `service`.
    pub fn confirm<S: TicketService + ?Sized>(
        &mut self,
        ticket: &TicketId,
        service: &S,
    ) -> Result<Outcome> {
        let call = self.begin_confirm(ticket)?;
        let result = checkin_ticket(service, &call.ticket);
        self.complete_checkin(call.token, result)?
            .ok_or_else(|| self.invalid("confirm"))
    }

    /// Applies a check-in result. Returns `Ok(None)` when the token no longer
    /// matches the pending call; the result is dropped.
    pub fn complete_checkin(
        &mut self,
        token: RequestToken,
        result: CheckinResult,
    ) -> Result<Option<Outcome>> {
        let (ticket, name, failed_attempts) = match &self.state {
            SessionState::Confirming {
                ticket,
                name,
                call,
                failed_attempts,
            } if call.token == token => (ticket.clone(), name.clone(), *failed_attempts),
            _ => {
                debug!(token = %token, state = %self.state, "Dropping stale check-in result");
                return Ok(None);
            }
        };

        let (next, outcome) = after_checkin(
            &ticket,
            name,
            failed_attempts,
            self.max_confirm_attempts,
            result,
        );
        info!(ticket = %ticket, outcome = outcome.kind(), "Check-in completed");
        self.last_outcome = Some(outcome.clone());
        self.advance(ticket, next)?;
        Ok(Some(outcome))
    }

    /// Sets the pending ticket aside without checking it in.
    pub fn hold(&mut self) -> Result<Outcome> {
        let ticket = match &self.state {
            SessionState::AwaitingDecision { ticket, .. } => ticket.clone(),
            SessionState::Confirming { .. } => return Err(ScanError::CheckinInFlight),
            SessionState::Terminated { .. } => return Err(ScanError::Terminated),
            _ => return Err(self.invalid("hold")),
        };

        info!(ticket = %ticket, "Ticket put on hold");
        let outcome = Outcome::Held { ticket };
        self.last_outcome = Some(outcome.clone());
        self.last_scanned = None;
        self.resume_scanning()?;
        Ok(outcome)
    }

    fn advance(&mut self, ticket: TicketId, next: Next) -> Result<()> {
        match next {
            Next::ResumeScanning => self.resume_scanning(),
            Next::AwaitDecision {
                name,
                failed_attempts,
            } => {
                self.state = SessionState::AwaitingDecision {
                    ticket,
                    name,
                    failed_attempts,
                };
                Ok(())
            }
        }
    }

    fn invalid(&self, operation: &'static str) -> ScanError {
        ScanError::InvalidTransition {
            operation,
            state: self.state.to_string(),
        }
    }
}

impl<C: Camera, D: FrameDecoder> Drop for ScanSession<C, D> {
    fn drop(&mut self) {
        self.release_camera();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraError;
    use crate::error::ServiceError;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use ticket_scan_protocol::ServiceResponse;

    #[derive(Default)]
    struct FakeCamera {
        acquired: u32,
        released: u32,
        deny: bool,
        frames: VecDeque<std::result::Result<Option<Frame>, CameraError>>,
    }

    impl Camera for FakeCamera {
        fn acquire(&mut self) -> std::result::Result<(), CameraError> {
            if self.deny {
                return Err(CameraError::PermissionDenied);
            }
            self.acquired += 1;
            Ok(())
        }

        fn release(&mut self) {
            self.released += 1;
        }

        fn capture(&mut self) -> std::result::Result<Option<Frame>, CameraError> {
            self.frames.pop_front().unwrap_or(Ok(None))
        }
    }

    fn text_frame(text: &str) -> Frame {
        Frame::new(text.len() as u32, 1, text.as_bytes().to_vec())
    }

    fn text_decoder(frame: &Frame) -> Option<String> {
        if frame.pixels.is_empty() {
            None
        } else {
            String::from_utf8(frame.pixels.clone()).ok()
        }
    }

    type TestSession = ScanSession<FakeCamera, fn(&Frame) -> Option<String>>;

    fn session() -> TestSession {
        ScanSession::new(
            FakeCamera::default(),
            text_decoder as fn(&Frame) -> Option<String>,
        )
    }

    struct ScriptedService {
        calls: RefCell<Vec<(Action, String)>>,
        replies: RefCell<VecDeque<std::result::Result<ServiceResponse, ServiceError>>>,
    }

    impl ScriptedService {
        fn new(replies: Vec<std::result::Result<ServiceResponse, ServiceError>>) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                replies: RefCell::new(replies.into()),
            }
        }

        fn calls(&self, action: Action) -> usize {
            self.calls
                .borrow()
                .iter()
                .filter(|(a, _)| *a == action)
                .count()
        }
    }

    impl TicketService for ScriptedService {
        fn call(
            &self,
            action: Action,
            ticket: &TicketId,
        ) -> std::result::Result<ServiceResponse, ServiceError> {
            self.calls
                .borrow_mut()
                .push((action, ticket.as_str().to_string()));
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or(Err(ServiceError::Timeout))
        }
    }

    fn found(name: &str) -> std::result::Result<ServiceResponse, ServiceError> {
        Ok(ServiceResponse {
            success: true,
            found: true,
            already_checked_in: false,
            name: Some(name.to_string()),
            ..ServiceResponse::default()
        })
    }

    fn already(at: &str) -> std::result::Result<ServiceResponse, ServiceError> {
        Ok(ServiceResponse {
            success: true,
            found: true,
            already_checked_in: true,
            checkin_value: Some(at.to_string()),
            ..ServiceResponse::default()
        })
    }

    fn id(raw: &str) -> TicketId {
        TicketId::parse(raw).unwrap()
    }

    #[test]
    fn start_acquires_camera_and_scans() {
        let mut s = session();
        s.start().unwrap();
        assert_eq!(*s.state(), SessionState::Scanning);
        assert!(s.camera_active());
        assert_eq!(s.camera().acquired, 1);
    }

    #[test]
    fn start_without_camera_stays_idle_and_can_retry() {
        let mut s = ScanSession::new(
            FakeCamera {
                deny: true,
                ..FakeCamera::default()
            },
            text_decoder as fn(&Frame) -> Option<String>,
        );
        assert!(matches!(s.start(), Err(ScanError::CameraUnavailable(_))));
        assert_eq!(*s.state(), SessionState::Idle);
        assert!(!s.camera_active());

        s.camera.deny = false;
        s.start().unwrap();
        assert_eq!(*s.state(), SessionState::Scanning);
    }

    #[test]
    fn start_twice_is_rejected() {
        let mut s = session();
        s.start().unwrap();
        assert!(matches!(
            s.start(),
            Err(ScanError::InvalidTransition { .. })
        ));
        assert_eq!(s.camera().acquired, 1);
    }

    #[test]
    fn new_code_pauses_camera_and_awaits_lookup() {
        let mut s = session();
        s.start().unwrap();
        let outcome = s.on_frame(&text_frame("  T-100\n"));
        let call = match outcome {
            FrameOutcome::Detected(call) => call,
            other => panic!("unexpected outcome {:?}", other),
        };
        assert_eq!(call.action, Action::Lookup);
        assert_eq!(call.ticket.as_str(), "t-100");
        assert!(matches!(s.state(), SessionState::AwaitingLookup { .. }));
        assert!(!s.camera_active());
        assert_eq!(s.camera().released, 1);
    }

    #[test]
    fn frames_while_not_scanning_are_ignored() {
        let mut s = session();
        assert_eq!(s.on_frame(&text_frame("t-1")), FrameOutcome::Ignored);
        s.start().unwrap();
        s.on_frame(&text_frame("t-1"));
        assert_eq!(s.on_frame(&text_frame("t-2")), FrameOutcome::Ignored);
        assert_eq!(s.tick(), FrameOutcome::Ignored);
    }

    #[test]
    fn capture_errors_count_as_no_code() {
        let mut s = session();
        s.camera
            .frames
            .push_back(Err(CameraError::FrameUnavailable("not ready".to_string())));
        s.camera.frames.push_back(Ok(Some(text_frame(""))));
        s.camera.frames.push_back(Ok(Some(text_frame("T-9"))));
        s.start().unwrap();

        assert_eq!(s.tick(), FrameOutcome::NoCode);
        assert_eq!(s.tick(), FrameOutcome::NoCode);
        assert!(matches!(s.tick(), FrameOutcome::Detected(_)));
    }

    #[test]
    fn whitespace_payload_is_invalid_without_network() {
        let service = ScriptedService::new(vec![]);
        let mut s = session();
        s.start().unwrap();
        assert_eq!(s.on_frame(&text_frame("   \n")), FrameOutcome::InvalidQr);
        assert_eq!(*s.state(), SessionState::Scanning);
        assert!(s.camera_active());
        assert_eq!(s.last_outcome(), Some(&Outcome::InvalidQr));
        assert!(s.lookup(&service).is_err());
        assert_eq!(service.calls.borrow().len(), 0);
    }

    #[test]
    fn duplicate_frames_trigger_one_lookup() {
        let service = ScriptedService::new(vec![Ok(ServiceResponse {
            success: true,
            found: false,
            ..ServiceResponse::default()
        })]);
        let mut s = session();
        s.start().unwrap();

        assert!(matches!(
            s.on_frame(&text_frame("T-7")),
            FrameOutcome::Detected(_)
        ));
        s.lookup(&service).unwrap();
        assert_eq!(*s.state(), SessionState::Scanning);

        // Code is still in front of the camera.
        assert_eq!(s.on_frame(&text_frame("T-7")), FrameOutcome::Duplicate);
        assert_eq!(s.on_frame(&text_frame(" t-7 \n")), FrameOutcome::Duplicate);
        assert_eq!(service.calls(Action::Lookup), 1);
    }

    #[test]
    fn found_ticket_exposes_confirm_and_hold() {
        let service = ScriptedService::new(vec![found("Alice")]);
        let mut s = session();
        s.start().unwrap();
        s.on_frame(&text_frame("T-1"));
        let outcome = s.lookup(&service).unwrap();

        assert_eq!(
            outcome,
            Outcome::Found {
                ticket: id("t-1"),
                name: Some("Alice".to_string())
            }
        );
        assert_eq!(
            *s.state(),
            SessionState::AwaitingDecision {
                ticket: id("t-1"),
                name: Some("Alice".to_string()),
                failed_attempts: 0
            }
        );
        assert!(!s.camera_active());
        let display = s.display();
        assert!(display.can_confirm());
        assert!(display.can_hold());
    }

    #[test]
    fn confirm_checks_in_and_resumes_scanning() {
        let service = ScriptedService::new(vec![
            found("Alice"),
            Ok(ServiceResponse {
                success: true,
                found: true,
                checkin_value: Some("2024-01-01T10:00:00Z".to_string()),
                ..ServiceResponse::default()
            }),
        ]);
        let mut s = session();
        s.start().unwrap();
        s.on_frame(&text_frame("T-1"));
        s.lookup(&service).unwrap();
        let outcome = s.confirm(&id("t-1"), &service).unwrap();

        assert_eq!(outcome.kind(), "checked_in");
        assert_eq!(*s.state(), SessionState::Scanning);
        assert!(s.camera_active());
        assert_eq!(s.camera().acquired, 2);
        assert_eq!(s.camera().released, 1);
    }

    #[test]
    fn confirm_twice_issues_one_checkin() {
        let service = ScriptedService::new(vec![found("Alice")]);
        let mut s = session();
        s.start().unwrap();
        s.on_frame(&text_frame("T-1"));
        s.lookup(&service).unwrap();

        let call = s.begin_confirm(&id("t-1")).unwrap();
        assert!(matches!(
            s.begin_confirm(&id("t-1")),
            Err(ScanError::CheckinInFlight)
        ));
        assert!(matches!(
            s.confirm(&id("t-1"), &service),
            Err(ScanError::CheckinInFlight)
        ));
        assert!(matches!(s.hold(), Err(ScanError::CheckinInFlight)));
        assert_eq!(service.calls(Action::Checkin), 0);

        let result = checkin_ticket(&service, &call.ticket);
        s.complete_checkin(call.token, result).unwrap();
        assert_eq!(service.calls(Action::Checkin), 1);
    }

    #[test]
    fn confirm_rejects_other_ticket() {
        let service = ScriptedService::new(vec![found("Alice")]);
        let mut s = session();
        s.start().unwrap();
        s.on_frame(&text_frame("T-1"));
        s.lookup(&service).unwrap();
        assert!(matches!(
            s.confirm(&id("t-2"), &service),
            Err(ScanError::TicketMismatch { .. })
        ));
        assert_eq!(service.calls(Action::Checkin), 0);
    }

    #[test]
    fn checkin_race_lost_is_a_warning() {
        let service = ScriptedService::new(vec![found("Alice"), already("2024-01-01T10:00:00Z")]);
        let mut s = session();
        s.start().unwrap();
        s.on_frame(&text_frame("T-1"));
        s.lookup(&service).unwrap();
        let outcome = s.confirm(&id("t-1"), &service).unwrap();

        assert_eq!(
            outcome,
            Outcome::RaceLost {
                ticket: id("t-1"),
                name: Some("Alice".to_string()),
                checked_in_at: Some("2024-01-01T10:00:00Z".to_string())
            }
        );
        assert_eq!(*s.state(), SessionState::Scanning);
    }

    #[test]
    fn checkin_server_error_allows_retry() {
        let service = ScriptedService::new(vec![
            found("Alice"),
            Err(ServiceError::Malformed("invalid_json".to_string())),
            found("Alice"),
        ]);
        let mut s = session();
        s.start().unwrap();
        s.on_frame(&text_frame("T-1"));
        s.lookup(&service).unwrap();

        let outcome = s.confirm(&id("t-1"), &service).unwrap();
        assert!(matches!(
            outcome,
            Outcome::CheckinFailed {
                retry_allowed: true,
                ..
            }
        ));
        assert!(matches!(
            s.state(),
            SessionState::AwaitingDecision {
                failed_attempts: 1,
                ..
            }
        ));
        assert!(!s.camera_active());

        let outcome = s.confirm(&id("t-1"), &service).unwrap();
        assert_eq!(outcome.kind(), "checked_in");
        assert_eq!(service.calls(Action::Checkin), 2);
    }

    #[test]
    fn checkin_retries_stop_at_configured_cap() {
        let service = ScriptedService::new(vec![
            found("Alice"),
            Err(ServiceError::Status(500)),
            Err(ServiceError::Status(500)),
        ]);
        let mut s = session().with_max_confirm_attempts(2);
        s.start().unwrap();
        s.on_frame(&text_frame("T-1"));
        s.lookup(&service).unwrap();

        s.confirm(&id("t-1"), &service).unwrap();
        assert!(matches!(s.state(), SessionState::AwaitingDecision { .. }));
        let outcome = s.confirm(&id("t-1"), &service).unwrap();
        assert!(matches!(
            outcome,
            Outcome::CheckinFailed {
                retry_allowed: false,
                ..
            }
        ));
        assert_eq!(*s.state(), SessionState::Scanning);
    }

    #[test]
    fn malformed_lookup_is_server_error_and_resumable() {
        let service = ScriptedService::new(vec![Err(ServiceError::Malformed(
            "invalid_json".to_string(),
        ))]);
        let mut s = session();
        s.start().unwrap();
        s.on_frame(&text_frame("T-1"));
        let outcome = s.lookup(&service).unwrap();
        assert_eq!(outcome.kind(), "server_error");
        assert_eq!(*s.state(), SessionState::Scanning);
        assert!(s.camera_active());
    }

    #[test]
    fn hold_clears_debounce_so_same_code_rescans() {
        let service = ScriptedService::new(vec![found("Alice"), found("Alice")]);
        let mut s = session();
        s.start().unwrap();
        s.on_frame(&text_frame("T-1"));
        s.lookup(&service).unwrap();

        let outcome = s.hold().unwrap();
        assert_eq!(outcome, Outcome::Held { ticket: id("t-1") });
        assert_eq!(*s.state(), SessionState::Scanning);
        assert!(s.camera_active());
        assert_eq!(s.last_scanned(), None);
        assert_eq!(service.calls(Action::Checkin), 0);

        assert!(matches!(
            s.on_frame(&text_frame("T-1")),
            FrameOutcome::Detected(_)
        ));
        s.lookup(&service).unwrap();
        assert_eq!(service.calls(Action::Lookup), 2);
    }

    #[test]
    fn scan_next_clears_result_and_debounce() {
        let service = ScriptedService::new(vec![Ok(ServiceResponse {
            success: true,
            found: false,
            ..ServiceResponse::default()
        })]);
        let mut s = session();
        s.start().unwrap();
        s.on_frame(&text_frame("T-1"));
        s.lookup(&service).unwrap();
        assert!(s.last_outcome().is_some());

        s.scan_next().unwrap();
        assert_eq!(s.last_outcome(), None);
        assert!(matches!(
            s.on_frame(&text_frame("T-1")),
            FrameOutcome::Detected(_)
        ));
    }

    #[test]
    fn stop_releases_camera_from_any_state_and_is_idempotent() {
        let mut s = session();
        s.stop();
        assert!(s.state().is_terminated());
        assert_eq!(s.camera().released, 0);

        let mut s = session();
        s.start().unwrap();
        s.stop();
        s.stop();
        assert!(s.state().is_terminated());
        assert!(!s.camera_active());
        assert_eq!(s.camera().released, 1);
        assert!(matches!(s.start(), Err(ScanError::Terminated)));
    }

    #[test]
    fn results_after_stop_are_dropped() {
        let mut s = session();
        s.start().unwrap();
        let call = match s.on_frame(&text_frame("T-1")) {
            FrameOutcome::Detected(call) => call,
            other => panic!("unexpected outcome {:?}", other),
        };
        s.stop();

        let applied = s
            .complete_lookup(
                call.token,
                LookupResult::Found {
                    name: Some("Alice".to_string()),
                },
            )
            .unwrap();
        assert_eq!(applied, None);
        assert!(s.state().is_terminated());
        assert!(!s.camera_active());
        assert_eq!(s.camera().acquired, 1);
    }

    #[test]
    fn stale_tokens_are_dropped() {
        let service = ScriptedService::new(vec![found("Alice")]);
        let mut s = session();
        s.start().unwrap();
        let first = match s.on_frame(&text_frame("T-1")) {
            FrameOutcome::Detected(call) => call,
            other => panic!("unexpected outcome {:?}", other),
        };
        s.lookup(&service).unwrap();
        let confirm = s.begin_confirm(&id("t-1")).unwrap();

        // A replayed lookup reply must not disturb the check-in.
        let applied = s
            .complete_lookup(first.token, LookupResult::NotFound)
            .unwrap();
        assert_eq!(applied, None);
        let applied = s
            .complete_checkin(
                first.token,
                CheckinResult::CheckedIn {
                    name: None,
                    checkin_timestamp: None,
                },
            )
            .unwrap();
        assert_eq!(applied, None);
        assert!(matches!(s.state(), SessionState::Confirming { .. }));
        assert_ne!(first.token, confirm.token);
    }

    #[test]
    fn camera_failure_on_resume_leaves_session_idle() {
        let service = ScriptedService::new(vec![found("Alice")]);
        let mut s = session();
        s.start().unwrap();
        s.on_frame(&text_frame("T-1"));
        s.lookup(&service).unwrap();

        s.camera.deny = true;
        assert!(matches!(s.hold(), Err(ScanError::CameraUnavailable(_))));
        assert_eq!(*s.state(), SessionState::Idle);
        assert_eq!(s.last_outcome(), Some(&Outcome::Held { ticket: id("t-1") }));

        s.camera.deny = false;
        s.start().unwrap();
        assert_eq!(*s.state(), SessionState::Scanning);
    }

    #[test]
    fn drop_releases_active_camera() {
        use std::rc::Rc;

        struct SharedCamera(Rc<RefCell<u32>>);

        impl Camera for SharedCamera {
            fn acquire(&mut self) -> std::result::Result<(), CameraError> {
                Ok(())
            }
            fn release(&mut self) {
                *self.0.borrow_mut() += 1;
            }
            fn capture(&mut self) -> std::result::Result<Option<Frame>, CameraError> {
                Ok(None)
            }
        }

        let releases = Rc::new(RefCell::new(0));
        {
            let mut s = ScanSession::new(
                SharedCamera(Rc::clone(&releases)),
                text_decoder as fn(&Frame) -> Option<String>,
            );
            s.start().unwrap();
        }
        assert_eq!(*releases.borrow(), 1);
    }
}
