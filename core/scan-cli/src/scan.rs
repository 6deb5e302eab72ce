//! Interactive scanning loop.
//!
//! Each input line while scanning is a payload from the wedge reader. While a
//! ticket awaits a decision, lines are operator commands:
//!
//! ```text
//! c | confirm      check the pending ticket in
//! h | hold         set it aside without checking in
//! :next            clear the result and accept the same code again
//! :start           re-arm the reader after a failure
//! :q | :quit       stop the session
//! ::payload        scan a payload that itself starts with ':'
//! ```

use scan_core::{
    FrameOutcome, Outcome, ScanError, ScanSession, SessionState, TicketId, TicketService,
};
use serde::Serialize;
use std::io::{BufRead, Write};

use crate::render::write_display;
use crate::wedge::{line_frame, raw_frame, LineDecoder, WedgeReader};

#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub auto_confirm: bool,
    pub max_confirm_attempts: u32,
    pub json: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub lookups: u32,
    pub checked_in: u32,
    pub already_checked_in: u32,
    pub held: u32,
    pub failed: u32,
}

impl ScanSummary {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::CheckedIn { .. } => self.checked_in += 1,
            Outcome::AlreadyCheckedIn { .. } | Outcome::RaceLost { .. } => {
                self.already_checked_in += 1
            }
            Outcome::Held { .. } => self.held += 1,
            Outcome::NotFound { .. }
            | Outcome::ServerError { .. }
            | Outcome::CheckinFailed { .. } => self.failed += 1,
            Outcome::InvalidQr | Outcome::Found { .. } => {}
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Blank,
    Quit,
    Start,
    Next,
    Confirm,
    Hold,
    Payload(&'a str),
    Unknown(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str, state: &SessionState) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Command::Blank;
        }
        if trimmed.starts_with("::") {
            return Command::Payload(&trimmed[1..]);
        }
        if let Some(name) = trimmed.strip_prefix(':') {
            return match name.trim().to_ascii_lowercase().as_str() {
                "q" | "quit" => Command::Quit,
                "s" | "start" => Command::Start,
                "n" | "next" => Command::Next,
                "c" | "confirm" => Command::Confirm,
                "h" | "hold" => Command::Hold,
                _ => Command::Unknown(trimmed),
            };
        }
        match state {
            SessionState::AwaitingDecision { .. } => {
                match trimmed.to_ascii_lowercase().as_str() {
                    "c" | "confirm" | "y" => Command::Confirm,
                    "h" | "hold" | "n" => Command::Hold,
                    "q" | "quit" => Command::Quit,
                    _ => Command::Unknown(trimmed),
                }
            }
            _ => Command::Payload(line),
        }
    }
}

enum Step {
    Continue,
    Quit,
}

pub fn run<S, R, W>(
    service: &S,
    options: &ScanOptions,
    mut input: R,
    out: &mut W,
) -> Result<ScanSummary, String>
where
    S: TicketService + ?Sized,
    R: BufRead,
    W: Write,
{
    let mut session = ScanSession::new(WedgeReader::default(), LineDecoder)
        .with_max_confirm_attempts(options.max_confirm_attempts);
    let mut summary = ScanSummary::default();

    if let Err(err) = session.start() {
        notice(out, options.json, &err.to_string())?;
    }
    show(out, &session, options.json)?;

    let mut buffer = Vec::new();
    loop {
        buffer.clear();
        let read = input
            .read_until(b'\n', &mut buffer)
            .map_err(|err| format!("Failed to read input: {}", err))?;
        if read == 0 {
            break;
        }
        let raw = strip_line_ending(&buffer);
        let step = match std::str::from_utf8(raw) {
            Ok(line) => handle_line(&mut session, service, options, line, &mut summary, out)?,
            Err(_) => {
                // Garbled reader output is a frame without a code.
                let outcome = session.on_frame(&raw_frame(raw));
                tracing::debug!(bytes = raw.len(), outcome = ?outcome, "Unreadable input line");
                Step::Continue
            }
        };
        if let Step::Quit = step {
            break;
        }
        show(out, &session, options.json)?;
    }

    session.stop();
    show(out, &session, options.json)?;
    tracing::info!(
        lookups = summary.lookups,
        checked_in = summary.checked_in,
        held = summary.held,
        "Scan session ended"
    );
    Ok(summary)
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn handle_line<S, W>(
    session: &mut ScanSession<WedgeReader, LineDecoder>,
    service: &S,
    options: &ScanOptions,
    line: &str,
    summary: &mut ScanSummary,
    out: &mut W,
) -> Result<Step, String>
where
    S: TicketService + ?Sized,
    W: Write,
{
    let result = match Command::parse(line, session.state()) {
        Command::Blank => Ok(()),
        Command::Quit => return Ok(Step::Quit),
        Command::Start => session.start(),
        Command::Next => session.scan_next(),
        Command::Confirm => confirm_pending(session, service, summary),
        Command::Hold => session.hold().map(|outcome| summary.record(&outcome)),
        Command::Unknown(text) => {
            notice(out, options.json, &format!("Unknown command: {}", text))?;
            Ok(())
        }
        Command::Payload(text) => match session.on_frame(&line_frame(text)) {
            FrameOutcome::Detected(call) => {
                summary.lookups += 1;
                scan_detected(session, service, options, call.ticket, summary)
            }
            FrameOutcome::Duplicate => {
                notice(out, options.json, "Already scanned; :next to scan it again")?;
                Ok(())
            }
            FrameOutcome::Ignored => {
                notice(out, options.json, "Finish the current ticket first")?;
                Ok(())
            }
            FrameOutcome::NoCode | FrameOutcome::InvalidQr => Ok(()),
        },
    };

    if let Err(err) = result {
        tracing::warn!(error = %err, state = %session.state(), "Operator action rejected");
        notice(out, options.json, &err.to_string())?;
    }
    Ok(Step::Continue)
}

fn scan_detected<S>(
    session: &mut ScanSession<WedgeReader, LineDecoder>,
    service: &S,
    options: &ScanOptions,
    ticket: TicketId,
    summary: &mut ScanSummary,
) -> Result<(), ScanError>
where
    S: TicketService + ?Sized,
{
    let outcome = session.lookup(service)?;
    summary.record(&outcome);
    if options.auto_confirm && matches!(outcome, Outcome::Found { .. }) {
        let outcome = session.confirm(&ticket, service)?;
        summary.record(&outcome);
    }
    Ok(())
}

fn confirm_pending<S>(
    session: &mut ScanSession<WedgeReader, LineDecoder>,
    service: &S,
    summary: &mut ScanSummary,
) -> Result<(), ScanError>
where
    S: TicketService + ?Sized,
{
    let ticket = match session.state() {
        SessionState::AwaitingDecision { ticket, .. } => ticket.clone(),
        SessionState::Confirming { .. } => return Err(ScanError::CheckinInFlight),
        other => {
            return Err(ScanError::InvalidTransition {
                operation: "confirm",
                state: other.to_string(),
            })
        }
    };
    let outcome = session.confirm(&ticket, service)?;
    summary.record(&outcome);
    Ok(())
}

fn show<W: Write>(
    out: &mut W,
    session: &ScanSession<WedgeReader, LineDecoder>,
    json: bool,
) -> Result<(), String> {
    write_display(out, &session.display(), json)
        .map_err(|err| format!("Failed to write output: {}", err))
}

fn notice<W: Write>(out: &mut W, json: bool, message: &str) -> Result<(), String> {
    let written = if json {
        serde_json::to_writer(&mut *out, &serde_json::json!({ "notice": message }))
            .map_err(std::io::Error::other)
            .and_then(|_| writeln!(out))
    } else {
        writeln!(out, "! {}", message)
    };
    written.map_err(|err| format!("Failed to write output: {}", err))
}
