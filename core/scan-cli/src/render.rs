//! Terminal rendering of the display model.

use scan_core::{DisplayModel, OperatorAction, Severity};
use std::io::{self, Write};

pub fn write_display<W: Write>(out: &mut W, model: &DisplayModel, json: bool) -> io::Result<()> {
    if json {
        serde_json::to_writer(&mut *out, model).map_err(io::Error::other)?;
        writeln!(out)?;
        return out.flush();
    }

    if let Some(card) = &model.card {
        writeln!(out, "{} {}", severity_marker(card.severity), card.title)?;
        if let Some(ticket) = &card.ticket_id {
            writeln!(out, "  Ticket:     {}", ticket)?;
        }
        if let Some(name) = &card.name {
            writeln!(out, "  Name:       {}", name)?;
        }
        if let Some(at) = &card.checked_in_at {
            writeln!(out, "  Checked in: {}", at)?;
        }
        if let Some(hint) = &card.hint {
            writeln!(out, "  {}", hint)?;
        }
    }

    writeln!(out, "{}", model.status)?;
    if !model.actions.is_empty() {
        let prompts: Vec<&str> = model.actions.iter().map(action_prompt).collect();
        writeln!(out, "  [{}]", prompts.join("  "))?;
    }
    out.flush()
}

fn severity_marker(severity: Severity) -> &'static str {
    match severity {
        Severity::Success => "[ok]",
        Severity::Info => "[..]",
        Severity::Warning => "[!!]",
        Severity::Error => "[xx]",
    }
}

fn action_prompt(action: &OperatorAction) -> &'static str {
    match action {
        OperatorAction::Start => ":start",
        OperatorAction::Confirm => "c = confirm",
        OperatorAction::Hold => "h = hold",
        OperatorAction::ScanNext => ":next",
    }
}
