//! ticket-scan: operator CLI for ticket check-in.
//!
//! Talks to the spreadsheet-backed ticket web app configured in
//! `~/.ticket-scan/config.toml` (or `--url` / `TICKET_SCAN_URL`).
//!
//! ## Subcommands
//!
//! - `scan`: Interactive session fed by a keyboard-wedge QR reader on stdin
//! - `lookup`: Look a ticket up without checking it in
//! - `checkin`: Check a ticket in directly
//! - `config`: Print the effective configuration

mod http;
mod logging;
mod oneshot;
mod render;
mod scan;
mod wedge;

use clap::{Parser, Subcommand};
use scan_core::{Action, ScannerConfig, Severity};
use std::io::{self, Write};
use std::path::PathBuf;

use http::HttpTicketService;
use scan::ScanOptions;

#[derive(Parser)]
#[command(name = "ticket-scan")]
#[command(about = "Scan and check in event tickets")]
#[command(version)]
struct Cli {
    /// Ticket service endpoint (overrides config and TICKET_SCAN_URL)
    #[arg(long, global = true, value_name = "URL")]
    url: Option<String>,

    /// Per-request timeout in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Config file path (defaults to ~/.ticket-scan/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Emit one JSON object per screen update instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan tickets interactively (payloads on stdin, one per line)
    Scan {
        /// Check in found tickets without asking
        #[arg(long)]
        auto_confirm: bool,

        /// Failed check-ins allowed per ticket before giving up (0 = unlimited)
        #[arg(long, value_name = "N")]
        max_attempts: Option<u32>,
    },

    /// Look up a ticket without checking it in
    Lookup {
        #[arg(value_name = "TICKET")]
        ticket: String,
    },

    /// Check a ticket in
    Checkin {
        #[arg(value_name = "TICKET")]
        ticket: String,
    },

    /// Print the effective configuration
    Config,
}

fn main() {
    let logging_guard = logging::init();
    let cli = Cli::parse();

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "ticket-scan failed");
            eprintln!("error: {}", e);
            1
        }
    };

    // Flush the non-blocking log writer before exiting.
    drop(logging_guard);
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32, String> {
    let config = effective_config(&cli)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Config => {
            let text = toml::to_string_pretty(&config)
                .map_err(|err| format!("Failed to serialize config: {}", err))?;
            write!(out, "{}", text).map_err(|err| format!("Failed to write output: {}", err))?;
            Ok(0)
        }
        Commands::Lookup { ticket } => {
            let service = build_service(&config)?;
            let severity = oneshot::run(&service, Action::Lookup, &ticket, cli.json, &mut out)?;
            Ok(exit_code(severity))
        }
        Commands::Checkin { ticket } => {
            let service = build_service(&config)?;
            let severity = oneshot::run(&service, Action::Checkin, &ticket, cli.json, &mut out)?;
            Ok(exit_code(severity))
        }
        Commands::Scan {
            auto_confirm,
            max_attempts,
        } => {
            let service = build_service(&config)?;
            let options = ScanOptions {
                auto_confirm: auto_confirm || config.auto_confirm,
                max_confirm_attempts: max_attempts.unwrap_or(config.max_confirm_attempts),
                json: cli.json,
            };
            let stdin = io::stdin();
            let summary = scan::run(&service, &options, stdin.lock(), &mut out)?;
            let written = if cli.json {
                serde_json::to_writer(&mut out, &serde_json::json!({ "summary": summary }))
                    .map_err(io::Error::other)
                    .and_then(|_| writeln!(out))
            } else {
                writeln!(
                    out,
                    "{} checked in, {} already used, {} held, {} failed",
                    summary.checked_in, summary.already_checked_in, summary.held, summary.failed
                )
            };
            written.map_err(|err| format!("Failed to write output: {}", err))?;
            Ok(0)
        }
    }
}

fn effective_config(cli: &Cli) -> Result<ScannerConfig, String> {
    let mut config = scan_core::load_config(cli.config.as_deref())?.with_env_overrides();
    if let Some(url) = &cli.url {
        config.service_url = Some(url.clone());
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.request_timeout_ms = timeout_ms;
    }
    tracing::debug!(
        service_url = ?config.service_url,
        timeout_ms = config.request_timeout_ms,
        "Configuration resolved"
    );
    Ok(config)
}

fn build_service(config: &ScannerConfig) -> Result<HttpTicketService, String> {
    let url = config.service_url()?;
    HttpTicketService::new(url, config.request_timeout())
}

fn exit_code(severity: Severity) -> i32 {
    match severity {
        Severity::Success | Severity::Info => 0,
        Severity::Warning => 2,
        Severity::Error => 1,
    }
}
