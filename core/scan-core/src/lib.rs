//! # scan-core
//!
//! Core library for the ticket check-in scanner: ticket normalization, the
//! scan/confirm session state machine, and the seams to the camera, the QR
//! decoder and the ticket backend.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. Drivers that run network
//!   calls elsewhere use the split `complete_*` API.
//! - **Not thread-safe**: One session per operator; callers serialize access.
//! - **Outcomes are not errors**: Unknown tickets, used tickets and backend
//!   failures are [`Outcome`]s; [`ScanError`] is for actions that cannot apply.
//! - **One ticket in flight**: Frames are not decoded while a lookup or
//!   check-in is outstanding.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use scan_core::{FrameOutcome, ScanSession};
//!
//! let mut session = ScanSession::new(camera, decoder);
//! session.start()?;
//! if let FrameOutcome::Detected(call) = session.tick() {
//!     let outcome = session.lookup(&service)?;
//!     if session.display().can_confirm() {
//!         session.confirm(&call.ticket, &service)?;
//!     }
//! }
//! ```

pub mod camera;
pub mod config;
pub mod display;
pub mod error;
pub mod results;
pub mod service;
pub mod session;
pub mod ticket;

pub use camera::{Camera, CameraError, Frame, FrameDecoder};
pub use config::{load_config, ScannerConfig};
pub use display::{DisplayModel, OperatorAction, ResultCard};
pub use error::{Result, ScanError, ServiceError};
pub use results::{CheckinResult, LookupResult, Outcome, Severity};
pub use service::{checkin_ticket, lookup_ticket, TicketService};
pub use session::transition::{after_checkin, after_lookup};
pub use session::{FrameOutcome, PendingCall, RequestToken, ScanSession, SessionState};
pub use ticket::{normalize, TicketId};
pub use ticket_scan_protocol::{Action, ServiceResponse};
