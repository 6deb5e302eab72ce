//! Scan Session
//!
//! Drives one operator's capture → decode → look up → confirm cycle.
//!
//! # State Machine
//!
//! ```text
//! Idle              start()                       → Scanning
//! Scanning          new code                      → AwaitingLookup   (camera released)
//! Scanning          no code / duplicate / invalid → Scanning
//! AwaitingLookup    NotFound / ServerError        → Scanning
//! AwaitingLookup    AlreadyCheckedIn              → Scanning
//! AwaitingLookup    Found                         → AwaitingDecision
//! AwaitingDecision  confirm()                     → Confirming
//! Confirming        CheckedIn / RaceLost          → Scanning
//! Confirming        ServerError                   → AwaitingDecision (retry)
//! AwaitingDecision  hold()                        → Scanning         (debounce cleared)
//! (any)             stop()                        → Terminated
//! ```
//!
//! # Serialization
//!
//! At most one network call is outstanding. Each call is described by a
//! [`PendingCall`] whose token must accompany the completion; completions
//! with any other token (late replies, replies after `stop()`) are dropped.
//! The camera is released while a call is outstanding and re-acquired when
//! scanning resumes.
//!
//! # Module Structure
//!
//! - [`types`]: session states, pending calls, per-frame outcomes
//! - [`transition`]: pure mapping from backend results to the next step
//! - [`scan_session`]: the [`ScanSession`] that owns camera and decoder

mod scan_session;
pub mod transition;
mod types;

pub use scan_session::ScanSession;
pub use types::{FrameOutcome, PendingCall, RequestToken, SessionState};
