//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request:
//!     → deadline.rs (root window for the request)
//!     → child window for the upstream fetch
//!     → detached window for the storage write
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Windows are passed by argument, never read from ambient state
//! - No retries: a closed window ends the stage

pub mod deadline;

pub use deadline::{DeadlineWindow, Stage, WindowClosed};
