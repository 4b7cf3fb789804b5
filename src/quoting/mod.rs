//! Quote pipeline.
//!
//! # Data Flow
//! ```text
//! inbound window
//!     → orchestrator.rs (fetch window → QuoteSource)
//!     → orchestrator.rs (persist window on its own task → QuoteSink)
//!     → QuoteOutcome or FetchError
//! ```

pub mod orchestrator;
pub mod ports;
pub mod types;

pub use orchestrator::{PipelineConfig, QuoteOrchestrator};
pub use ports::{QuoteSink, QuoteSource};
pub use types::{Quote, QuoteOutcome, RequestState};
