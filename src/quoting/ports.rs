//! Seams between the orchestrator and its collaborators.
//!
//! `UpstreamClient` implements [`QuoteSource`] and `QuoteStore` implements
//! [`QuoteSink`]. Tests substitute their own implementations.

use async_trait::async_trait;

use crate::quoting::Quote;
use crate::resilience::DeadlineWindow;
use crate::storage::{PersistAck, PersistError};
use crate::upstream::FetchError;

/// Produces the current quote within a window.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Fetch the current quote. Must give up as soon as `window` closes.
    async fn fetch(&self, window: &DeadlineWindow) -> Result<Quote, FetchError>;
}

/// Archives a quote within a window.
#[async_trait]
pub trait QuoteSink: Send + Sync {
    /// Write one record for `quote` as an atomic unit.
    ///
    /// On any error nothing is left behind: the unit of work is rolled back.
    async fn persist(&self, window: &DeadlineWindow, quote: &Quote)
        -> Result<PersistAck, PersistError>;
}
