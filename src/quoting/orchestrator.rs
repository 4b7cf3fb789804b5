//! Request orchestrator.
//!
//! # Responsibilities
//! - Fetch the quote inside a window derived from the inbound window
//! - Archive the quote inside a fresh window the inbound side cannot cancel
//! - Decide the outcome: a fetch failure fails the request, a persist
//!   failure does not
//!
//! # Flow
//! ```text
//! Start → Fetching ──err──→ FetchFailed            → Err(FetchError)
//!            │ok
//!            ▼
//!         Fetched → Persisting ──ok──→ Done                 → Ok(Done)
//!                              ──err─→ PersistFailedButDone → Ok(PersistFailedButDone)
//! ```
//!
//! The persist stage runs on its own task. If the inbound request goes away
//! while the write is in flight, the write still runs to commit or to its own
//! deadline.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::TimeoutConfig;
use crate::observability::metrics;
use crate::quoting::ports::{QuoteSink, QuoteSource};
use crate::quoting::types::{Quote, QuoteOutcome, RequestState};
use crate::resilience::{DeadlineWindow, Stage};
use crate::storage::{PersistAck, PersistError};
use crate::upstream::FetchError;

/// Stage budgets for the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Upper bound for the upstream call. Shortened by the inbound deadline.
    pub fetch: Duration,
    /// Bound for the storage write, measured from when it starts.
    pub persist: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from(&TimeoutConfig::default())
    }
}

impl From<&TimeoutConfig> for PipelineConfig {
    fn from(timeouts: &TimeoutConfig) -> Self {
        Self {
            fetch: timeouts.fetch(),
            persist: timeouts.persist(),
        }
    }
}

/// Drives one request through fetch and persist.
#[derive(Clone)]
pub struct QuoteOrchestrator {
    config: PipelineConfig,
    source: Arc<dyn QuoteSource>,
    sink: Arc<dyn QuoteSink>,
}

impl QuoteOrchestrator {
    pub fn new(
        config: PipelineConfig,
        source: Arc<dyn QuoteSource>,
        sink: Arc<dyn QuoteSink>,
    ) -> Self {
        Self {
            config,
            source,
            sink,
        }
    }

    /// Run one request inside `inbound`.
    ///
    /// Returns the fetched quote whether or not it was archived. Only a
    /// fetch failure is an error.
    pub async fn handle(&self, inbound: &DeadlineWindow) -> Result<QuoteOutcome, FetchError> {
        let start = Instant::now();
        let mut state = RequestState::Start;

        advance(&mut state, RequestState::Fetching);
        let fetch_window = DeadlineWindow::child(inbound, Stage::Fetch, self.config.fetch);
        let fetched = self.source.fetch(&fetch_window).await;
        fetch_window.release();

        let quote = match fetched {
            Ok(quote) => quote,
            Err(error) => {
                advance(&mut state, RequestState::FetchFailed);
                tracing::error!(
                    error = %error,
                    kind = error.kind().as_str(),
                    "Failed to fetch quote"
                );
                metrics::record_request(state, start);
                return Err(error);
            }
        };
        advance(&mut state, RequestState::Fetched);

        advance(&mut state, RequestState::Persisting);
        let outcome = match self.persist(quote.clone()).await {
            Ok(ack) => {
                advance(&mut state, RequestState::Done);
                tracing::debug!(id = ack.id, bid = %quote, "Quote archived");
                QuoteOutcome::Done { quote, ack }
            }
            Err(error) => {
                advance(&mut state, RequestState::PersistFailedButDone);
                tracing::error!(
                    error = %error,
                    outcome = error.label(),
                    bid = %quote,
                    "Failed to archive quote, serving it anyway"
                );
                QuoteOutcome::PersistFailedButDone { quote, error }
            }
        };

        metrics::record_request(state, start);
        Ok(outcome)
    }

    async fn persist(&self, quote: Quote) -> Result<PersistAck, PersistError> {
        let sink = Arc::clone(&self.sink);
        let budget = self.config.persist;

        let task = tokio::spawn(async move {
            let window = DeadlineWindow::detached(Stage::Persist, budget);
            sink.persist(&window, &quote).await
        });

        match task.await {
            Ok(result) => result,
            Err(e) => Err(PersistError::Aborted(e.to_string())),
        }
    }
}

fn advance(state: &mut RequestState, next: RequestState) {
    tracing::trace!(from = state.as_str(), to = next.as_str(), "Request state");
    *state = next;
}

impl std::fmt::Debug for QuoteOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteOrchestrator")
            .field("config", &self.config)
            .finish()
    }
}
