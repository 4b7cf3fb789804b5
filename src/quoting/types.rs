//! Quote pipeline types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::storage::{PersistAck, PersistError};

/// The current USD-BRL quote, exactly as the upstream provider reported it.
///
/// The bid is opaque: it is never parsed, rounded or validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    bid: String,
}

impl Quote {
    pub fn new(bid: impl Into<String>) -> Self {
        Self { bid: bid.into() }
    }

    pub fn bid(&self) -> &str {
        &self.bid
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.bid)
    }
}

/// Where a request is in the pipeline.
///
/// ```text
/// Start → Fetching → FetchFailed
///                  → Fetched → Persisting → Done
///                                         → PersistFailedButDone
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Start,
    Fetching,
    Fetched,
    FetchFailed,
    Persisting,
    Done,
    PersistFailedButDone,
}

impl RequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestState::Start => "start",
            RequestState::Fetching => "fetching",
            RequestState::Fetched => "fetched",
            RequestState::FetchFailed => "fetch_failed",
            RequestState::Persisting => "persisting",
            RequestState::Done => "done",
            RequestState::PersistFailedButDone => "persist_failed_but_done",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestState::FetchFailed | RequestState::Done | RequestState::PersistFailedButDone
        )
    }
}

/// Successful end of a request. Both variants carry the fetched quote.
#[derive(Debug)]
pub enum QuoteOutcome {
    /// The quote was fetched and archived.
    Done { quote: Quote, ack: PersistAck },
    /// The quote was fetched; archiving it failed.
    PersistFailedButDone { quote: Quote, error: PersistError },
}

impl QuoteOutcome {
    pub fn quote(&self) -> &Quote {
        match self {
            QuoteOutcome::Done { quote, .. } | QuoteOutcome::PersistFailedButDone { quote, .. } => {
                quote
            }
        }
    }

    pub fn into_quote(self) -> Quote {
        match self {
            QuoteOutcome::Done { quote, .. } | QuoteOutcome::PersistFailedButDone { quote, .. } => {
                quote
            }
        }
    }

    pub fn state(&self) -> RequestState {
        match self {
            QuoteOutcome::Done { .. } => RequestState::Done,
            QuoteOutcome::PersistFailedButDone { .. } => RequestState::PersistFailedButDone,
        }
    }

    pub fn persist_error(&self) -> Option<&PersistError> {
        match self {
            QuoteOutcome::Done { .. } => None,
            QuoteOutcome::PersistFailedButDone { error, .. } => Some(error),
        }
    }
}
