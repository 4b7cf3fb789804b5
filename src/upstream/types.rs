//! Upstream payload shape and fetch errors.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::quoting::Quote;
use crate::resilience::WindowClosed;

/// Success payload of the upstream provider.
///
/// Only the nested bid is read; every other field is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct UpstreamPayload {
    #[serde(rename = "USDBRL", default)]
    pub usd_brl: Option<PairQuote>,
}

/// One currency pair inside the upstream payload.
#[derive(Debug, Default, Deserialize)]
pub struct PairQuote {
    #[serde(default)]
    pub bid: Option<String>,
}

impl UpstreamPayload {
    /// Decode a response body.
    ///
    /// A payload without `USDBRL` (or without its `bid`) decodes to an empty
    /// bid rather than an error. Callers may rely on this.
    pub fn decode(body: &[u8]) -> Result<Quote, FetchError> {
        let payload: UpstreamPayload =
            serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))?;

        let bid = payload
            .usd_brl
            .and_then(|pair| pair.bid)
            .unwrap_or_default();

        Ok(Quote::new(bid))
    }
}

/// Which part of the upstream call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Construction,
    Transport,
    Status,
    Decode,
    DeadlineExceeded,
    Cancelled,
}

impl FetchErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchErrorKind::Construction => "construction",
            FetchErrorKind::Transport => "transport",
            FetchErrorKind::Status => "status",
            FetchErrorKind::Decode => "decode",
            FetchErrorKind::DeadlineExceeded => "deadline_exceeded",
            FetchErrorKind::Cancelled => "cancelled",
        }
    }
}

/// Errors from the upstream fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be built.
    #[error("failed to build upstream request: {0}")]
    Construction(String),

    /// Connecting, sending or reading the body failed.
    #[error("upstream transport error: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("upstream returned status {0}")]
    Status(u16),

    /// The body was not the expected JSON shape.
    #[error("failed to decode upstream payload: {0}")]
    Decode(String),

    /// The fetch window's deadline passed before the call completed.
    #[error("upstream call exceeded its {0:?} deadline")]
    DeadlineExceeded(Duration),

    /// The fetch window was cancelled (e.g. the inbound request went away).
    #[error("upstream call cancelled")]
    Cancelled,
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Construction(_) => FetchErrorKind::Construction,
            FetchError::Transport(_) => FetchErrorKind::Transport,
            FetchError::Status(_) => FetchErrorKind::Status,
            FetchError::Decode(_) => FetchErrorKind::Decode,
            FetchError::DeadlineExceeded(_) => FetchErrorKind::DeadlineExceeded,
            FetchError::Cancelled => FetchErrorKind::Cancelled,
        }
    }
}

impl From<WindowClosed> for FetchError {
    fn from(closed: WindowClosed) -> Self {
        match closed {
            WindowClosed::DeadlineExceeded { budget, .. } => FetchError::DeadlineExceeded(budget),
            WindowClosed::Cancelled { .. } => FetchError::Cancelled,
        }
    }
}
