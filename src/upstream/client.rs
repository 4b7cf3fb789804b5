//! Upstream quote provider client.
//!
//! # Responsibilities
//! - Issue one GET to the provider's fixed endpoint
//! - Abandon the call the instant the fetch window closes
//! - Classify failures (construction, transport, status, decode, deadline)

use async_trait::async_trait;
use std::time::Instant;

use crate::config::UpstreamConfig;
use crate::observability::metrics;
use crate::quoting::{Quote, QuoteSource};
use crate::resilience::DeadlineWindow;
use crate::upstream::types::{FetchError, UpstreamPayload};

/// HTTP client for the upstream quote provider.
#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    url: String,
}

impl UpstreamClient {
    /// Create a new upstream client.
    pub fn new(config: &UpstreamConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Construction(e.to_string()))?;

        Ok(Self::with_client(client, config.url.clone()))
    }

    /// Create an upstream client around an existing `reqwest::Client`.
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch_unbounded(&self) -> Result<Quote, FetchError> {
        let request = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .build()
            .map_err(|e| FetchError::Construction(e.to_string()))?;

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        UpstreamPayload::decode(&body)
    }
}

#[async_trait]
impl QuoteSource for UpstreamClient {
    async fn fetch(&self, window: &DeadlineWindow) -> Result<Quote, FetchError> {
        let start = Instant::now();

        // Body reads happen inside the window too, so a provider that stalls
        // mid-body is cut off like one that never answers.
        let result = match window.run(self.fetch_unbounded()).await {
            Ok(result) => result,
            Err(closed) => Err(FetchError::from(closed)),
        };

        metrics::record_fetch(&result, start);
        result
    }
}

impl std::fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("url", &self.url)
            .finish()
    }
}
