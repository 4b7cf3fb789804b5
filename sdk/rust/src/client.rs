use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Where the service listens by default.
pub const DEFAULT_URL: &str = "http://localhost:8080/cotacao";

/// End-to-end budget for one call, connect through body.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(300);

/// Default artifact file name.
pub const DEFAULT_ARTIFACT: &str = "cotacao.txt";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub bid: String,
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// The HTTP client could not be built or the request failed in transit.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service did not answer within the client's budget.
    #[error("no answer within {0:?}")]
    Timeout(Duration),

    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode quote: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Client for the quote service.
pub struct QuoteClient {
    client: Client,
    url: String,
    timeout: Duration,
}

impl QuoteClient {
    /// Client for `url` with the default 300ms budget.
    pub fn new(url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder().no_proxy().build()?;
        Ok(Self {
            client,
            url: url.to_string(),
            timeout,
        })
    }

    /// Request the current quote.
    ///
    /// The whole exchange, body included, must finish within the budget.
    pub async fn fetch_quote(&self) -> Result<QuoteResponse, ClientError> {
        tokio::time::timeout(self.timeout, self.fetch_unbounded())
            .await
            .map_err(|_| ClientError::Timeout(self.timeout))?
    }

    async fn fetch_unbounded(&self) -> Result<QuoteResponse, ClientError> {
        let resp = self.client.get(&self.url).send().await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: text.trim().to_string(),
            });
        }

        Ok(serde_json::from_str::<QuoteResponse>(&text)?)
    }
}

/// Artifact contents for `bid`.
pub fn artifact_line(bid: &str) -> String {
    format!("Dólar: {}", bid)
}

/// Write the artifact for `bid` to `path`, replacing any previous one.
pub async fn write_artifact(path: &Path, bid: &str) -> Result<(), ClientError> {
    tokio::fs::write(path, artifact_line(bid))
        .await
        .map_err(|source| ClientError::Artifact {
            path: path.to_path_buf(),
            source,
        })
}
