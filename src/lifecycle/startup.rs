//! Startup orchestration.
//!
//! # Responsibilities
//! - Open storage and create the schema
//! - Build the upstream client and the orchestrator
//! - Bind the listener last, so traffic only arrives once everything is ready
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently

use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ServiceConfig;
use crate::http::HttpServer;
use crate::quoting::{PipelineConfig, QuoteOrchestrator};
use crate::storage::{QuoteStore, StorageError};
use crate::upstream::{FetchError, UpstreamClient};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("storage initialization failed: {0}")]
    Storage(#[from] StorageError),

    #[error("upstream client initialization failed: {0}")]
    Upstream(#[from] FetchError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// A fully wired service, ready to run.
pub struct Service {
    pub server: HttpServer,
    pub listener: TcpListener,
    pub store: QuoteStore,
}

impl Service {
    /// Address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }
}

/// Wire every subsystem described by `config` and bind the listener.
pub async fn bootstrap(config: &ServiceConfig) -> Result<Service, StartupError> {
    let store = QuoteStore::connect(&config.storage).await?;
    store.ensure_schema().await?;
    tracing::info!("Quote schema ready");

    let upstream = UpstreamClient::new(&config.upstream)?;
    tracing::info!(url = %upstream.url(), "Upstream client ready");

    let orchestrator = QuoteOrchestrator::new(
        PipelineConfig::from(&config.timeouts),
        Arc::new(upstream),
        Arc::new(store.clone()),
    );
    let server = HttpServer::new(orchestrator, config.timeouts.request());

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    Ok(Service {
        server,
        listener,
        store,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ListenerConfig, StorageConfig};

    fn local_config() -> ServiceConfig {
        ServiceConfig {
            listener: ListenerConfig {
                bind_address: "127.0.0.1:0".into(),
            },
            storage: StorageConfig {
                database_url: "sqlite::memory:".into(),
                ..StorageConfig::default()
            },
            ..ServiceConfig::default()
        }
    }

    #[tokio::test]
    async fn test_bootstrap_creates_schema_and_binds() {
        let service = bootstrap(&local_config()).await.unwrap();

        assert_ne!(service.local_addr().unwrap().port(), 0);
        assert_eq!(service.store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut config = local_config();
        config.listener.bind_address = taken.local_addr().unwrap().to_string();

        let err = match bootstrap(&config).await {
            Ok(_) => panic!("bind should fail while the port is held"),
            Err(e) => e,
        };
        assert!(matches!(err, StartupError::Bind { .. }));
    }
}
