//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and addresses.
//! Every problem is reported, not just the first.

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ServiceConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("timeouts.fetch_ms ({fetch_ms}) exceeds timeouts.request_ms ({request_ms})")]
    FetchExceedsRequest { fetch_ms: u64, request_ms: u64 },

    #[error("{field} is not a socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("upstream.url is not a valid http(s) URL: {0}")]
    InvalidUpstreamUrl(String),

    #[error("storage.database_url must not be empty")]
    EmptyDatabaseUrl,

    #[error("storage.max_connections must be at least 1")]
    NoConnections,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let timeouts = &config.timeouts;
    for (field, value) in [
        ("timeouts.request_ms", timeouts.request_ms),
        ("timeouts.fetch_ms", timeouts.fetch_ms),
        ("timeouts.persist_ms", timeouts.persist_ms),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout { field });
        }
    }
    if timeouts.fetch_ms > timeouts.request_ms {
        errors.push(ValidationError::FetchExceedsRequest {
            fetch_ms: timeouts.fetch_ms,
            request_ms: timeouts.request_ms,
        });
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    match url::Url::parse(&config.upstream.url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => errors.push(ValidationError::InvalidUpstreamUrl(config.upstream.url.clone())),
    }

    if config.storage.database_url.trim().is_empty() {
        errors.push(ValidationError::EmptyDatabaseUrl);
    }
    if config.storage.max_connections == 0 {
        errors.push(ValidationError::NoConnections);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ServiceConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = ServiceConfig::default();
        config.timeouts.persist_ms = 0;
        config.listener.bind_address = "localhost".into();
        config.upstream.url = "ftp://example.com/quote".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::ZeroTimeout {
            field: "timeouts.persist_ms"
        }));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidUpstreamUrl(_))));
    }

    #[test]
    fn test_fetch_budget_must_fit_request_budget() {
        let mut config = ServiceConfig::default();
        config.timeouts.request_ms = 100;
        config.timeouts.fetch_ms = 200;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::FetchExceedsRequest {
                fetch_ms: 200,
                request_ms: 100
            }]
        );
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = ServiceConfig::default();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
