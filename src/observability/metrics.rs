//! Metrics collection and exposition.
//!
//! # Metrics
//! - `quote_requests_total` (counter): inbound requests by terminal state
//! - `quote_request_duration_seconds` (histogram): inbound latency
//! - `quote_fetch_failures_total` (counter): upstream failures by kind
//! - `quote_fetch_duration_seconds` (histogram): upstream latency
//! - `quote_persist_total` (counter): storage writes by outcome
//! - `quote_persist_duration_seconds` (histogram): storage latency
//!
//! Recording is a no-op until a recorder is installed, so tests and
//! embedders that skip `init_metrics` pay nothing.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

use crate::quoting::{Quote, RequestState};
use crate::storage::{PersistAck, PersistError};
use crate::upstream::FetchError;

/// Latency buckets from 1ms to 1s.
const LATENCY_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.2, 0.3, 0.5, 1.0];

/// Error type for metrics setup.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("metrics configuration error: {0}")]
    Configuration(String),
    #[error("metrics installation error: {0}")]
    Installation(String),
}

/// Install the Prometheus exporter, serving `/metrics` on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets(LATENCY_BUCKETS)
        .map_err(|e| MetricsError::Configuration(e.to_string()))?
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    tracing::info!(address = %addr, "Prometheus metrics exporter started");
    Ok(())
}

/// Record the terminal state of one inbound request.
pub fn record_request(state: RequestState, start: Instant) {
    counter!("quote_requests_total", "outcome" => state.as_str()).increment(1);
    histogram!("quote_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record one upstream fetch.
pub fn record_fetch(result: &Result<Quote, FetchError>, start: Instant) {
    histogram!("quote_fetch_duration_seconds").record(start.elapsed().as_secs_f64());
    if let Err(e) = result {
        counter!("quote_fetch_failures_total", "kind" => e.kind().as_str()).increment(1);
    }
}

/// Record one storage write.
pub fn record_persist(result: &Result<PersistAck, PersistError>, start: Instant) {
    let outcome = match result {
        Ok(_) => "committed",
        Err(e) => e.label(),
    };
    counter!("quote_persist_total", "outcome" => outcome).increment(1);
    histogram!("quote_persist_duration_seconds").record(start.elapsed().as_secs_f64());
}
