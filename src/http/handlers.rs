//! Route handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

use crate::http::server::AppState;
use crate::resilience::{DeadlineWindow, Stage};

/// Body of a failed quote request. The cause is only logged.
pub const INTERNAL_ERROR_BODY: &str = "internal server error";

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

/// `GET /cotacao`: fetch, archive and return the current quote.
///
/// Dropping this future (client gone) releases the inbound window, which
/// stops an in-flight fetch. An in-flight write is unaffected.
pub async fn get_quote(State(state): State<AppState>) -> Response {
    let inbound = DeadlineWindow::root(Stage::Inbound, state.request_budget);

    match state.orchestrator.handle(&inbound).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome.into_quote())).into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY).into_response(),
    }
}

/// `GET /health`
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
