//! End-to-end behaviour of `GET /cotacao` against mock upstreams and a real
//! SQLite file.

mod common;

use sqlx::Connection;
use std::time::{Duration, Instant};

use common::*;
use quote_service::quoting::PipelineConfig;

fn roomy() -> PipelineConfig {
    PipelineConfig {
        fetch: Duration::from_secs(1),
        persist: Duration::from_secs(2),
    }
}

#[tokio::test]
async fn test_quote_served_and_archived() {
    let upstream = start_mock_upstream(PROVIDER_BODY).await;
    let service = start_service(upstream, roomy(), Duration::from_secs(3)).await;

    let resp = http_client().get(service.quote_url()).send().await.unwrap();

    assert_eq!(resp.status(), 200);
    assert!(resp
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json")));
    assert_eq!(resp.text().await.unwrap(), r#"{"bid":"5.43"}"#);

    let records = service.store.latest(10).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].bid, "5.43");
}

#[tokio::test]
async fn test_slow_upstream_fails_without_archiving() {
    let upstream = start_slow_upstream(PROVIDER_BODY, Duration::from_millis(600)).await;
    let service = start_service(
        upstream,
        PipelineConfig {
            fetch: Duration::from_millis(200),
            persist: Duration::from_secs(2),
        },
        Duration::from_secs(3),
    )
    .await;

    let start = Instant::now();
    let resp = http_client().get(service.quote_url()).send().await.unwrap();

    assert_eq!(resp.status(), 500);
    assert!(start.elapsed() < Duration::from_millis(550), "fetch was not cut off");
    assert_eq!(resp.text().await.unwrap().trim(), "internal server error");
    assert_eq!(service.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_inbound_budget_caps_fetch() {
    let upstream = start_slow_upstream(PROVIDER_BODY, Duration::from_millis(600)).await;
    let service = start_service(upstream, roomy(), Duration::from_millis(100)).await;

    let start = Instant::now();
    let resp = http_client().get(service.quote_url()).send().await.unwrap();

    assert_eq!(resp.status(), 500);
    assert!(start.elapsed() < Duration::from_millis(550));
    assert_eq!(service.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_storage_timeout_still_serves_quote() {
    let upstream = start_mock_upstream(PROVIDER_BODY).await;
    let service = start_service(
        upstream,
        PipelineConfig {
            fetch: Duration::from_secs(1),
            persist: Duration::from_millis(10),
        },
        Duration::from_secs(3),
    )
    .await;

    // Hold the write lock so the commit cannot land within its budget.
    let mut holder = sqlx::sqlite::SqliteConnection::connect(&service.storage.database_url)
        .await
        .unwrap();
    sqlx::query("BEGIN IMMEDIATE").execute(&mut holder).await.unwrap();

    let resp = http_client().get(service.quote_url()).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), r#"{"bid":"5.43"}"#);

    sqlx::query("ROLLBACK").execute(&mut holder).await.unwrap();
    holder.close().await.unwrap();
    settle().await;

    assert_eq!(service.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_missing_pair_serves_empty_bid() {
    let upstream = start_mock_upstream(r#"{"EURBRL":{"bid":"6.01"}}"#).await;
    let service = start_service(upstream, roomy(), Duration::from_secs(3)).await;

    let resp = http_client().get(service.quote_url()).send().await.unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), r#"{"bid":""}"#);
    assert_eq!(service.store.latest(1).await.unwrap()[0].bid, "");
}

#[tokio::test]
async fn test_upstream_error_status_is_500() {
    let upstream =
        start_programmable_upstream(|| async { (503, r#"{"status":503}"#.to_string()) }).await;
    let service = start_service(upstream, roomy(), Duration::from_secs(3)).await;

    let resp = http_client().get(service.quote_url()).send().await.unwrap();

    assert_eq!(resp.status(), 500);
    assert_eq!(service.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_malformed_upstream_body_is_500() {
    let upstream = start_mock_upstream("<html>maintenance</html>").await;
    let service = start_service(upstream, roomy(), Duration::from_secs(3)).await;

    let resp = http_client().get(service.quote_url()).send().await.unwrap();

    assert_eq!(resp.status(), 500);
    assert_eq!(service.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_each_request_archives_one_row() {
    let upstream = start_mock_upstream(PROVIDER_BODY).await;
    let service = start_service(upstream, roomy(), Duration::from_secs(3)).await;
    let client = http_client();

    for _ in 0..3 {
        let resp = client.get(service.quote_url()).send().await.unwrap();
        assert_eq!(resp.status(), 200);
    }

    assert_eq!(service.store.count().await.unwrap(), 3);
}

#[tokio::test]
async fn test_request_id_generated_and_echoed() {
    let upstream = start_mock_upstream(PROVIDER_BODY).await;
    let service = start_service(upstream, roomy(), Duration::from_secs(3)).await;
    let client = http_client();

    let resp = client.get(service.quote_url()).send().await.unwrap();
    let generated = resp.headers().get("x-request-id").unwrap().to_str().unwrap();
    assert_eq!(generated.len(), 36);

    let resp = client
        .get(service.quote_url())
        .header("x-request-id", "caller-supplied-1")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers().get("x-request-id").unwrap(), "caller-supplied-1");
}

#[tokio::test]
async fn test_health_reports_version() {
    let upstream = start_mock_upstream(PROVIDER_BODY).await;
    let service = start_default_service(upstream).await;

    let resp = http_client()
        .get(format!("http://{}/health", service.addr))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let upstream = start_mock_upstream(PROVIDER_BODY).await;
    let service = start_default_service(upstream).await;
    let health = format!("http://{}/health", service.addr);

    assert_eq!(http_client().get(&health).send().await.unwrap().status(), 200);

    service.shutdown.trigger();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(http_client().get(&health).send().await.is_err());
}
