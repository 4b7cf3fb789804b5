//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use quote_service::config::StorageConfig;
use quote_service::quoting::{PipelineConfig, QuoteOrchestrator};
use quote_service::storage::QuoteStore;
use quote_service::upstream::UpstreamClient;
use quote_service::{HttpServer, Shutdown};

/// Body the real provider returns for a 5.43 quote.
pub const PROVIDER_BODY: &str = r#"{"USDBRL":{"code":"USD","codein":"BRL","name":"Dólar Americano/Real Brasileiro","high":"5.45","low":"5.40","bid":"5.43","ask":"5.44","timestamp":"1700000000"}}"#;

/// Start a programmable mock upstream on an ephemeral port.
///
/// `f` is called once per connection and decides status and body; it may
/// sleep to simulate a slow provider.
pub async fn start_programmable_upstream<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut buf = [0u8; 2048];
                        let _ = socket.read(&mut buf).await;

                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a mock upstream that always answers 200 with `body`.
pub async fn start_mock_upstream(body: &'static str) -> SocketAddr {
    start_programmable_upstream(move || async move { (200, body.to_string()) }).await
}

/// Start a mock upstream that answers 200 with `body` after `delay`.
pub async fn start_slow_upstream(body: &'static str, delay: Duration) -> SocketAddr {
    start_programmable_upstream(move || async move {
        tokio::time::sleep(delay).await;
        (200, body.to_string())
    })
    .await
}

/// A running service with its own database.
pub struct TestService {
    pub addr: SocketAddr,
    pub store: QuoteStore,
    pub storage: StorageConfig,
    pub shutdown: Shutdown,
    _dir: tempfile::TempDir,
}

impl TestService {
    pub fn quote_url(&self) -> String {
        format!("http://{}/cotacao", self.addr)
    }
}

/// Start the service against `upstream` with the given stage budgets.
pub async fn start_service(
    upstream: SocketAddr,
    pipeline: PipelineConfig,
    request_budget: Duration,
) -> TestService {
    let dir = tempfile::tempdir().unwrap();
    let storage = StorageConfig {
        database_url: format!("sqlite://{}", dir.path().join("quotes.db").display()),
        max_connections: 2,
        busy_timeout_ms: 200,
    };

    let store = QuoteStore::connect(&storage).await.unwrap();
    store.ensure_schema().await.unwrap();

    let http = reqwest::Client::builder().no_proxy().build().unwrap();
    let source = UpstreamClient::with_client(http, format!("http://{}/json/last/USD-BRL", upstream));

    let orchestrator = QuoteOrchestrator::new(pipeline, Arc::new(source), Arc::new(store.clone()));
    let server = HttpServer::new(orchestrator, request_budget);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    TestService {
        addr,
        store,
        storage,
        shutdown,
        _dir: dir,
    }
}

/// Start the service with the default budgets.
pub async fn start_default_service(upstream: SocketAddr) -> TestService {
    start_service(upstream, PipelineConfig::default(), Duration::from_secs(1)).await
}

/// HTTP client for talking to the service under test.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Give background rollbacks and detached writes time to settle.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(300)).await;
}
