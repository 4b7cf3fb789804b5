//! USD-BRL quote service.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌───────────────────────────────────────────────────┐
//!                    │                  QUOTE SERVICE                     │
//!                    │                                                    │
//!  GET /cotacao      │  ┌────────┐    ┌──────────────┐    ┌──────────┐   │
//!  ──────────────────┼─▶│  http  │───▶│ orchestrator │───▶│ upstream │───┼──▶ Provider
//!                    │  │ server │    │              │    │ (fetch)  │   │
//!                    │  └────────┘    │              │    └──────────┘   │
//!  {"bid":"..."}     │       ▲        │              │    ┌──────────┐   │
//!  ◀─────────────────┼───────┘        │              │───▶│ storage  │───┼──▶ SQLite
//!                    │                └──────────────┘    │(persist) │   │
//!                    │                                    └──────────┘   │
//!                    │  resilience (deadline windows) · config ·          │
//!                    │  observability · lifecycle                         │
//!                    └───────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use quote_service::config::{load_config, ServiceConfig};
use quote_service::lifecycle::{bootstrap, wait_for_signal, Shutdown};
use quote_service::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "quote-service")]
#[command(about = "Serves the current USD-BRL quote and archives every quote served", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    logging::init_logging(&config.observability)?;

    tracing::info!("quote-service v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.url,
        database_url = %config.storage.database_url,
        request_ms = config.timeouts.request_ms,
        fetch_ms = config.timeouts.fetch_ms,
        persist_ms = config.timeouts.persist_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let service = bootstrap(&config).await?;
    tracing::info!(address = %service.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let mut server = tokio::spawn(service.server.run(service.listener, shutdown.subscribe()));

    tokio::select! {
        res = &mut server => res??,
        signal = wait_for_signal() => {
            let signal = signal?;
            tracing::info!(signal, "Shutdown signal received");
            shutdown.trigger();
            server.await??;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
