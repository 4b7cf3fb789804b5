//! USD-BRL quote service library.
//!
//! Fetches the current quote from an upstream provider, archives it in
//! SQLite and serves it over HTTP, with every hop bounded by its own
//! deadline window.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod quoting;
pub mod resilience;
pub mod storage;
pub mod upstream;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use quoting::{Quote, QuoteOrchestrator};
