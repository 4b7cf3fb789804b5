//! Upstream quote provider subsystem.
//!
//! # Data Flow
//! ```text
//! fetch window
//!     → client.rs (GET provider endpoint, status check)
//!     → types.rs (decode {"USDBRL":{"bid":...}} into a Quote)
//! ```

pub mod client;
pub mod types;

pub use client::UpstreamClient;
pub use types::{FetchError, FetchErrorKind, UpstreamPayload};
