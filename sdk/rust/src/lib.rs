//! Client for the USD-BRL quote service.

mod client;

pub use client::{
    artifact_line, write_artifact, ClientError, QuoteClient, QuoteResponse, DEFAULT_ARTIFACT,
    DEFAULT_TIMEOUT, DEFAULT_URL,
};
