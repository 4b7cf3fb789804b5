//! Storage error types.

use std::time::Duration;
use thiserror::Error;

use crate::resilience::WindowClosed;

/// Errors from writing a quote inside its persist window.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The transaction could not be started.
    #[error("failed to begin transaction: {0}")]
    Begin(String),

    /// The insert failed.
    #[error("failed to insert quote: {0}")]
    Exec(String),

    /// The commit failed.
    #[error("failed to commit quote: {0}")]
    Commit(String),

    /// The persist window's deadline passed before commit.
    #[error("persist deadline of {0:?} exceeded")]
    Timeout(Duration),

    /// The write was cancelled or its task died.
    #[error("persist aborted: {0}")]
    Aborted(String),
}

impl PersistError {
    pub fn label(&self) -> &'static str {
        match self {
            PersistError::Begin(_) => "begin",
            PersistError::Exec(_) => "exec",
            PersistError::Commit(_) => "commit",
            PersistError::Timeout(_) => "timeout",
            PersistError::Aborted(_) => "aborted",
        }
    }
}

impl From<WindowClosed> for PersistError {
    fn from(closed: WindowClosed) -> Self {
        match closed {
            WindowClosed::DeadlineExceeded { budget, .. } => PersistError::Timeout(budget),
            WindowClosed::Cancelled { stage } => {
                PersistError::Aborted(format!("{} window cancelled", stage))
            }
        }
    }
}

/// Errors from opening or inspecting the store outside the request path.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid database url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("database connection error: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("failed to create schema: {0}")]
    Schema(#[source] sqlx::Error),

    #[error("query error: {0}")]
    Query(#[from] sqlx::Error),
}
