//! SQLite-backed quote store.
//!
//! # Responsibilities
//! - Open the connection pool and create the `quotes` table once at startup
//! - Write one row per quote inside a transaction bounded by the persist window
//! - Roll back on every failure path
//!
//! # Design Decisions
//! - Append-only: rows are never updated or deleted here
//! - `created_at` is filled in by SQLite, not by the service
//! - A rollback after the window has closed runs off the request path
//! - The window is checked once more before COMMIT; a started commit is
//!   never abandoned, so a reported timeout always means no row

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::config::StorageConfig;
use crate::observability::metrics;
use crate::quoting::{Quote, QuoteSink};
use crate::resilience::DeadlineWindow;
use crate::storage::error::{PersistError, StorageError};

const CREATE_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS quotes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        bid TEXT NOT NULL,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    )
";

const INSERT_QUOTE: &str = "INSERT INTO quotes (bid) VALUES (?)";

/// Acknowledgement of a committed write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistAck {
    /// Row id assigned by storage.
    pub id: i64,
}

/// A stored quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct PersistedRecord {
    pub id: i64,
    pub bid: String,
    pub created_at: NaiveDateTime,
}

/// Durable quote storage.
#[derive(Clone)]
pub struct QuoteStore {
    pool: SqlitePool,
}

impl QuoteStore {
    /// Open the pool described by `config`, creating the database file if needed.
    pub async fn connect(config: &StorageConfig) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(&config.database_url)
            .map_err(|source| StorageError::InvalidUrl {
                url: config.database_url.clone(),
                source,
            })?
            .create_if_missing(true)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms));

        // Every connection to `:memory:` is its own database.
        let in_memory = config.database_url.contains(":memory:");
        let max_connections = if in_memory { 1 } else { config.max_connections };

        let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections);
        if in_memory {
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(StorageError::Connect)?;

        tracing::info!(
            database_url = %config.database_url,
            max_connections,
            "Quote store connected"
        );

        Ok(Self { pool })
    }

    /// Create the `quotes` table if it does not exist. Idempotent.
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Schema)?;
        Ok(())
    }

    /// Number of stored quotes.
    pub async fn count(&self) -> Result<i64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quotes")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Most recent quotes, newest first.
    pub async fn latest(&self, limit: u32) -> Result<Vec<PersistedRecord>, StorageError> {
        let records = sqlx::query_as::<_, PersistedRecord>(
            "SELECT id, bid, created_at FROM quotes ORDER BY id DESC LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn write(&self, window: &DeadlineWindow, quote: &Quote) -> Result<PersistAck, PersistError> {
        // BEGIN runs on its own task. If the window closes first, the task
        // still finishes and drops the transaction, which rolls it back, so no
        // connection returns to the pool inside a stray transaction.
        let pool = self.pool.clone();
        let begin = tokio::spawn(async move { pool.begin().await });

        let mut tx = match window.run(begin).await {
            Ok(Ok(Ok(tx))) => tx,
            Ok(Ok(Err(e))) => return Err(PersistError::Begin(e.to_string())),
            Ok(Err(e)) => return Err(PersistError::Aborted(e.to_string())),
            Err(closed) => return Err(closed.into()),
        };

        let inserted = window
            .run(sqlx::query(INSERT_QUOTE).bind(quote.bid()).execute(&mut *tx))
            .await;

        let id = match inserted {
            Ok(Ok(done)) => done.last_insert_rowid(),
            Ok(Err(e)) => {
                roll_back(tx);
                return Err(PersistError::Exec(e.to_string()));
            }
            Err(closed) => {
                roll_back(tx);
                return Err(closed.into());
            }
        };

        // Last point at which the window can stop the write. Once COMMIT is
        // handed to SQLite it may land regardless, so it runs to completion and
        // the caller sees what the table actually holds.
        if let Err(closed) = window.check() {
            roll_back(tx);
            return Err(closed.into());
        }

        // A failed commit drops `tx` while still open, and sqlx rolls it back
        // before the connection is handed out again.
        tx.commit()
            .await
            .map(|()| PersistAck { id })
            .map_err(|e| PersistError::Commit(e.to_string()))
    }
}

/// Roll back on a background task so a wedged connection cannot hold up the
/// caller.
fn roll_back(tx: Transaction<'static, Sqlite>) {
    tokio::spawn(async move {
        if let Err(e) = tx.rollback().await {
            tracing::warn!(error = %e, "Quote transaction rollback failed");
        }
    });
}

#[async_trait]
impl QuoteSink for QuoteStore {
    async fn persist(
        &self,
        window: &DeadlineWindow,
        quote: &Quote,
    ) -> Result<PersistAck, PersistError> {
        let start = Instant::now();
        let result = self.write(window, quote).await;
        metrics::record_persist(&result, start);
        result
    }
}

impl std::fmt::Debug for QuoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteStore")
            .field("connections", &self.pool.size())
            .finish()
    }
}
