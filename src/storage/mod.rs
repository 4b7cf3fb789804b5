//! Quote storage subsystem.
//!
//! # Data Flow
//! ```text
//! persist window + Quote
//!     → store.rs (BEGIN → INSERT → COMMIT, rollback on any failure)
//!     → quotes table (id, bid, created_at)
//! ```

pub mod error;
pub mod store;

pub use error::{PersistError, StorageError};
pub use store::{PersistAck, PersistedRecord, QuoteStore};
