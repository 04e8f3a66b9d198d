//! SQLite storage bootstrap and schema migration entry points.
//!
//! # Responsibility
//! - Open and configure the SQLite connection backing the local document
//!   store and the settings relay.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Store and relay code must not touch tables before migrations succeed.

use thiserror::Error;

pub mod migrations;
mod open;
mod shared;

pub use open::{open_db, open_db_in_memory};
pub use rusqlite::Connection;
pub use shared::{run_blocking, share_connection, BlockingError, SharedConnection};

pub type DbResult<T> = Result<T, DbError>;

/// Connection bootstrap and migration failures.
#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(
        "database schema version {db_version} is newer than supported {latest_supported}"
    )]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}
