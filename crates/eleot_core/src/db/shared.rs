//! Shared connection handle for async callers.
//!
//! SQLite work is synchronous, so async store implementations hand their
//! statements to tokio's blocking pool through [`run_blocking`].

use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// One connection shared by every store built on top of it.
pub type SharedConnection = Arc<Mutex<Connection>>;

/// Failures of the blocking hand-off itself, independent of SQL errors.
#[derive(Debug, Error)]
pub enum BlockingError {
    #[error("connection lock poisoned by a panicked task")]
    Poisoned,
    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Wraps a migrated connection for sharing between stores.
pub fn share_connection(conn: Connection) -> SharedConnection {
    Arc::new(Mutex::new(conn))
}

/// Runs `op` against the shared connection on the blocking pool.
pub async fn run_blocking<T, E, F>(conn: &SharedConnection, op: F) -> Result<T, E>
where
    F: FnOnce(&mut Connection) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: From<BlockingError> + Send + 'static,
{
    let conn = Arc::clone(conn);
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.lock().map_err(|_| E::from(BlockingError::Poisoned))?;
        op(&mut guard)
    })
    .await
    .map_err(|err| E::from(BlockingError::Join(err)))?
}
