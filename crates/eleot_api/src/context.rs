//! Process-wide application context.
//!
//! # Responsibility
//! - Construct the store client once at process start and inject it into
//!   the observation repository and the settings relay.
//!
//! # Invariants
//! - Exactly one SQLite connection backs both the document store and the
//!   settings storage of a context.

use crate::config::AppConfig;
use eleot_core::db::{open_db, share_connection, Connection, DbError};
use eleot_core::{
    init_logging, DocumentObservationRepository, LoggingError, ObservationService, SettingsRelay,
    SqliteDocumentStore, SqliteKeyValueStorage,
};
use log::{info, warn};
use mockable::{Clock, DefaultClock};
use std::sync::Arc;
use thiserror::Error;

pub(crate) type Observations =
    ObservationService<DocumentObservationRepository<SqliteDocumentStore>>;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("logging setup failed: {0}")]
    Logging(#[from] LoggingError),
    #[error("database setup failed: {0}")]
    Db(#[from] DbError),
}

/// Long-lived handles shared by every API call.
pub struct AppContext {
    pub(crate) observations: Observations,
    pub(crate) relay: SettingsRelay<SqliteKeyValueStorage>,
}

impl AppContext {
    /// Initializes logging (when configured), opens the database and seeds
    /// relay defaults.
    pub async fn bootstrap(config: &AppConfig) -> Result<Self, BootstrapError> {
        if let Some(log_dir) = config.log_dir.as_deref() {
            init_logging(&config.log_level, log_dir)?;
        }
        let conn = open_db(&config.db_path)?;
        Ok(Self::from_connection(conn, Arc::new(DefaultClock)).await)
    }

    /// Builds a context over an already-migrated connection.
    pub async fn from_connection(conn: Connection, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let shared = share_connection(conn);
        let store = SqliteDocumentStore::new(Arc::clone(&shared));
        let observations = ObservationService::new(DocumentObservationRepository::new(store, clock));
        let relay = SettingsRelay::new(SqliteKeyValueStorage::new(shared));

        if let Err(fault) = relay.on_installed().await {
            // Reads fall back to defaults, so a failed seed is not fatal.
            warn!("event=app_bootstrap module=api status=degraded step=relay_install error={fault}");
        }
        info!("event=app_bootstrap module=api status=ok");

        Self {
            observations,
            relay,
        }
    }
}
