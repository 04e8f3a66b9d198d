//! Core data layer for the ELEOT classroom-observation tool.
//!
//! Owns the observation repository over a pluggable document store and the
//! settings relay used by the extension surface.

pub mod db;
pub mod logging;
pub mod model;
pub mod relay;
pub mod repo;
pub mod service;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::observation::{Observation, ObservationData, ObservationId};
pub use model::rubric::{LearningEnvironment, RubricError, RubricItem};
pub use relay::{
    KeyValueStorage, RelayInputError, RelayMessage, RelayRequest, RelayResponse, SettingsRelay,
    SqliteKeyValueStorage, StorageFault,
};
pub use repo::observation_repo::{
    DocumentObservationRepository, ObservationRepository, RepoError, RepoResult,
};
pub use service::observation_service::{
    environment_summary, ObservationService, ObservationServiceError,
};
pub use store::{
    DocumentPayload, DocumentStore, EqualityFilter, SortDirection, SortSpec, SqliteDocumentStore,
    StoreError, StoreResult, StoredDocument,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
