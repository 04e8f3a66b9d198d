//! Observation repository contract and document-store implementation.
//!
//! # Invariants
//! - `create` writes exactly one document or fails without writing.
//! - `list_by_user` is scoped by exact `userId` equality and ordered by
//!   `createdAt` descending, ties by id ascending.
//! - Store faults are logged once here and returned to the caller.

use crate::model::observation::{
    Observation, ObservationData, ObservationDecodeError, ObservationId, FIELD_CREATED_AT,
    FIELD_USER_ID, OBSERVATIONS_COLLECTION,
};
use crate::store::{DocumentStore, EqualityFilter, SortSpec, StoreError, StoredDocument};
use async_trait::async_trait;
use log::{error, info};
use mockable::Clock;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for observation persistence and queries.
#[derive(Debug, Error)]
pub enum RepoError {
    /// The store rejected or failed the write; nothing was persisted.
    #[error("observation write failed: {0}")]
    StoreWrite(#[source] StoreError),
    #[error("observation read failed: {0}")]
    StoreRead(#[source] StoreError),
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("invalid persisted observation `{id}`: {source}")]
    InvalidData {
        id: ObservationId,
        #[source]
        source: ObservationDecodeError,
    },
}

/// Repository interface for observation records.
#[async_trait]
pub trait ObservationRepository: Send + Sync {
    /// Persists a new observation for `user_id` and returns its id.
    async fn create(&self, user_id: &str, data: ObservationData) -> RepoResult<ObservationId>;
    /// Lists one user's observations, newest first.
    async fn list_by_user(&self, user_id: &str) -> RepoResult<Vec<Observation>>;
    /// Point lookup by id.
    async fn get_by_id(&self, observation_id: &str) -> RepoResult<Option<Observation>>;
}

/// Observation repository backed by any [`DocumentStore`].
pub struct DocumentObservationRepository<S> {
    store: S,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl<S: DocumentStore> DocumentObservationRepository<S> {
    /// Creates a repository over an already-constructed store client.
    pub fn new(store: S, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self { store, clock }
    }
}

#[async_trait]
impl<S: DocumentStore> ObservationRepository for DocumentObservationRepository<S> {
    async fn create(&self, user_id: &str, data: ObservationData) -> RepoResult<ObservationId> {
        let user_id = require_non_empty(user_id, "userId must not be empty")?;
        let started_at = Instant::now();
        let payload = Observation::new_payload(user_id, data, self.clock.utc());

        match self
            .store
            .add_document(OBSERVATIONS_COLLECTION, payload)
            .await
        {
            Ok(id) => {
                info!(
                    "event=observation_create module=repo status=ok user_id={user_id} observation_id={id} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(id)
            }
            Err(err) => {
                error!(
                    "event=observation_create module=repo status=error user_id={user_id} duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                Err(RepoError::StoreWrite(err))
            }
        }
    }

    async fn list_by_user(&self, user_id: &str) -> RepoResult<Vec<Observation>> {
        let user_id = require_non_empty(user_id, "userId must not be empty")?;
        let started_at = Instant::now();
        let filter = EqualityFilter::new(FIELD_USER_ID, user_id);
        let sort = SortSpec::descending(FIELD_CREATED_AT);

        let documents = self
            .store
            .query(OBSERVATIONS_COLLECTION, &filter, &sort)
            .await
            .map_err(|err| {
                error!(
                    "event=observation_list module=repo status=error user_id={user_id} duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                RepoError::StoreRead(err)
            })?;

        let records = documents
            .into_iter()
            .map(decode_document)
            .collect::<RepoResult<Vec<_>>>()?;
        info!(
            "event=observation_list module=repo status=ok user_id={user_id} count={} duration_ms={}",
            records.len(),
            started_at.elapsed().as_millis()
        );
        Ok(records)
    }

    async fn get_by_id(&self, observation_id: &str) -> RepoResult<Option<Observation>> {
        let observation_id = require_non_empty(observation_id, "observationId must not be empty")?;

        let document = self
            .store
            .get_document(OBSERVATIONS_COLLECTION, observation_id)
            .await
            .map_err(|err| {
                error!(
                    "event=observation_get module=repo status=error observation_id={observation_id} error={err}"
                );
                RepoError::StoreRead(err)
            })?;

        info!(
            "event=observation_get module=repo status=ok observation_id={observation_id} found={}",
            document.is_some()
        );
        document.map(decode_document).transpose()
    }
}

fn decode_document(document: StoredDocument) -> RepoResult<Observation> {
    let StoredDocument { id, payload } = document;
    Observation::from_document(id.clone(), payload).map_err(|source| {
        error!("event=observation_decode module=repo status=error observation_id={id} error={source}");
        RepoError::InvalidData { id, source }
    })
}

fn require_non_empty<'a>(value: &'a str, message: &'static str) -> RepoResult<&'a str> {
    if value.trim().is_empty() {
        Err(RepoError::InvalidArgument(message))
    } else {
        Ok(value)
    }
}
