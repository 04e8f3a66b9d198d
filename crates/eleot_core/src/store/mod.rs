//! Document store client contract.
//!
//! # Responsibility
//! - Describe the collection/query primitives the observation repository
//!   consumes: add, equality-filtered sorted query, and get-by-id.
//! - Keep backend details (SQLite here, a managed service elsewhere) behind
//!   one async trait.
//!
//! # Invariants
//! - Document ids are assigned by the store, never by callers.
//! - Payloads are JSON objects; a document's id is not part of its payload.

use crate::db::BlockingError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

mod sqlite;

pub use sqlite::SqliteDocumentStore;

/// JSON object stored as the body of one document.
pub type DocumentPayload = Map<String, Value>;

pub type StoreResult<T> = Result<T, StoreError>;

/// One document read back from a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    /// Store-assigned identifier, unique within its collection.
    pub id: String,
    pub payload: DocumentPayload,
}

/// Exact-match predicate on one top-level payload field.
#[derive(Debug, Clone, PartialEq)]
pub struct EqualityFilter {
    pub field: String,
    pub value: Value,
}

impl EqualityFilter {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Ordering on one top-level payload field.
///
/// Documents that compare equal on `field` are ordered by id ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }

    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }
}

/// Document store faults surfaced to callers unchanged.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document store backend failure: {0}")]
    Backend(#[from] rusqlite::Error),
    #[error("document store connection unavailable: {0}")]
    Connection(#[from] BlockingError),
    #[error("document payload encoding failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("stored payload for `{collection}/{id}` is not a JSON object")]
    InvalidPayload { collection: String, id: String },
    #[error("field name `{0}` is not a plain top-level field")]
    InvalidField(String),
    #[error("filter value for `{0}` must be a string, number or boolean")]
    UnsupportedFilterValue(String),
    #[error("document store unavailable: {0}")]
    Unavailable(String),
}

/// Collection/query primitives of a document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Writes `payload` as a new document and returns its assigned id.
    async fn add_document(
        &self,
        collection: &str,
        payload: DocumentPayload,
    ) -> StoreResult<String>;

    /// Returns every document in `collection` matching `filter`, ordered by
    /// `sort`.
    async fn query(
        &self,
        collection: &str,
        filter: &EqualityFilter,
        sort: &SortSpec,
    ) -> StoreResult<Vec<StoredDocument>>;

    /// Point lookup by id. `Ok(None)` when the document does not exist.
    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> StoreResult<Option<StoredDocument>>;
}

#[async_trait]
impl<S: DocumentStore + ?Sized> DocumentStore for std::sync::Arc<S> {
    async fn add_document(
        &self,
        collection: &str,
        payload: DocumentPayload,
    ) -> StoreResult<String> {
        (**self).add_document(collection, payload).await
    }

    async fn query(
        &self,
        collection: &str,
        filter: &EqualityFilter,
        sort: &SortSpec,
    ) -> StoreResult<Vec<StoredDocument>> {
        (**self).query(collection, filter, sort).await
    }

    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> StoreResult<Option<StoredDocument>> {
        (**self).get_document(collection, id).await
    }
}

/// Checks that `field` names a plain top-level payload key and returns its
/// JSON path.
pub(crate) fn field_path(field: &str) -> StoreResult<String> {
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(format!("$.{field}"))
    } else {
        Err(StoreError::InvalidField(field.to_string()))
    }
}
