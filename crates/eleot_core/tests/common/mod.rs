#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use eleot_core::db::{open_db_in_memory, share_connection, SharedConnection};
use eleot_core::{
    DocumentPayload, DocumentStore, EqualityFilter, SortSpec, SqliteDocumentStore, StoreError,
    StoreResult, StoredDocument,
};
use mockable::Clock;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Clock that advances by a fixed step on every read.
pub struct SteppingClock {
    next: Mutex<DateTime<Utc>>,
    step: Duration,
}

impl SteppingClock {
    pub fn starting_at(millis: i64, step: Duration) -> Self {
        Self {
            next: Mutex::new(Utc.timestamp_millis_opt(millis).unwrap()),
            step,
        }
    }

    pub fn frozen(millis: i64) -> Self {
        Self::starting_at(millis, Duration::zero())
    }
}

impl Clock for SteppingClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        let mut next = self.next.lock().unwrap();
        let now = *next;
        *next = now + self.step;
        now
    }
}

/// Document store whose calls fail while `unavailable` is set.
pub struct FlakyStore {
    inner: SqliteDocumentStore,
    unavailable: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: SqliteDocumentStore) -> Self {
        Self {
            inner,
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn set_unavailable(&self, value: bool) {
        self.unavailable.store(value, Ordering::SeqCst);
    }

    fn check(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("simulated outage".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn add_document(
        &self,
        collection: &str,
        payload: DocumentPayload,
    ) -> StoreResult<String> {
        self.check()?;
        self.inner.add_document(collection, payload).await
    }

    async fn query(
        &self,
        collection: &str,
        filter: &EqualityFilter,
        sort: &SortSpec,
    ) -> StoreResult<Vec<StoredDocument>> {
        self.check()?;
        self.inner.query(collection, filter, sort).await
    }

    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> StoreResult<Option<StoredDocument>> {
        self.check()?;
        self.inner.get_document(collection, id).await
    }
}

pub fn shared_memory_db() -> SharedConnection {
    share_connection(open_db_in_memory().unwrap())
}

pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected JSON object, got {other}"),
    }
}
