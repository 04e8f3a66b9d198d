//! Persistent key/value storage behind the settings relay.

use crate::db::{run_blocking, BlockingError, SharedConnection};
use async_trait::async_trait;
use rusqlite::{params, params_from_iter};
use std::collections::BTreeMap;
use thiserror::Error;

/// Key/value backend faults. The relay turns these into response values.
#[derive(Debug, Error)]
pub enum StorageFault {
    #[error("settings storage backend failure: {0}")]
    Backend(#[from] rusqlite::Error),
    #[error("settings storage connection unavailable: {0}")]
    Connection(#[from] BlockingError),
    #[error("settings storage unavailable: {0}")]
    Unavailable(String),
}

/// Async get/set over string settings.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Returns the stored values for `keys`; absent keys are omitted.
    async fn get(&self, keys: &[&str]) -> Result<BTreeMap<String, String>, StorageFault>;
    /// Writes all `entries` atomically.
    async fn set(&self, entries: BTreeMap<String, String>) -> Result<(), StorageFault>;
}

#[async_trait]
impl<K: KeyValueStorage + ?Sized> KeyValueStorage for std::sync::Arc<K> {
    async fn get(&self, keys: &[&str]) -> Result<BTreeMap<String, String>, StorageFault> {
        (**self).get(keys).await
    }

    async fn set(&self, entries: BTreeMap<String, String>) -> Result<(), StorageFault> {
        (**self).set(entries).await
    }
}

/// Settings storage over the `settings` table.
#[derive(Clone)]
pub struct SqliteKeyValueStorage {
    conn: SharedConnection,
}

impl SqliteKeyValueStorage {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl KeyValueStorage for SqliteKeyValueStorage {
    async fn get(&self, keys: &[&str]) -> Result<BTreeMap<String, String>, StorageFault> {
        if keys.is_empty() {
            return Ok(BTreeMap::new());
        }
        let keys: Vec<String> = keys.iter().map(|key| (*key).to_string()).collect();
        run_blocking(&self.conn, move |conn| {
            let placeholders = vec!["?"; keys.len()].join(", ");
            let mut stmt = conn.prepare(&format!(
                "SELECT key, value FROM settings WHERE key IN ({placeholders});"
            ))?;
            let mut rows = stmt.query(params_from_iter(keys.iter()))?;
            let mut values = BTreeMap::new();
            while let Some(row) = rows.next()? {
                values.insert(row.get::<_, String>(0)?, row.get::<_, String>(1)?);
            }
            Ok(values)
        })
        .await
    }

    async fn set(&self, entries: BTreeMap<String, String>) -> Result<(), StorageFault> {
        run_blocking(&self.conn, move |conn| {
            let tx = conn.transaction()?;
            for (key, value) in &entries {
                tx.execute(
                    "INSERT INTO settings (key, value) VALUES (?1, ?2)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
                    params![key, value],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyValueStorage, SqliteKeyValueStorage};
    use crate::db::{open_db_in_memory, share_connection};
    use std::collections::BTreeMap;

    fn storage() -> SqliteKeyValueStorage {
        SqliteKeyValueStorage::new(share_connection(
            open_db_in_memory().expect("in-memory db should open"),
        ))
    }

    #[tokio::test]
    async fn get_omits_absent_keys() {
        let storage = storage();
        let values = storage.get(&["apiKey"]).await.expect("get should succeed");
        assert!(values.is_empty());
    }

    #[tokio::test]
    async fn set_overwrites_existing_values() {
        let storage = storage();
        storage
            .set(BTreeMap::from([("apiKey".to_string(), "first".to_string())]))
            .await
            .expect("first set");
        storage
            .set(BTreeMap::from([
                ("apiKey".to_string(), "second".to_string()),
                ("apiEndpoint".to_string(), "https://example.test".to_string()),
            ]))
            .await
            .expect("second set");

        let values = storage
            .get(&["apiKey", "apiEndpoint", "other"])
            .await
            .expect("get should succeed");
        assert_eq!(values.len(), 2);
        assert_eq!(values["apiKey"], "second");
        assert_eq!(values["apiEndpoint"], "https://example.test");
    }
}
