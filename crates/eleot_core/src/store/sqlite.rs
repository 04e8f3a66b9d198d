//! SQLite-backed document store.
//!
//! Collections share one `documents` table; payloads are stored as JSON text
//! and filtered/sorted with `json_extract`.

use super::{
    field_path, DocumentPayload, DocumentStore, EqualityFilter, SortDirection, SortSpec,
    StoreError, StoreResult, StoredDocument,
};
use crate::db::{run_blocking, SharedConnection};
use async_trait::async_trait;
use log::debug;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value;
use uuid::Uuid;

/// Document store over a migrated SQLite connection.
///
/// Cloning is cheap; clones share the same connection.
#[derive(Clone)]
pub struct SqliteDocumentStore {
    conn: SharedConnection,
}

impl SqliteDocumentStore {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn add_document(
        &self,
        collection: &str,
        payload: DocumentPayload,
    ) -> StoreResult<String> {
        let collection = collection.to_string();
        let body = serde_json::to_string(&payload)?;
        run_blocking(&self.conn, move |conn| {
            let id = Uuid::new_v4().simple().to_string();
            conn.execute(
                "INSERT INTO documents (collection, id, payload) VALUES (?1, ?2, ?3);",
                params![collection, id, body],
            )?;
            debug!("event=document_add module=store status=ok collection={collection} id={id}");
            Ok(id)
        })
        .await
    }

    async fn query(
        &self,
        collection: &str,
        filter: &EqualityFilter,
        sort: &SortSpec,
    ) -> StoreResult<Vec<StoredDocument>> {
        let filter_path = field_path(&filter.field)?;
        let sort_path = field_path(&sort.field)?;
        let filter_value = to_sql_value(&filter.field, &filter.value)?;
        let direction = match sort.direction {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        };
        let collection = collection.to_string();

        run_blocking(&self.conn, move |conn| {
            let sql = format!(
                "SELECT id, payload
                 FROM documents
                 WHERE collection = ?1
                   AND json_extract(payload, ?2) = ?3
                 ORDER BY json_extract(payload, ?4) {direction}, id ASC;"
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params![collection, filter_path, filter_value, sort_path])?;
            let mut documents = Vec::new();
            while let Some(row) = rows.next()? {
                documents.push(parse_document_row(&collection, row)?);
            }
            Ok(documents)
        })
        .await
    }

    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> StoreResult<Option<StoredDocument>> {
        let collection = collection.to_string();
        let id = id.to_string();
        run_blocking(&self.conn, move |conn| find_document(conn, &collection, &id)).await
    }
}

fn find_document(
    conn: &Connection,
    collection: &str,
    id: &str,
) -> StoreResult<Option<StoredDocument>> {
    let mut stmt = conn.prepare(
        "SELECT id, payload
         FROM documents
         WHERE collection = ?1
           AND id = ?2;",
    )?;
    let row = stmt
        .query_row(params![collection, id], |row| {
            Ok((row.get::<_, String>("id")?, row.get::<_, String>("payload")?))
        })
        .optional()?;

    row.map(|(id, body)| decode_payload(collection, id, &body))
        .transpose()
}

fn parse_document_row(collection: &str, row: &Row<'_>) -> StoreResult<StoredDocument> {
    let id: String = row.get("id")?;
    let body: String = row.get("payload")?;
    decode_payload(collection, id, &body)
}

fn decode_payload(collection: &str, id: String, body: &str) -> StoreResult<StoredDocument> {
    match serde_json::from_str::<Value>(body)? {
        Value::Object(payload) => Ok(StoredDocument { id, payload }),
        _ => Err(StoreError::InvalidPayload {
            collection: collection.to_string(),
            id,
        }),
    }
}

/// Maps a JSON scalar to the SQL value `json_extract` yields for it.
fn to_sql_value(field: &str, value: &Value) -> StoreResult<SqlValue> {
    match value {
        Value::String(text) => Ok(SqlValue::Text(text.clone())),
        Value::Bool(flag) => Ok(SqlValue::Integer(i64::from(*flag))),
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                Ok(SqlValue::Integer(int))
            } else if let Some(float) = number.as_f64() {
                Ok(SqlValue::Real(float))
            } else {
                Err(StoreError::UnsupportedFilterValue(field.to_string()))
            }
        }
        Value::Null | Value::Array(_) | Value::Object(_) => {
            Err(StoreError::UnsupportedFilterValue(field.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteDocumentStore;
    use crate::db::{open_db_in_memory, share_connection};
    use crate::store::{DocumentStore, EqualityFilter, SortSpec, StoreError};
    use serde_json::{json, Value};

    fn store() -> SqliteDocumentStore {
        let conn = open_db_in_memory().expect("in-memory db should open");
        SqliteDocumentStore::new(share_connection(conn))
    }

    fn object(value: Value) -> serde_json::Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[tokio::test]
    async fn add_then_get_returns_same_payload() {
        let store = store();
        let payload = object(json!({"owner": "u1", "rank": 3}));
        let id = store
            .add_document("things", payload.clone())
            .await
            .expect("add should succeed");
        assert!(!id.is_empty());

        let loaded = store
            .get_document("things", &id)
            .await
            .expect("get should succeed")
            .expect("document should exist");
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.payload, payload);
    }

    #[tokio::test]
    async fn get_is_scoped_to_collection() {
        let store = store();
        let id = store
            .add_document("things", object(json!({"owner": "u1"})))
            .await
            .expect("add should succeed");

        let other = store
            .get_document("other", &id)
            .await
            .expect("get should succeed");
        assert!(other.is_none());
    }

    #[tokio::test]
    async fn query_filters_and_sorts_numerically() {
        let store = store();
        for (owner, rank) in [("u1", 2), ("u2", 9), ("u1", 10), ("u1", 1)] {
            store
                .add_document("things", object(json!({"owner": owner, "rank": rank})))
                .await
                .expect("add should succeed");
        }

        let docs = store
            .query(
                "things",
                &EqualityFilter::new("owner", "u1"),
                &SortSpec::descending("rank"),
            )
            .await
            .expect("query should succeed");
        let ranks: Vec<i64> = docs
            .iter()
            .map(|doc| doc.payload["rank"].as_i64().expect("rank is integer"))
            .collect();
        assert_eq!(ranks, vec![10, 2, 1]);

        let ascending = store
            .query(
                "things",
                &EqualityFilter::new("owner", "u1"),
                &SortSpec::ascending("rank"),
            )
            .await
            .expect("query should succeed");
        assert_eq!(ascending.first().map(|doc| &doc.payload["rank"]), Some(&json!(1)));
    }

    #[tokio::test]
    async fn query_rejects_unsafe_field_names() {
        let store = store();
        let err = store
            .query(
                "things",
                &EqualityFilter::new("owner') OR 1=1 --", "u1"),
                &SortSpec::descending("rank"),
            )
            .await
            .expect_err("unsafe field must be rejected");
        assert!(matches!(err, StoreError::InvalidField(_)));
    }

    #[tokio::test]
    async fn query_rejects_structured_filter_values() {
        let store = store();
        let err = store
            .query(
                "things",
                &EqualityFilter::new("owner", json!({"nested": true})),
                &SortSpec::descending("rank"),
            )
            .await
            .expect_err("object filter must be rejected");
        assert!(matches!(err, StoreError::UnsupportedFilterValue(_)));
    }
}
