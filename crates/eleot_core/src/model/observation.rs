//! Observation record.
//!
//! # Invariants
//! - `id` is store-assigned and immutable.
//! - `user_id` is set at creation and never changes.
//! - `data` never carries the reserved keys owned by the record itself.
//!
//! Stored shape: the caller payload with `userId`, `createdAt` and
//! `updatedAt` merged in. Timestamps are stored as integer Unix epoch
//! milliseconds so that sorting on them is numeric.

use chrono::{DateTime, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Store-assigned observation identifier.
pub type ObservationId = String;

/// Open caller-supplied evaluation fields (scores, notes, visit times).
pub type ObservationData = Map<String, Value>;

/// Collection holding observation documents.
pub const OBSERVATIONS_COLLECTION: &str = "observations";

pub const FIELD_ID: &str = "id";
pub const FIELD_USER_ID: &str = "userId";
pub const FIELD_CREATED_AT: &str = "createdAt";
pub const FIELD_UPDATED_AT: &str = "updatedAt";

/// One classroom observation as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub id: ObservationId,
    pub user_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    /// Everything else the caller stored, flattened next to the fixed fields.
    #[serde(flatten)]
    pub data: ObservationData,
}

/// Reasons a stored document cannot be read as an observation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObservationDecodeError {
    #[error("missing or non-string `{0}`")]
    MissingString(&'static str),
    #[error("missing or non-integer `{0}`")]
    MissingTimestamp(&'static str),
    #[error("`{field}` value {millis} is outside the representable range")]
    TimestampOutOfRange { field: &'static str, millis: i64 },
}

impl Observation {
    /// Builds the stored payload for a new observation.
    ///
    /// Record fields are merged last, so caller-supplied `userId`,
    /// `createdAt` or `updatedAt` keys are overwritten and `id` is dropped.
    pub fn new_payload(
        user_id: &str,
        data: ObservationData,
        now: DateTime<Utc>,
    ) -> Map<String, Value> {
        let millis = to_millis_precision(now).timestamp_millis();
        let mut payload = data;
        payload.remove(FIELD_ID);
        payload.insert(FIELD_USER_ID.to_string(), Value::from(user_id));
        payload.insert(FIELD_CREATED_AT.to_string(), Value::from(millis));
        payload.insert(FIELD_UPDATED_AT.to_string(), Value::from(millis));
        payload
    }

    /// Splits a stored payload back into record fields and caller data.
    pub fn from_document(
        id: ObservationId,
        mut payload: Map<String, Value>,
    ) -> Result<Self, ObservationDecodeError> {
        payload.remove(FIELD_ID);
        let user_id = match payload.remove(FIELD_USER_ID) {
            Some(Value::String(value)) => value,
            _ => return Err(ObservationDecodeError::MissingString(FIELD_USER_ID)),
        };
        let created_at = take_timestamp(&mut payload, FIELD_CREATED_AT)?;
        let updated_at = take_timestamp(&mut payload, FIELD_UPDATED_AT)?;

        Ok(Self {
            id,
            user_id,
            created_at,
            updated_at,
            data: payload,
        })
    }
}

/// Truncates an instant to the millisecond precision used in storage.
pub fn to_millis_precision(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.trunc_subsecs(3)
}

fn take_timestamp(
    payload: &mut Map<String, Value>,
    field: &'static str,
) -> Result<DateTime<Utc>, ObservationDecodeError> {
    let millis = payload
        .remove(field)
        .and_then(|value| value.as_i64())
        .ok_or(ObservationDecodeError::MissingTimestamp(field))?;
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or(ObservationDecodeError::TimestampOutOfRange { field, millis })
}
