//! Extension settings relay.
//!
//! # Responsibility
//! - Answer the four settings requests sent by the extension UI surface.
//! - Seed default settings on first activation.
//!
//! # Invariants
//! - Recognized requests always yield a deferred response future; anything
//!   else yields no future and touches no storage.
//! - Storage faults become response values, never errors.
//! - Setting values (the API key in particular) are never logged.
//!
//! The API key is kept in plain text in local storage. Nothing here encrypts
//! or access-controls it.

use futures::future::{self, BoxFuture, FutureExt};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

mod storage;

pub use storage::{KeyValueStorage, SqliteKeyValueStorage, StorageFault};

pub const API_KEY_KEY: &str = "apiKey";
pub const API_ENDPOINT_KEY: &str = "apiEndpoint";
pub const DEFAULT_API_KEY: &str = "";
pub const DEFAULT_API_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Raw message shape received from the extension channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayMessage {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_endpoint: Option<String>,
}

impl RelayMessage {
    pub fn action(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Self::default()
        }
    }
}

/// Recognized relay requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayRequest {
    GetApiKey,
    SetApiKey(String),
    GetApiEndpoint,
    SetApiEndpoint(String),
}

impl RelayRequest {
    /// Maps a message to a request; `None` for unrecognized actions.
    ///
    /// A set request without its value field stores an empty string.
    pub fn from_message(message: &RelayMessage) -> Option<Self> {
        match message.action.as_str() {
            "getApiKey" => Some(Self::GetApiKey),
            "setApiKey" => Some(Self::SetApiKey(
                message.api_key.clone().unwrap_or_default(),
            )),
            "getApiEndpoint" => Some(Self::GetApiEndpoint),
            "setApiEndpoint" => Some(Self::SetApiEndpoint(
                message.api_endpoint.clone().unwrap_or_default(),
            )),
            _ => None,
        }
    }

    /// Maps a raw JSON message to a request.
    ///
    /// Recognition depends on `action` alone; `None` means the message is not
    /// for this relay. Only set requests read their value field. A missing
    /// or `null` value means an empty string, any other non-string value is
    /// an error.
    pub fn from_json(message: &Value) -> Option<Result<Self, RelayInputError>> {
        let action = message.get("action")?.as_str()?;
        let value_of = |field: &'static str| match message.get(field) {
            None | Some(Value::Null) => Ok(String::new()),
            Some(Value::String(value)) => Ok(value.clone()),
            Some(_) => Err(RelayInputError::NonStringValue { field }),
        };
        let request = match action {
            "getApiKey" => Ok(Self::GetApiKey),
            "setApiKey" => value_of(API_KEY_KEY).map(Self::SetApiKey),
            "getApiEndpoint" => Ok(Self::GetApiEndpoint),
            "setApiEndpoint" => value_of(API_ENDPOINT_KEY).map(Self::SetApiEndpoint),
            _ => return None,
        };
        Some(request)
    }

    /// Wire name of the action, used in log events.
    pub fn action(&self) -> &'static str {
        match self {
            Self::GetApiKey => "getApiKey",
            Self::SetApiKey(_) => "setApiKey",
            Self::GetApiEndpoint => "getApiEndpoint",
            Self::SetApiEndpoint(_) => "setApiEndpoint",
        }
    }
}

/// A recognized request whose value field cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayInputError {
    #[error("`{field}` must be a string")]
    NonStringValue { field: &'static str },
}

/// Response sent back over the channel.
///
/// Serializes to `{"apiKey": ..}`, `{"apiEndpoint": ..}` or `{"success": ..}`,
/// each with an `error` string when storage failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RelayResponse {
    ApiKey {
        #[serde(rename = "apiKey")]
        api_key: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    ApiEndpoint {
        #[serde(rename = "apiEndpoint")]
        api_endpoint: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Ack {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl RelayResponse {
    fn acknowledged() -> Self {
        Self::Ack {
            success: true,
            error: None,
        }
    }

    fn rejected(fault: &StorageFault) -> Self {
        Self::Ack {
            success: false,
            error: Some(fault.to_string()),
        }
    }

    fn invalid(err: &RelayInputError) -> Self {
        Self::Ack {
            success: false,
            error: Some(err.to_string()),
        }
    }

    /// Whether the request completed without a fault.
    pub fn is_ok(&self) -> bool {
        match self {
            Self::ApiKey { error, .. } | Self::ApiEndpoint { error, .. } => error.is_none(),
            Self::Ack { success, .. } => *success,
        }
    }
}

/// Relay between the extension message channel and key/value storage.
pub struct SettingsRelay<K> {
    storage: K,
}

impl<K: KeyValueStorage> SettingsRelay<K> {
    pub fn new(storage: K) -> Self {
        Self { storage }
    }

    /// Seeds both settings with defaults when absent. Existing values are
    /// kept.
    pub async fn on_installed(&self) -> Result<(), StorageFault> {
        let existing = self.storage.get(&[API_KEY_KEY, API_ENDPOINT_KEY]).await?;
        let missing: BTreeMap<String, String> = [
            (API_KEY_KEY, DEFAULT_API_KEY),
            (API_ENDPOINT_KEY, DEFAULT_API_ENDPOINT),
        ]
        .into_iter()
        .filter(|(key, _)| !existing.contains_key(*key))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

        let seeded = missing.len();
        if seeded > 0 {
            self.storage.set(missing).await?;
        }
        info!("event=relay_install module=relay status=ok seeded={seeded}");
        Ok(())
    }

    /// Routes one channel message.
    ///
    /// Returns the pending response for recognized requests, or `None` when
    /// the message is not addressed to this relay.
    pub fn dispatch(&self, message: &RelayMessage) -> Option<BoxFuture<'_, RelayResponse>> {
        let request = RelayRequest::from_message(message)?;
        Some(self.handle(request).boxed())
    }

    /// Like [`Self::dispatch`] for a raw JSON message.
    ///
    /// Every recognized action gets a pending response. A set request with
    /// a non-string value answers `{success:false, error}` without touching
    /// storage.
    pub fn dispatch_json(&self, message: &Value) -> Option<BoxFuture<'_, RelayResponse>> {
        match RelayRequest::from_json(message)? {
            Ok(request) => Some(self.handle(request).boxed()),
            Err(err) => {
                warn!("event=relay_request module=relay status=rejected error={err}");
                Some(future::ready(RelayResponse::invalid(&err)).boxed())
            }
        }
    }

    /// Executes one typed request against storage.
    pub async fn handle(&self, request: RelayRequest) -> RelayResponse {
        let action = request.action();
        let response = match request {
            RelayRequest::GetApiKey => match self.read(API_KEY_KEY, DEFAULT_API_KEY).await {
                Ok(value) => RelayResponse::ApiKey {
                    api_key: Some(value),
                    error: None,
                },
                Err(fault) => RelayResponse::ApiKey {
                    api_key: None,
                    error: Some(fault.to_string()),
                },
            },
            RelayRequest::GetApiEndpoint => {
                match self.read(API_ENDPOINT_KEY, DEFAULT_API_ENDPOINT).await {
                    Ok(value) => RelayResponse::ApiEndpoint {
                        api_endpoint: Some(value),
                        error: None,
                    },
                    Err(fault) => RelayResponse::ApiEndpoint {
                        api_endpoint: None,
                        error: Some(fault.to_string()),
                    },
                }
            }
            RelayRequest::SetApiKey(value) => self.write(API_KEY_KEY, value).await,
            RelayRequest::SetApiEndpoint(value) => self.write(API_ENDPOINT_KEY, value).await,
        };

        if response.is_ok() {
            info!("event=relay_request module=relay status=ok action={action}");
        } else {
            error!("event=relay_request module=relay status=error action={action}");
        }
        response
    }

    async fn read(&self, key: &'static str, default: &str) -> Result<String, StorageFault> {
        let mut values = self.storage.get(&[key]).await?;
        Ok(values.remove(key).unwrap_or_else(|| default.to_string()))
    }

    async fn write(&self, key: &'static str, value: String) -> RelayResponse {
        match self
            .storage
            .set(BTreeMap::from([(key.to_string(), value)]))
            .await
        {
            Ok(()) => RelayResponse::acknowledged(),
            Err(fault) => RelayResponse::rejected(&fault),
        }
    }
}
