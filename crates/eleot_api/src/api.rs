//! Use-case API for presentation callers.
//!
//! # Responsibility
//! - Expose observation and relay use-cases as response envelopes.
//! - Keep error semantics simple for UI integration.
//!
//! # Invariants
//! - Calls never panic and never return `Err`; failures become envelopes
//!   with `ok=false` and a message.
//! - Envelopes serialize to camelCase JSON.

use crate::context::AppContext;
use eleot_core::{
    environment_summary, LearningEnvironment, Observation, ObservationData,
    ObservationServiceError, RelayResponse, RepoError,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Result of a save call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationActionResponse {
    pub ok: bool,
    /// Store-assigned id of the created observation.
    pub observation_id: Option<String>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

impl ObservationActionResponse {
    fn success(observation_id: String) -> Self {
        Self {
            ok: true,
            observation_id: Some(observation_id),
            message: "Observation saved.".to_string(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            observation_id: None,
            message: message.into(),
        }
    }
}

/// Result of a list call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationListResponse {
    pub ok: bool,
    /// Newest first.
    pub items: Vec<Observation>,
    pub message: String,
}

/// Result of a point lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationDetailResponse {
    pub ok: bool,
    /// `None` with `ok=true` when the observation does not exist.
    pub observation: Option<Observation>,
    /// Mean rating per learning environment, empty without valid `scores`.
    pub environment_averages: BTreeMap<LearningEnvironment, f64>,
    pub message: String,
}

impl AppContext {
    /// Saves an observation payload as-is.
    pub async fn save_observation(&self, user_id: &str, data: Value) -> ObservationActionResponse {
        let data = match into_object(data) {
            Ok(data) => data,
            Err(message) => return ObservationActionResponse::failure(message),
        };
        match self.observations.save_observation(user_id, data).await {
            Ok(id) => ObservationActionResponse::success(id),
            Err(err) => ObservationActionResponse::failure(save_failure_message(&err)),
        }
    }

    /// Saves an observation after checking its rubric scores.
    pub async fn save_validated_observation(
        &self,
        user_id: &str,
        data: Value,
    ) -> ObservationActionResponse {
        let data = match into_object(data) {
            Ok(data) => data,
            Err(message) => return ObservationActionResponse::failure(message),
        };
        match self
            .observations
            .save_validated_observation(user_id, data)
            .await
        {
            Ok(id) => ObservationActionResponse::success(id),
            Err(ObservationServiceError::Repo(err)) => {
                ObservationActionResponse::failure(save_failure_message(&err))
            }
            Err(err) => ObservationActionResponse::failure(err.to_string()),
        }
    }

    /// Lists one user's observations, newest first.
    pub async fn list_observations(&self, user_id: &str) -> ObservationListResponse {
        match self.observations.list_observations(user_id).await {
            Ok(items) => {
                let message = if items.is_empty() {
                    "No observations.".to_string()
                } else {
                    format!("Found {} observation(s).", items.len())
                };
                ObservationListResponse {
                    ok: true,
                    items,
                    message,
                }
            }
            Err(err) => ObservationListResponse {
                ok: false,
                items: Vec::new(),
                message: format!("list_observations failed: {err}"),
            },
        }
    }

    /// Fetches one observation by id.
    pub async fn get_observation(&self, observation_id: &str) -> ObservationDetailResponse {
        match self.observations.get_observation(observation_id).await {
            Ok(Some(observation)) => {
                let environment_averages = environment_summary(&observation).unwrap_or_default();
                ObservationDetailResponse {
                    ok: true,
                    observation: Some(observation),
                    environment_averages,
                    message: "Observation found.".to_string(),
                }
            }
            Ok(None) => ObservationDetailResponse {
                ok: true,
                observation: None,
                environment_averages: BTreeMap::new(),
                message: "Observation not found.".to_string(),
            },
            Err(err) => ObservationDetailResponse {
                ok: false,
                observation: None,
                environment_averages: BTreeMap::new(),
                message: format!("get_observation failed: {err}"),
            },
        }
    }

    /// Passes one extension channel message to the settings relay.
    ///
    /// `None` means the message was not recognized and gets no response.
    pub async fn relay_message(&self, message: &Value) -> Option<RelayResponse> {
        let pending = self.relay.dispatch_json(message)?;
        Some(pending.await)
    }
}

fn into_object(data: Value) -> Result<ObservationData, &'static str> {
    match data {
        Value::Object(map) => Ok(map),
        _ => Err("observation data must be a JSON object"),
    }
}

fn save_failure_message(err: &RepoError) -> String {
    format!("save_observation failed: {err}")
}
