//! Observation use-case service.
//!
//! # Responsibility
//! - Provide save/list/get entry points for presentation callers.
//! - Offer opt-in ELEOT rubric validation before saving.
//!
//! # Invariants
//! - `save_observation` never validates; existing callers keep working with
//!   arbitrary payloads.
//! - Repository errors pass through unchanged.

use crate::model::observation::{Observation, ObservationData, ObservationId};
use crate::model::rubric::{environment_averages, parse_scores, LearningEnvironment, RubricError};
use crate::repo::observation_repo::{ObservationRepository, RepoError, RepoResult};
use log::warn;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObservationServiceError {
    #[error("observation rubric is invalid: {0}")]
    InvalidRubric(#[from] RubricError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Observation service facade over a repository implementation.
pub struct ObservationService<R: ObservationRepository> {
    repo: R,
}

impl<R: ObservationRepository> ObservationService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Saves an observation payload as-is and returns its store id.
    pub async fn save_observation(
        &self,
        user_id: &str,
        data: ObservationData,
    ) -> RepoResult<ObservationId> {
        self.repo.create(user_id, data).await
    }

    /// Saves an observation after checking its `scores` against the rubric.
    pub async fn save_validated_observation(
        &self,
        user_id: &str,
        data: ObservationData,
    ) -> Result<ObservationId, ObservationServiceError> {
        if let Err(err) = parse_scores(&data) {
            warn!("event=observation_validate module=service status=rejected error={err}");
            return Err(err.into());
        }
        Ok(self.repo.create(user_id, data).await?)
    }

    /// Lists a user's observations, newest first.
    pub async fn list_observations(&self, user_id: &str) -> RepoResult<Vec<Observation>> {
        self.repo.list_by_user(user_id).await
    }

    pub async fn get_observation(&self, observation_id: &str) -> RepoResult<Option<Observation>> {
        self.repo.get_by_id(observation_id).await
    }
}

/// Mean rubric rating per learning environment for one record.
pub fn environment_summary(
    record: &Observation,
) -> Result<BTreeMap<LearningEnvironment, f64>, RubricError> {
    let ratings = parse_scores(&record.data)?;
    Ok(environment_averages(&ratings))
}
