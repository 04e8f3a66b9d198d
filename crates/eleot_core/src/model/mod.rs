//! Observation domain model.
//!
//! # Responsibility
//! - Define the observation record read back from the document store.
//! - Describe the ELEOT rubric used by opt-in payload validation.
//!
//! # Invariants
//! - Observation ids come from the store and are never reassigned.
//! - Timestamps are UTC instants with millisecond precision.

pub mod observation;
pub mod rubric;
