//! Repository layer over the document store.
//!
//! # Responsibility
//! - Translate observation use-cases into document store calls.
//! - Log store faults, then propagate them unchanged.
//!
//! # Invariants
//! - No retries, caching or payload validation happen here.
//! - Missing records are `Ok(None)`, never an error.

pub mod observation_repo;
