//! Use-case API over `eleot_core` for UI and CLI callers.

pub mod api;
pub mod config;
pub mod context;

pub use api::{ObservationActionResponse, ObservationDetailResponse, ObservationListResponse};
pub use config::AppConfig;
pub use context::{AppContext, BootstrapError};
