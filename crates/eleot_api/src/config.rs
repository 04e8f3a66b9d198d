//! Process configuration for the use-case API.
//!
//! Values come from the environment:
//! - `ELEOT_DB_PATH`: SQLite file backing the local document store.
//!   Defaults to `eleot.sqlite3` in the system temp directory.
//! - `ELEOT_LOG_LEVEL`: `trace|debug|info|warn|error`. Defaults by build mode.
//! - `ELEOT_LOG_DIR`: absolute directory for rolling logs. Logging stays off
//!   when unset.
//!
//! Blank values fall back to defaults.

use eleot_core::default_log_level;
use mockable::{DefaultEnv, Env};
use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "ELEOT_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "ELEOT_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "ELEOT_LOG_DIR";
const DEFAULT_DB_FILE_NAME: &str = "eleot.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_source(&DefaultEnv::new())
    }

    /// Reads configuration from `env`, one lookup per variable name.
    pub fn from_source<E: Env>(env: &E) -> Self {
        let read = |name: &str| {
            env.string(name)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        Self {
            db_path: read(DB_PATH_VAR).map_or(defaults.db_path, PathBuf::from),
            log_level: read(LOG_LEVEL_VAR).unwrap_or(defaults.log_level),
            log_dir: read(LOG_DIR_VAR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, DB_PATH_VAR, LOG_DIR_VAR, LOG_LEVEL_VAR};
    use mockable::MockEnv;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn mock_env(vars: &[(&str, &str)]) -> MockEnv {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        let mut env = MockEnv::new();
        env.expect_string()
            .times(0..)
            .returning(move |key| vars.get(key).cloned());
        env
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = AppConfig::from_source(&mock_env(&[]));
        assert_eq!(config, AppConfig::default());
        assert!(config.log_dir.is_none());
        assert!(config.db_path.ends_with("eleot.sqlite3"));
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = AppConfig::from_source(&mock_env(&[
            (DB_PATH_VAR, "/var/lib/eleot/data.db"),
            (LOG_LEVEL_VAR, "warn"),
            (LOG_DIR_VAR, " /var/log/eleot "),
        ]));
        assert_eq!(config.db_path, PathBuf::from("/var/lib/eleot/data.db"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir.as_deref(), Some("/var/log/eleot"));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = AppConfig::from_source(&mock_env(&[(DB_PATH_VAR, "   "), (LOG_DIR_VAR, "")]));
        assert_eq!(config.db_path, AppConfig::default().db_path);
        assert!(config.log_dir.is_none());
    }
}
