//! Startup-time configuration errors
//!
//! Runtime degradation (missing spawn points, empty weapon slots) is logged and
//! short-circuited instead; only loading and validating a config can fail.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate upgrade id '{0}'")]
    DuplicateUpgradeId(String),
    #[error("upgrade entry has an empty id")]
    EmptyUpgradeId,
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}
