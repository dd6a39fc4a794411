//! Errors raised while loading configuration

use std::path::PathBuf;
use thiserror::Error;

/// Failures while loading [`Settings`](crate::config::Settings).
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid environment override: {0}")]
    Env(#[from] config::ConfigError),
}

pub type SettingsResult<T> = Result<T, SettingsError>;
