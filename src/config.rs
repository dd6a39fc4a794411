//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/scenetree/scenetree.toml`
//! 3. Local config: an explicit TOML file passed by the caller
//! 4. Environment variables: `SCENETREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::errors::{SettingsError, SettingsResult};

/// Default prefix for environment overrides.
pub const ENV_PREFIX: &str = "SCENETREE";

/// Tunables for a [`NodeTree`](crate::domain::NodeTree).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Initial node capacity of the arena
    pub arena_capacity: usize,
    /// Report commits that flushed no scene keys (empty mapping) to the store
    pub report_clean_commits: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            arena_capacity: 16,
            report_clean_commits: true,
        }
    }
}

/// Raw settings for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub arena_capacity: Option<usize>,
    pub report_clean_commits: Option<bool>,
}

/// Get the XDG config directory for scenetree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "scenetree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("scenetree.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> SettingsResult<RawSettings> {
    let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl Settings {
    /// Overlay wins wherever it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            arena_capacity: overlay.arena_capacity.unwrap_or(self.arena_capacity),
            report_clean_commits: overlay
                .report_clean_commits
                .unwrap_or(self.report_clean_commits),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local` - Optional TOML file applied on top of the global config
    pub fn load(local: Option<&Path>) -> SettingsResult<Self> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        Self::load_layers(current, local, ENV_PREFIX)
    }

    /// Like [`Settings::load`] but without the global config and with a
    /// caller-chosen environment prefix.
    pub fn load_with_prefix(local: Option<&Path>, env_prefix: &str) -> SettingsResult<Self> {
        Self::load_layers(Self::default(), local, env_prefix)
    }

    #[instrument(level = "debug")]
    fn load_layers(base: Self, local: Option<&Path>, env_prefix: &str) -> SettingsResult<Self> {
        let mut current = base;

        if let Some(path) = local {
            if path.exists() {
                current = current.merge_with(&load_raw_settings(path)?);
            } else {
                debug!(path = %path.display(), "local config not found, skipping");
            }
        }

        current = Self::apply_env_overrides(current, env_prefix)?;
        debug!(?current, "settings loaded");
        Ok(current)
    }

    /// Apply `<PREFIX>_*` environment variables as explicit overrides.
    fn apply_env_overrides(settings: Self, env_prefix: &str) -> SettingsResult<Self> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix(env_prefix)
                    .prefix_separator("_")
                    .try_parsing(true),
            )
            .build()?;

        let overlay = RawSettings {
            arena_capacity: match config.get_int("arena_capacity") {
                Ok(val) => Some(usize::try_from(val).map_err(|_| {
                    config::ConfigError::Message(format!(
                        "arena_capacity must be non-negative, got {}",
                        val
                    ))
                })?),
                Err(config::ConfigError::NotFound(_)) => None,
                Err(e) => return Err(e.into()),
            },
            report_clean_commits: match config.get_bool("report_clean_commits") {
                Ok(val) => Some(val),
                Err(config::ConfigError::NotFound(_)) => None,
                Err(e) => return Err(e.into()),
            },
        };
        Ok(settings.merge_with(&overlay))
    }
}
