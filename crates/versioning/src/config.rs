use boardspace_common::IdStrategy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors loading a [`VersioningConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Tunables for a [`crate::VersionStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersioningConfig {
    /// Durable key the collection blob is stored under.
    pub storage_key: String,
    /// Default labels read `"{label_prefix} {n}"`.
    pub label_prefix: String,
    pub id_strategy: IdStrategy,
    /// View-state keys dropped from captured scenes. Empty keeps everything.
    pub prune_view_state: Vec<String>,
    /// How many fresh ids to try before giving up on a collision.
    pub max_id_attempts: u32,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            storage_key: "boardspace.boardVersions".into(),
            label_prefix: "Version".into(),
            id_strategy: IdStrategy::Random,
            prune_view_state: Vec::new(),
            max_id_attempts: 8,
        }
    }
}

impl VersioningConfig {
    /// Parse from YAML. Missing fields take their defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}
