use crate::core::error::TinbergenError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "tinbergen.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Settings from `tinbergen.toml`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TinbergenConfig {
    /// Default ethogram file, relative to the config file's directory
    #[serde(default)]
    pub ethogram: Option<PathBuf>,
    /// Observer written into newly created observation files
    #[serde(default)]
    pub observer: Option<String>,
    #[serde(default)]
    pub format: Option<OutputFormat>,
}

/// Load `tinbergen.toml` from `dir`. A missing file yields the defaults.
pub fn load_config(dir: &Path) -> Result<TinbergenConfig, TinbergenError> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        debug!(path = %config_path.display(), "no config file, using defaults");
        return Ok(TinbergenConfig::default());
    }
    let content = fs::read_to_string(&config_path).map_err(TinbergenError::IoError)?;
    let mut config: TinbergenConfig = toml::from_str(&content).map_err(|e| {
        TinbergenError::ConfigError(format!("{}: {}", config_path.display(), e))
    })?;
    if let Some(ethogram) = config.ethogram.take() {
        config.ethogram = Some(if ethogram.is_absolute() {
            ethogram
        } else {
            dir.join(ethogram)
        });
    }
    debug!(path = %config_path.display(), ?config, "loaded config");
    Ok(config)
}
