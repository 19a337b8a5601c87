//! Command plugins. Each module owns its clap types and a `run_*_cli` entry.

pub mod codec;
pub mod ethogram;
pub mod observations;

use crate::core::config::{OutputFormat, TinbergenConfig};
use crate::core::error::TinbergenError;
use crate::core::output;
use serde_json::Value as JsonValue;
use std::path::PathBuf;

/// Settings resolved once in [`crate::run`] and handed to every plugin.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub config: TinbergenConfig,
    pub format: OutputFormat,
}

impl RunContext {
    /// The ethogram named on the command line, else the configured default.
    pub fn ethogram_path(&self, flag: Option<PathBuf>) -> Result<PathBuf, TinbergenError> {
        flag.or_else(|| self.config.ethogram.clone()).ok_or_else(|| {
            TinbergenError::ConfigError(
                "no ethogram given: pass --ethogram or set `ethogram` in tinbergen.toml"
                    .to_string(),
            )
        })
    }

    /// Print a command result in the selected format. `text` is only rendered
    /// for text output.
    pub fn emit(&self, cmd: &str, ok: bool, body: JsonValue, text: impl FnOnce() -> String) {
        match self.format {
            OutputFormat::Json => {
                let status = if ok { "ok" } else { "conflict" };
                println!("{:#}", output::envelope(cmd, status, body));
            }
            OutputFormat::Text => println!("{}", text()),
        }
    }
}
