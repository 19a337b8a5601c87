//! Tinbergen: ethogram-based behavioral coding.
//!
//! An ethogram is a catalog of behaviors (what can be observed) and codes
//! (the short symbols observers type while watching video). This crate turns
//! those typed entries into structured observations and checks them against
//! the catalog.
//!
//! # Crate Structure
//!
//! - [`core`]: the engine
//!   - [`core::keyvals`]: the `key=value` text codec
//!   - [`core::ethogram`]: behaviors, codes, entry decoding and validation
//!   - [`core::template`]: observation templates with `=name` placeholders
//!   - [`core::hierarchy`]: path access into nested documents
//!   - [`core::nameset`]: permitted-value sets
//! - [`plugins`]: `codec`, `ethogram` and `obs` subcommands
//!
//! # Examples
//!
//! ```bash
//! tinbergen ethogram --ethogram play.tbethogram check
//! tinbergen ethogram entry "sym6 4" a1
//! tinbergen obs add day1.tbobs --time 12.5 a1
//! tinbergen obs validate day1.tbobs
//! ```

pub mod core;
pub mod plugins;

mod cli;

use clap::Parser;
use cli::{Cli, Command};
use crate::core::config::{self, OutputFormat};
use crate::core::error::TinbergenError;
use crate::plugins::{RunContext, codec, ethogram, observations};
use std::path::PathBuf;

pub fn run() -> Result<(), TinbergenError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Version => {
            println!("v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        // Pure text transforms: tinbergen.toml is never read.
        Command::Codec(codec_cli) => {
            let ctx = RunContext {
                format: cli.format.unwrap_or_default(),
                ..RunContext::default()
            };
            codec::run_codec_cli(&ctx, codec_cli)
        }
        Command::Ethogram(ethogram_cli) => {
            let ctx = load_context(cli.config_dir, cli.format)?;
            ethogram::run_ethogram_cli(&ctx, ethogram_cli)
        }
        Command::Obs(obs_cli) => {
            let ctx = load_context(cli.config_dir, cli.format)?;
            observations::run_obs_cli(&ctx, obs_cli)
        }
    }
}

fn load_context(
    config_dir: Option<PathBuf>,
    format: Option<OutputFormat>,
) -> Result<RunContext, TinbergenError> {
    let config_dir = match config_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let config = config::load_config(&config_dir)?;
    let format = format.or(config.format).unwrap_or_default();
    Ok(RunContext { config, format })
}
