//! CLI struct definitions for the `tinbergen` command.
//!
//! Subcommand types live with their plugins; dispatch lives in [`crate::run`].

use crate::core::config::OutputFormat;
use crate::plugins::{codec, ethogram, observations};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "tinbergen",
    version = env!("CARGO_PKG_VERSION"),
    about = "Ethogram-based behavioral coding: define behaviors and codes, decode observer entries, validate observation files."
)]
pub(crate) struct Cli {
    /// Output format (overrides `format` in tinbergen.toml).
    #[clap(long, global = true, value_enum)]
    pub format: Option<OutputFormat>,
    /// Directory holding tinbergen.toml (defaults to the current directory).
    #[clap(long, global = true)]
    pub config_dir: Option<PathBuf>,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Encode and decode key-value records
    #[clap(name = "codec")]
    Codec(codec::CodecCli),

    /// Inspect an ethogram and decode entries
    #[clap(name = "ethogram", visible_alias = "e")]
    Ethogram(ethogram::EthogramCli),

    /// Read, validate and extend observation files
    #[clap(name = "obs", visible_alias = "o")]
    Obs(observations::ObsCli),

    /// Show version information
    #[clap(name = "version")]
    Version,
}
