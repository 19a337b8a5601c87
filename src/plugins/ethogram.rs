//! `tinbergen ethogram`: load an ethogram and decode entries against it.

use crate::core::error::TinbergenError;
use crate::core::ethogram::Ethogram;
use crate::core::ethogram_doc::EthogramDocument;
use crate::core::output;
use crate::plugins::RunContext;
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[clap(name = "ethogram", about = "Inspect an ethogram and decode entries")]
pub struct EthogramCli {
    /// Ethogram file (defaults to `ethogram` in tinbergen.toml).
    #[clap(long, global = true)]
    pub ethogram: Option<PathBuf>,
    #[clap(subcommand)]
    pub command: EthogramCommand,
}

#[derive(Subcommand, Debug)]
pub enum EthogramCommand {
    /// Load the ethogram and summarize its definitions.
    Check,
    /// Decode entries into observations.
    Entry {
        /// Reject unknown symbols and invalid values instead of reporting them.
        #[clap(long)]
        strict: bool,
        /// Entries such as `a1` or `sym6 4`; quote entries with arguments.
        #[clap(required = true, num_args = 1.., allow_hyphen_values = true)]
        entry: Vec<String>,
    },
    /// Expand template codes into their observation documents.
    Expand {
        #[clap(required = true, num_args = 1.., allow_hyphen_values = true)]
        entry: Vec<String>,
    },
}

/// Load an ethogram by extension: `.json` and `.toml` are document form,
/// anything else is read as definition lines.
pub fn load_ethogram_file(path: &Path) -> Result<Ethogram, TinbergenError> {
    let content = fs::read_to_string(path).map_err(|e| {
        TinbergenError::ConfigError(format!("cannot read ethogram {}: {}", path.display(), e))
    })?;
    let ethogram = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => EthogramDocument::from_json_str(&content)?.into_ethogram()?,
        Some("toml") => EthogramDocument::from_toml_str(&content)?.into_ethogram()?,
        _ => Ethogram::new_from_lines(content.lines())?,
    };
    info!(
        path = %path.display(),
        behaviors = ethogram.behaviors().len(),
        codes = ethogram.codes().len(),
        interactions = ethogram.interactions().len(),
        "loaded ethogram"
    );
    Ok(ethogram)
}

pub fn run_ethogram_cli(ctx: &RunContext, cli: EthogramCli) -> Result<(), TinbergenError> {
    let path = ctx.ethogram_path(cli.ethogram)?;
    let ethogram = load_ethogram_file(&path)?;

    match cli.command {
        EthogramCommand::Check => {
            let behaviors: Vec<_> = ethogram.behaviors().values().collect();
            let interactions: Vec<_> = ethogram.interactions().values().collect();
            let codes: Vec<_> = ethogram
                .codes()
                .values()
                .map(|c| {
                    json!({
                        "symbol": c.symbol(),
                        "name": c.name(),
                        "args": c.args(),
                        "template": c.template().map(|t| t.document()),
                    })
                })
                .collect();
            ctx.emit(
                "ethogram.check",
                true,
                json!({
                    "path": path,
                    "name": ethogram.name(),
                    "description": ethogram.description(),
                    "behaviors": behaviors,
                    "interactions": interactions,
                    "codes": codes,
                }),
                || {
                    let title = if ethogram.name().is_empty() {
                        path.display().to_string()
                    } else {
                        ethogram.name().to_string()
                    };
                    let mut lines = vec![format!(
                        "{} {}: {} behaviors, {} codes, {} interactions",
                        output::status_word(true),
                        title.bold(),
                        ethogram.behaviors().len(),
                        ethogram.codes().len(),
                        ethogram.interactions().len()
                    )];
                    for b in ethogram.behaviors().values() {
                        let values = b.values().map(|v| format!(" {}", v)).unwrap_or_default();
                        lines.push(format!("  {} {}{}", b.kind(), b.name().cyan(), values));
                    }
                    for c in ethogram.codes().values() {
                        lines.push(format!("  {} -> {}", c.symbol().yellow(), c.name()));
                    }
                    lines.join("\n")
                },
            );
        }
        EthogramCommand::Entry { strict, entry } => {
            let mut decoded = Vec::with_capacity(entry.len());
            for text in &entry {
                let obs = if strict {
                    ethogram.get_prototype(text)?
                } else {
                    ethogram.parse_entry(text)
                };
                let conflicts = ethogram.validate(&obs);
                decoded.push((obs, conflicts));
            }
            let ok = decoded.iter().all(|(_, conflicts)| conflicts.is_empty());
            let results: Vec<_> = decoded
                .iter()
                .map(|(obs, conflicts)| json!({ "observation": obs, "conflicts": conflicts }))
                .collect();
            ctx.emit("ethogram.entry", ok, json!({ "results": results }), || {
                decoded
                    .iter()
                    .map(|(obs, conflicts)| {
                        if conflicts.is_empty() {
                            obs.to_keyvals()
                        } else {
                            format!(
                                "{}  {} {}",
                                obs.to_keyvals(),
                                output::status_word(false),
                                conflicts.join(",")
                            )
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            });
        }
        EthogramCommand::Expand { entry } => {
            let documents = entry
                .iter()
                .map(|text| ethogram.materialize(text))
                .collect::<Result<Vec<_>, _>>()?;
            ctx.emit("ethogram.expand", true, json!({ "documents": documents }), || {
                documents
                    .iter()
                    .map(|doc| serde_json::to_string(doc).unwrap_or_default())
                    .collect::<Vec<_>>()
                    .join("\n")
            });
        }
    }
    Ok(())
}
