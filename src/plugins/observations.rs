//! Observation files: one observer's coded observations for one video.
//!
//! ```text
//! observer: Jane Doe
//! source: colony/day1.mp4
//! obs: entry=a1 kind=binary name=alert time=12.5 value=True
//! ```

use crate::core::error::TinbergenError;
use crate::core::ethogram::{Ethogram, Observation};
use crate::core::keyvals;
use crate::core::output;
use crate::plugins::RunContext;
use crate::plugins::ethogram::load_ethogram_file;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[clap(name = "obs", about = "Read, validate and extend observation files")]
pub struct ObsCli {
    #[clap(subcommand)]
    pub command: ObsCommand,
}

#[derive(Subcommand, Debug)]
pub enum ObsCommand {
    /// Report observations that conflict with the ethogram.
    Validate {
        /// Observation file to check.
        file: PathBuf,
        /// Ethogram file (defaults to `ethogram` in tinbergen.toml).
        #[clap(long)]
        ethogram: Option<PathBuf>,
    },
    /// Append a strictly decoded observation, creating the file if needed.
    Add {
        file: PathBuf,
        /// Time of the observation, relative to the video.
        #[clap(long)]
        time: String,
        #[clap(long)]
        ethogram: Option<PathBuf>,
        /// Observer for a new file (defaults to `observer` in tinbergen.toml).
        /// Ignored when the file already exists.
        #[clap(long)]
        observer: Option<String>,
        /// Source video recorded in a new file. Ignored when the file already exists.
        #[clap(long)]
        source: Option<String>,
        /// Entry as typed by the observer, e.g. `a1` or `sym6 4`.
        #[clap(required = true, num_args = 1.., allow_hyphen_values = true)]
        entry: Vec<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ObservationSet {
    pub observer: String,
    pub source: String,
    pub observations: Vec<Observation>,
}

/// An observation that failed [`Ethogram::validate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conflict {
    pub index: usize,
    pub entry: Option<String>,
    pub fields: Vec<String>,
}

impl ObservationSet {
    pub fn new(observer: impl Into<String>, source: impl Into<String>) -> Self {
        ObservationSet {
            observer: observer.into(),
            source: source.into(),
            observations: Vec::new(),
        }
    }

    /// Parse an observation file. Blank lines, comments and unknown tags are
    /// skipped; a malformed `obs:` line is an error naming its line number.
    pub fn parse(text: &str) -> Result<Self, TinbergenError> {
        let mut set = ObservationSet::default();
        for (idx, line) in text.lines().enumerate() {
            let (tag, rest) = keyvals::split_statement(line);
            match tag {
                "observer" => set.observer = rest.to_string(),
                "source" | "obs_source" => set.source = rest.to_string(),
                "obs" => {
                    let obs = Observation::from_keyvals(rest)
                        .map_err(|e| TinbergenError::at_line(idx + 1, e))?;
                    set.observations.push(obs);
                }
                "" => {}
                other if other.starts_with('#') => {}
                other => debug!(line = idx + 1, tag = other, "skipping unknown tag"),
            }
        }
        Ok(set)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        if !self.observer.is_empty() {
            out.push_str(&format!("observer: {}\n", self.observer));
        }
        if !self.source.is_empty() {
            out.push_str(&format!("source: {}\n", self.source));
        }
        for obs in &self.observations {
            out.push_str(&format!("obs: {}\n", obs.to_keyvals()));
        }
        out
    }

    /// Build an observation from `entry` with [`Ethogram::get_prototype`],
    /// stamp it with `time`, and append it.
    pub fn add_observation(
        &mut self,
        ethogram: &Ethogram,
        time: &str,
        entry: &str,
    ) -> Result<&Observation, TinbergenError> {
        let mut obs = ethogram.get_prototype(entry)?;
        obs.insert("time", time);
        self.observations.push(obs);
        Ok(&self.observations[self.observations.len() - 1])
    }

    pub fn conflicts(&self, ethogram: &Ethogram) -> Vec<Conflict> {
        self.observations
            .iter()
            .enumerate()
            .filter_map(|(index, obs)| {
                let fields = ethogram.validate(obs);
                (!fields.is_empty()).then(|| Conflict {
                    index,
                    entry: obs.entry().map(str::to_string),
                    fields,
                })
            })
            .collect()
    }
}

fn read_set(path: &Path) -> Result<ObservationSet, TinbergenError> {
    let content = fs::read_to_string(path).map_err(TinbergenError::IoError)?;
    ObservationSet::parse(&content)
}

pub fn run_obs_cli(ctx: &RunContext, cli: ObsCli) -> Result<(), TinbergenError> {
    match cli.command {
        ObsCommand::Validate { file, ethogram } => {
            let ethogram = load_ethogram_file(&ctx.ethogram_path(ethogram)?)?;
            let set = read_set(&file)?;
            let conflicts = set.conflicts(&ethogram);
            info!(
                file = %file.display(),
                total = set.observations.len(),
                conflicts = conflicts.len(),
                "validated observation file"
            );
            ctx.emit(
                "obs.validate",
                conflicts.is_empty(),
                serde_json::json!({
                    "file": file,
                    "total": set.observations.len(),
                    "conflicts": conflicts,
                }),
                || {
                    let mut lines = vec![format!(
                        "{} {} ({} observations, {} conflicting)",
                        output::status_word(conflicts.is_empty()),
                        file.display(),
                        set.observations.len(),
                        conflicts.len()
                    )];
                    for c in &conflicts {
                        lines.push(format!(
                            "  #{} {} -> {}",
                            c.index,
                            output::compact_line(c.entry.as_deref().unwrap_or("-"), 40),
                            c.fields.join(",")
                        ));
                    }
                    lines.join("\n")
                },
            );
            if !conflicts.is_empty() {
                for c in &conflicts {
                    warn!(index = c.index, fields = ?c.fields, "observation conflicts with ethogram");
                }
                return Err(TinbergenError::ValidationError(format!(
                    "{} of {} observations in {} conflict with the ethogram",
                    conflicts.len(),
                    set.observations.len(),
                    file.display()
                )));
            }
        }
        ObsCommand::Add {
            file,
            time,
            ethogram,
            observer,
            source,
            entry,
        } => {
            let ethogram = load_ethogram_file(&ctx.ethogram_path(ethogram)?)?;
            let mut set = if file.exists() {
                if observer.is_some() || source.is_some() {
                    warn!(
                        file = %file.display(),
                        "--observer/--source ignored: they only apply to new files"
                    );
                }
                read_set(&file)?
            } else {
                let observer = observer
                    .or_else(|| ctx.config.observer.clone())
                    .unwrap_or_default();
                ObservationSet::new(observer, source.unwrap_or_default())
            };
            let entry = entry.join(" ");
            let line = set.add_observation(&ethogram, &time, &entry)?.to_keyvals();
            fs::write(&file, set.render()).map_err(TinbergenError::IoError)?;
            info!(file = %file.display(), entry = %entry, "appended observation");
            ctx.emit(
                "obs.add",
                true,
                serde_json::json!({
                    "file": file,
                    "observation": set.observations.last(),
                }),
                || format!("obs: {}", line),
            );
        }
    }
    Ok(())
}
