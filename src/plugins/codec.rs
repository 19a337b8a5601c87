//! `tinbergen codec`: convert between key-value text and JSON records.

use crate::core::error::TinbergenError;
use crate::core::keyvals::{self, Record};
use crate::plugins::RunContext;
use clap::{Parser, Subcommand};
use serde_json::json;

#[derive(Parser, Debug)]
#[clap(name = "codec", about = "Encode and decode key-value records")]
pub struct CodecCli {
    #[clap(subcommand)]
    pub command: CodecCommand,
}

#[derive(Subcommand, Debug)]
pub enum CodecCommand {
    /// Encode a JSON object of strings and string lists, e.g. `{"a": "x y", "b": ["1", "2"]}`.
    Encode { json: String },
    /// Decode key-value text, e.g. `a=x\ y b=1,2`.
    Decode {
        #[clap(allow_hyphen_values = true)]
        text: String,
    },
}

/// Parse the JSON form accepted by `codec encode`.
pub fn record_from_json(text: &str) -> Result<Record, TinbergenError> {
    serde_json::from_str(text).map_err(|e| {
        TinbergenError::DocumentError(format!(
            "expected a JSON object of strings or string lists: {}",
            e
        ))
    })
}

pub fn run_codec_cli(ctx: &RunContext, cli: CodecCli) -> Result<(), TinbergenError> {
    match cli.command {
        CodecCommand::Encode { json } => {
            let record = record_from_json(&json)?;
            let text = keyvals::encode(&record);
            ctx.emit("codec.encode", true, json!({ "text": text }), || text.clone());
        }
        CodecCommand::Decode { text } => {
            let record = keyvals::decode(&text)?;
            let rendered = serde_json::to_string(&record).unwrap_or_default();
            ctx.emit("codec.decode", true, json!({ "record": record }), || rendered);
        }
    }
    Ok(())
}
