//! Rendering helpers shared by the CLI plugins.
//!
//! JSON output is wrapped in a small envelope so every command's result has the
//! same outer shape; text output stays one record per line.

use colored::Colorize;
use serde_json::{Map, Value as JsonValue};
use std::time::{SystemTime, UNIX_EPOCH};
use ulid::Ulid;

pub const ENVELOPE_VERSION: &str = "1.0.0";

/// Unix-epoch seconds with a `Z` suffix, e.g. `1771220592Z`.
pub fn epoch_z() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!("{}Z", secs)
}

/// `{envelope_version, ts, event_id, cmd, status}` plus the fields of `body`.
pub fn envelope(cmd: &str, status: &str, body: JsonValue) -> JsonValue {
    let mut out = Map::new();
    out.insert("envelope_version".into(), ENVELOPE_VERSION.into());
    out.insert("ts".into(), epoch_z().into());
    out.insert("event_id".into(), Ulid::new().to_string().into());
    out.insert("cmd".into(), cmd.into());
    out.insert("status".into(), status.into());
    if let JsonValue::Object(fields) = body {
        out.extend(fields);
    }
    JsonValue::Object(out)
}

pub fn status_word(ok: bool) -> String {
    if ok {
        "ok".green().bold().to_string()
    } else {
        "conflict".red().bold().to_string()
    }
}

/// Collapse whitespace runs and cut to `max_chars`, marking truncation with `...`.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let head: String = collapsed.chars().take(max_chars).collect();
    format!("{}...", head)
}
