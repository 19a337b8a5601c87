//! Document-form ethograms (JSON or TOML).
//!
//! ```json
//! {
//!   "name": "Play",
//!   "entries": [
//!     {"event": "approach", "type": "moment"},
//!     {"interaction": "groom", "type": "interval", "roles": ["giver", "receiver"]},
//!     {"code": "ap", "args": ["who"], "obs": {"event": "approach", "actor": "=who"}}
//!   ]
//! }
//! ```
//!
//! Events register first, then interactions, then codes, so a code may refer to
//! an event listed after it. Entries without an `event`, `interaction` or `code`
//! key are skipped; an entry with more than one of them is an error.

use crate::core::document::Node;
use crate::core::error::TinbergenError;
use crate::core::ethogram::Ethogram;
use crate::core::keyvals::{FieldValue, Record};
use crate::core::nameset::NameSet;
use crate::core::template::{ObservationPrototypeTemplate, TemplateType};
use serde::Deserialize;
use std::collections::BTreeMap;

const ENTRY_TAGS: [&str; 3] = ["event", "interaction", "code"];
const CODE_KEYS: [&str; 4] = ["code", "name", "args", "obs"];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EthogramDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub entries: Vec<Node>,
}

impl EthogramDocument {
    pub fn from_json_str(text: &str) -> Result<Self, TinbergenError> {
        serde_json::from_str(text)
            .map_err(|e| TinbergenError::DocumentError(format!("invalid JSON ethogram: {}", e)))
    }

    pub fn from_toml_str(text: &str) -> Result<Self, TinbergenError> {
        toml::from_str(text)
            .map_err(|e| TinbergenError::DocumentError(format!("invalid TOML ethogram: {}", e)))
    }

    /// Register every entry. Errors carry the 1-based entry number as `line`.
    pub fn into_ethogram(self) -> Result<Ethogram, TinbergenError> {
        let mut ethogram = Ethogram::new(self.name);
        ethogram.set_description(self.description);

        let mut events = Vec::new();
        let mut interactions = Vec::new();
        let mut codes = Vec::new();
        for (idx, entry) in self.entries.iter().enumerate() {
            let map = entry.as_map().ok_or_else(|| {
                TinbergenError::at_line(
                    idx + 1,
                    TinbergenError::DocumentError(format!(
                        "entry must be a mapping, found {}",
                        entry.type_name()
                    )),
                )
            })?;
            let tags: Vec<&str> = ENTRY_TAGS
                .into_iter()
                .filter(|tag| map.contains_key(*tag))
                .collect();
            match tags.as_slice() {
                ["event"] => events.push((idx, map)),
                ["interaction"] => interactions.push((idx, map)),
                ["code"] => codes.push((idx, map)),
                [] => {}
                _ => {
                    return Err(TinbergenError::at_line(
                        idx + 1,
                        TinbergenError::DocumentError(format!(
                            "entry has more than one of {}",
                            tags.join(", ")
                        )),
                    ));
                }
            }
        }

        for (idx, map) in events {
            load_event(&mut ethogram, map).map_err(|e| TinbergenError::at_line(idx + 1, e))?;
        }
        for (idx, map) in interactions {
            load_interaction(&mut ethogram, map)
                .map_err(|e| TinbergenError::at_line(idx + 1, e))?;
        }
        for (idx, map) in codes {
            load_code(&mut ethogram, map).map_err(|e| TinbergenError::at_line(idx + 1, e))?;
        }
        Ok(ethogram)
    }
}

fn text<'m>(map: &'m BTreeMap<String, Node>, key: &str) -> Result<&'m str, TinbergenError> {
    match map.get(key) {
        Some(Node::Text(s)) => Ok(s.as_str()),
        Some(other) => Err(TinbergenError::DocumentError(format!(
            "field '{}' must be text, found {}",
            key,
            other.type_name()
        ))),
        None => Err(TinbergenError::ValidationError(format!(
            "entry is missing '{}'",
            key
        ))),
    }
}

fn string_list(node: &Node, key: &str) -> Result<Vec<String>, TinbergenError> {
    let scalars: Option<Vec<String>> = match node {
        Node::List(items) => items.iter().map(Node::scalar_string).collect(),
        other => other.scalar_string().map(|s| vec![s]),
    };
    scalars.ok_or_else(|| {
        TinbergenError::DocumentError(format!("field '{}' must be a list of scalars", key))
    })
}

fn load_event(ethogram: &mut Ethogram, map: &BTreeMap<String, Node>) -> Result<(), TinbergenError> {
    let name = text(map, "event")?;
    let kind = text(map, "type")?;
    let values = map
        .get("values")
        .map(NameSet::try_from)
        .transpose()?;
    ethogram.add_behavior(kind, name, values)
}

fn load_interaction(
    ethogram: &mut Ethogram,
    map: &BTreeMap<String, Node>,
) -> Result<(), TinbergenError> {
    let name = text(map, "interaction")?;
    let kind = text(map, "type")?;
    let roles = match map.get("roles") {
        Some(node) => string_list(node, "roles")?,
        None => Vec::new(),
    };
    ethogram.add_interaction(name, kind, roles)
}

fn load_code(ethogram: &mut Ethogram, map: &BTreeMap<String, Node>) -> Result<(), TinbergenError> {
    let symbol = text(map, "code")?;
    let args = map
        .get("args")
        .map(|node| string_list(node, "args"))
        .transpose()?;

    let mut extra = Record::new();
    for (key, node) in map {
        if CODE_KEYS.contains(&key.as_str()) {
            continue;
        }
        let value = match node {
            Node::List(_) => FieldValue::Tuple(string_list(node, key)?),
            Node::Map(_) => {
                return Err(TinbergenError::DocumentError(format!(
                    "code field '{}' cannot be a mapping",
                    key
                )));
            }
            scalar => FieldValue::Scalar(scalar.scalar_string().unwrap_or_default()),
        };
        extra.insert(key.clone(), value);
    }

    let template = map.get("obs").cloned().map(ObservationPrototypeTemplate::new);
    let name = match (map.contains_key("name"), &template) {
        (true, _) => text(map, "name")?.to_string(),
        (false, Some(t)) => behavior_from_template(t).ok_or_else(|| {
            TinbergenError::ValidationError(format!(
                "code '{}' has no 'name' and its template names no event",
                symbol
            ))
        })?,
        (false, None) => {
            return Err(TinbergenError::ValidationError(format!(
                "code '{}' is missing 'name'",
                symbol
            )));
        }
    };

    match template {
        Some(template) => ethogram.add_template_code(symbol, &name, args, extra, template),
        None => ethogram.add_code(symbol, &name, args, extra),
    }
}

fn behavior_from_template(template: &ObservationPrototypeTemplate) -> Option<String> {
    match template.template_type()? {
        TemplateType::Event | TemplateType::Terminate => {
            template.tag_value()?.as_text().map(str::to_string)
        }
        TemplateType::Interaction => None,
    }
}
