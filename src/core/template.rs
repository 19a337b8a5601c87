//! Observation prototype templates with free-variable placeholders.
//!
//! A template is a fixed [`Node`] document in which any text scalar starting with
//! [`FREE_VARIABLE_SIGIL`] names a free variable. Paths to every occurrence are
//! collected once at construction; [`ObservationPrototypeTemplate::make_obs`]
//! then copies the document and writes supplied arguments at those paths.

use crate::core::document::{HierarchyPath, Node, PathSegment};
use crate::core::hierarchy;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub const FREE_VARIABLE_SIGIL: char = '=';

/// Semantic tag of a template, taken from its reserved top-level key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateType {
    Event,
    Terminate,
    Interaction,
}

impl TemplateType {
    pub const ALL: [TemplateType; 3] = [
        TemplateType::Event,
        TemplateType::Terminate,
        TemplateType::Interaction,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            TemplateType::Event => "event",
            TemplateType::Terminate => "terminate",
            TemplateType::Interaction => "interaction",
        }
    }
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObservationPrototypeTemplate {
    document: Node,
    template_type: Option<TemplateType>,
    free_vars: BTreeMap<String, Vec<HierarchyPath>>,
}

impl ObservationPrototypeTemplate {
    pub fn new(document: Node) -> Self {
        let template_type = document.as_map().and_then(|map| {
            TemplateType::ALL
                .into_iter()
                .find(|t| map.contains_key(t.key()))
        });
        let mut free_vars = BTreeMap::new();
        let mut path = Vec::new();
        locate_free_vars(&document, &mut path, &mut free_vars);
        ObservationPrototypeTemplate {
            document,
            template_type,
            free_vars,
        }
    }

    pub fn document(&self) -> &Node {
        &self.document
    }

    pub fn template_type(&self) -> Option<TemplateType> {
        self.template_type
    }

    /// Value under the reserved tag key, e.g. the behavior named by `event`.
    pub fn tag_value(&self) -> Option<&Node> {
        let tag = self.template_type?;
        self.document.as_map()?.get(tag.key())
    }

    pub fn free_variables(&self) -> &BTreeMap<String, Vec<HierarchyPath>> {
        &self.free_vars
    }

    pub fn paths_for(&self, name: &str) -> &[HierarchyPath] {
        self.free_vars.get(name).map_or(&[], Vec::as_slice)
    }

    /// Copy of the template with every supplied free variable written in place.
    ///
    /// Arguments that name no free variable are ignored, and variables with no
    /// argument keep their placeholder text.
    pub fn make_obs(&self, args: &BTreeMap<String, Node>) -> Node {
        let mut obs = self.document.clone();
        for (name, value) in args {
            let Some(paths) = self.free_vars.get(name) else {
                continue;
            };
            for path in paths {
                if path.is_empty() {
                    obs = value.clone();
                    continue;
                }
                // Placeholders are leaves, so earlier writes never detach a later path.
                let written = hierarchy::set(&mut obs, path, value.clone());
                debug_assert!(written.is_ok(), "unresolved free variable path: {written:?}");
            }
        }
        obs
    }
}

fn locate_free_vars(
    node: &Node,
    path: &mut Vec<PathSegment>,
    found: &mut BTreeMap<String, Vec<HierarchyPath>>,
) {
    match node {
        Node::Text(s) => {
            if let Some(name) = s.strip_prefix(FREE_VARIABLE_SIGIL) {
                found.entry(name.to_string()).or_default().push(path.clone());
            }
        }
        Node::List(items) => {
            for (i, item) in items.iter().enumerate() {
                path.push(PathSegment::Index(i));
                locate_free_vars(item, path, found);
                path.pop();
            }
        }
        Node::Map(map) => {
            for (key, child) in map {
                path.push(PathSegment::Key(key.clone()));
                locate_free_vars(child, path, found);
                path.pop();
            }
        }
        Node::Null | Node::Bool(_) | Node::Number(_) => {}
    }
}
