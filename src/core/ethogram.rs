//! Ethogram registry: behaviors, the codes observers type for them, and the
//! observations decoded from those codes.
//!
//! Definitions are loaded once (`add_behavior`, `add_code`, `new_from_lines`) and
//! the registry is read-only afterwards. Registering a name or symbol twice
//! replaces the earlier entry.
//!
//! Entry strings are decoded two ways:
//!
//! - [`Ethogram::parse_entry`] is lenient. Unknown symbols and invalid values
//!   still produce an observation so legacy or partial records can be shown.
//! - [`Ethogram::get_prototype`] is strict. The symbol must be registered and the
//!   result must pass [`Ethogram::validate`].

use crate::core::document::Node;
use crate::core::error::TinbergenError;
use crate::core::keyvals::{self, FieldValue, Record};
use crate::core::nameset::NameSet;
use crate::core::template::ObservationPrototypeTemplate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

pub const BINARY_VALUES: [&str; 2] = ["True", "False"];

/// Code fields that never flow into observations as extras.
pub const RESERVED_CODE_KEYS: [&str; 3] = ["symbol", "name", "args"];

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BehaviorKind {
    /// Instantaneous, negligible duration.
    Moment,
    /// One of a set of mutually exclusive values is always in effect.
    State,
    /// Either occurring or not; values are always `True`/`False`.
    Binary,
    /// A tracked quantity that changes over time.
    Variable,
}

impl BehaviorKind {
    pub const ALL: [BehaviorKind; 4] = [
        BehaviorKind::Moment,
        BehaviorKind::State,
        BehaviorKind::Binary,
        BehaviorKind::Variable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorKind::Moment => "moment",
            BehaviorKind::State => "state",
            BehaviorKind::Binary => "binary",
            BehaviorKind::Variable => "variable",
        }
    }
}

impl FromStr for BehaviorKind {
    type Err = TinbergenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BehaviorKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| {
                TinbergenError::ValidationError(format!(
                    "invalid observation kind '{}': expected one of moment, state, binary, variable",
                    s
                ))
            })
    }
}

impl fmt::Display for BehaviorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Behavior {
    name: String,
    kind: BehaviorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    values: Option<NameSet>,
}

impl Behavior {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> BehaviorKind {
        self.kind
    }

    /// Permitted values; present only for state and binary behaviors.
    pub fn values(&self) -> Option<&NameSet> {
        self.values.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Moment,
    Interval,
}

impl FromStr for InteractionKind {
    type Err = TinbergenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "moment" => Ok(InteractionKind::Moment),
            "interval" => Ok(InteractionKind::Interval),
            other => Err(TinbergenError::ValidationError(format!(
                "invalid interaction kind '{}': expected moment or interval",
                other
            ))),
        }
    }
}

/// A behavior between several participants, each filling a named role.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interaction {
    name: String,
    kind: InteractionKind,
    roles: Vec<String>,
}

impl Interaction {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> InteractionKind {
        self.kind
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Code {
    symbol: String,
    name: String,
    args: Option<Vec<String>>,
    extra: Record,
    template: Option<ObservationPrototypeTemplate>,
}

impl Code {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Name of the behavior this code records.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter names filled, in order, by an entry's positional arguments.
    pub fn args(&self) -> &[String] {
        self.args.as_deref().unwrap_or_default()
    }

    pub fn has_args(&self) -> bool {
        self.args.is_some()
    }

    /// Fixed fields copied into every observation built from this code.
    pub fn extra(&self) -> &Record {
        &self.extra
    }

    pub fn template(&self) -> Option<&ObservationPrototypeTemplate> {
        self.template.as_ref()
    }

    /// Expand this code's template with positional values bound to `args` by name.
    pub fn make_obs(&self, positional: Vec<Node>) -> Result<Node, TinbergenError> {
        let template = self.template.as_ref().ok_or_else(|| {
            TinbergenError::LookupError(format!(
                "code '{}' has no observation template",
                self.symbol
            ))
        })?;
        let bound: BTreeMap<String, Node> = self
            .args()
            .iter()
            .cloned()
            .zip(positional)
            .collect();
        Ok(template.make_obs(&bound))
    }
}

/// One recorded observation: string keys mapped to strings or string tuples.
///
/// Conventional keys are `entry`, `name`, `kind`, `value` and `time`; any other
/// key is allowed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Observation(Record);

impl Observation {
    pub fn new() -> Self {
        Observation::default()
    }

    pub fn from_keyvals(text: &str) -> Result<Self, TinbergenError> {
        keyvals::decode(text).map(Observation)
    }

    pub fn to_keyvals(&self) -> String {
        keyvals::encode(&self.0)
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    fn scalar(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(FieldValue::as_scalar)
    }

    pub fn entry(&self) -> Option<&str> {
        self.scalar("entry")
    }

    pub fn name(&self) -> Option<&str> {
        self.scalar("name")
    }

    pub fn kind(&self) -> Option<&str> {
        self.scalar("kind")
    }

    pub fn value(&self) -> Option<&str> {
        self.scalar("value")
    }

    pub fn time(&self) -> Option<&str> {
        self.scalar("time")
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &Record {
        &self.0
    }

    pub fn into_record(self) -> Record {
        self.0
    }

    fn insert_missing(&mut self, key: &str, value: FieldValue) {
        self.0.entry(key.to_string()).or_insert(value);
    }
}

impl From<Record> for Observation {
    fn from(record: Record) -> Self {
        Observation(record)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Ethogram {
    name: String,
    description: String,
    behaviors: BTreeMap<String, Behavior>,
    codes: BTreeMap<String, Code>,
    interactions: BTreeMap<String, Interaction>,
}

impl Ethogram {
    pub fn new(name: impl Into<String>) -> Self {
        Ethogram {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn behaviors(&self) -> &BTreeMap<String, Behavior> {
        &self.behaviors
    }

    pub fn behavior(&self, name: &str) -> Option<&Behavior> {
        self.behaviors.get(name)
    }

    pub fn codes(&self) -> &BTreeMap<String, Code> {
        &self.codes
    }

    pub fn code(&self, symbol: &str) -> Option<&Code> {
        self.codes.get(symbol)
    }

    pub fn interactions(&self) -> &BTreeMap<String, Interaction> {
        &self.interactions
    }

    pub fn interaction(&self, name: &str) -> Option<&Interaction> {
        self.interactions.get(name)
    }

    /// Register a behavior. `values` is required for `state`, replaced by
    /// `{True, False}` for `binary`, and dropped for other kinds.
    pub fn add_behavior(
        &mut self,
        kind: &str,
        name: &str,
        values: Option<NameSet>,
    ) -> Result<(), TinbergenError> {
        let kind = BehaviorKind::from_str(kind)?;
        let values = match kind {
            BehaviorKind::State => match values {
                Some(v) if !v.is_empty() => Some(v),
                _ => {
                    return Err(TinbergenError::ValidationError(format!(
                        "state behavior '{}' requires a non-empty values list",
                        name
                    )));
                }
            },
            BehaviorKind::Binary => Some(BINARY_VALUES.into_iter().collect()),
            BehaviorKind::Moment | BehaviorKind::Variable => None,
        };
        self.behaviors.insert(
            name.to_string(),
            Behavior {
                name: name.to_string(),
                kind,
                values,
            },
        );
        Ok(())
    }

    pub fn add_interaction(
        &mut self,
        name: &str,
        kind: &str,
        roles: Vec<String>,
    ) -> Result<(), TinbergenError> {
        let kind = InteractionKind::from_str(kind)?;
        if roles.is_empty() {
            return Err(TinbergenError::ValidationError(format!(
                "interaction '{}' requires at least one role",
                name
            )));
        }
        self.interactions.insert(
            name.to_string(),
            Interaction {
                name: name.to_string(),
                kind,
                roles,
            },
        );
        Ok(())
    }

    /// Register a code for the behavior `name`. Reserved keys in `extra` are dropped.
    pub fn add_code(
        &mut self,
        symbol: &str,
        name: &str,
        args: Option<Vec<String>>,
        extra: Record,
    ) -> Result<(), TinbergenError> {
        self.register_code(symbol, name, args, extra, None)
    }

    /// Register a code that also materializes documents from `template`.
    pub fn add_template_code(
        &mut self,
        symbol: &str,
        name: &str,
        args: Option<Vec<String>>,
        extra: Record,
        template: ObservationPrototypeTemplate,
    ) -> Result<(), TinbergenError> {
        self.register_code(symbol, name, args, extra, Some(template))
    }

    fn register_code(
        &mut self,
        symbol: &str,
        name: &str,
        args: Option<Vec<String>>,
        mut extra: Record,
        template: Option<ObservationPrototypeTemplate>,
    ) -> Result<(), TinbergenError> {
        if symbol.is_empty() {
            return Err(TinbergenError::LookupError(
                "code symbol cannot be empty".to_string(),
            ));
        }
        if WHITESPACE.is_match(symbol) {
            return Err(TinbergenError::LookupError(format!(
                "code symbol {:?} cannot contain whitespace",
                symbol
            )));
        }
        if !self.behaviors.contains_key(name) {
            return Err(TinbergenError::LookupError(format!(
                "code '{}' maps to unknown behavior '{}'",
                symbol, name
            )));
        }
        for key in RESERVED_CODE_KEYS {
            extra.remove(key);
        }
        self.codes.insert(
            symbol.to_string(),
            Code {
                symbol: symbol.to_string(),
                name: name.to_string(),
                args,
                extra,
                template,
            },
        );
        Ok(())
    }

    /// Lenient decode of `symbol arg1 arg2 ...`.
    ///
    /// Unknown or missing symbols yield `{entry}` alone. Otherwise fields are
    /// merged with earlier sources winning: the entry text, the behavior's name
    /// and kind, the code's extra fields, then positional arguments zipped
    /// against the code's parameter names. Nothing is validated.
    pub fn parse_entry(&self, entry: &str) -> Observation {
        let mut items = entry.split_whitespace();
        let code = items.next().and_then(|symbol| self.codes.get(symbol));
        match code {
            Some(code) => self.assemble(entry, code, items.collect()),
            None => {
                let mut obs = Observation::new();
                obs.insert("entry", entry);
                obs
            }
        }
    }

    /// Strict decode for freshly created observations: the symbol must be
    /// registered and the observation must validate.
    pub fn get_prototype(&self, entry: &str) -> Result<Observation, TinbergenError> {
        let mut items = entry.split_whitespace();
        let symbol = items.next().ok_or_else(|| {
            TinbergenError::LookupError("entry is empty; expected a code symbol".to_string())
        })?;
        let code = self.codes.get(symbol).ok_or_else(|| {
            TinbergenError::LookupError(format!("unknown code symbol '{}'", symbol))
        })?;
        let obs = self.assemble(entry, code, items.collect());
        if let Some(field) = self.validate(&obs).first() {
            return Err(TinbergenError::ValidationError(format!(
                "entry '{}' conflicts with behavior '{}' on field '{}'",
                entry,
                code.name(),
                field
            )));
        }
        Ok(obs)
    }

    /// Fields of `obs` that conflict with the ethogram; empty when valid.
    ///
    /// An unknown behavior name short-circuits to `["name"]`. Otherwise `kind`
    /// is reported before `value`.
    pub fn validate(&self, obs: &Observation) -> Vec<String> {
        let Some(behavior) = obs.name().and_then(|n| self.behaviors.get(n)) else {
            return vec!["name".to_string()];
        };
        let mut conflicts = Vec::new();
        if obs.kind() != Some(behavior.kind().as_str()) {
            conflicts.push("kind".to_string());
        }
        if let Some(values) = behavior.values() {
            if !obs.value().is_some_and(|v| values.contains(v)) {
                conflicts.push("value".to_string());
            }
        }
        conflicts
    }

    /// Expand the template of the code named by `entry`'s symbol, binding the
    /// entry's positional arguments as text.
    pub fn materialize(&self, entry: &str) -> Result<Node, TinbergenError> {
        let mut items = entry.split_whitespace();
        let symbol = items.next().ok_or_else(|| {
            TinbergenError::LookupError("entry is empty; expected a code symbol".to_string())
        })?;
        let code = self.codes.get(symbol).ok_or_else(|| {
            TinbergenError::LookupError(format!("unknown code symbol '{}'", symbol))
        })?;
        code.make_obs(items.map(Node::text).collect())
    }

    fn assemble(&self, entry: &str, code: &Code, positional: Vec<&str>) -> Observation {
        let mut obs = Observation::new();
        obs.insert("entry", entry);
        if let Some(behavior) = self.behaviors.get(code.name()) {
            obs.insert_missing("name", behavior.name().into());
            obs.insert_missing("kind", behavior.kind().as_str().into());
        }
        for (key, value) in code.extra() {
            obs.insert_missing(key, value.clone());
        }
        for (param, arg) in code.args().iter().zip(positional) {
            obs.insert_missing(param, arg.into());
        }
        obs
    }

    /// Build an ethogram from definition lines:
    ///
    /// ```text
    /// name: Example
    /// behavior: kind=state name=posture values=sit,stand
    /// code: symbol=s1 name=posture value=sit
    /// ```
    ///
    /// Comment lines (tag starting with `#`) and unknown tags are skipped.
    /// Errors carry the 1-based line number.
    pub fn new_from_lines<I, S>(lines: I) -> Result<Ethogram, TinbergenError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ethogram = Ethogram::default();
        for (idx, line) in lines.into_iter().enumerate() {
            let (tag, rest) = keyvals::split_statement(line.as_ref());
            if tag.starts_with('#') {
                continue;
            }
            let loaded = match tag {
                "name" => {
                    ethogram.name = rest.to_string();
                    Ok(())
                }
                "behavior" => ethogram.load_behavior(rest),
                "code" => ethogram.load_code(rest),
                _ => Ok(()),
            };
            loaded.map_err(|e| TinbergenError::at_line(idx + 1, e))?;
        }
        Ok(ethogram)
    }

    fn load_behavior(&mut self, text: &str) -> Result<(), TinbergenError> {
        let record = keyvals::decode(text)?;
        let kind = required_scalar(&record, "behavior", "kind")?;
        let name = required_scalar(&record, "behavior", "name")?;
        let values = record.get("values").map(NameSet::from);
        self.add_behavior(kind, name, values)
    }

    fn load_code(&mut self, text: &str) -> Result<(), TinbergenError> {
        let mut record = keyvals::decode(text)?;
        let symbol = required_scalar(&record, "code", "symbol")?.to_string();
        let name = required_scalar(&record, "code", "name")?.to_string();
        let args = record.remove("args").map(|v| v.to_list());
        self.add_code(&symbol, &name, args, record)
    }
}

fn required_scalar<'r>(
    record: &'r Record,
    statement: &str,
    key: &str,
) -> Result<&'r str, TinbergenError> {
    match record.get(key) {
        Some(FieldValue::Scalar(s)) => Ok(s.as_str()),
        Some(FieldValue::Tuple(_)) => Err(TinbergenError::ValidationError(format!(
            "{} field '{}' must be a single value",
            statement, key
        ))),
        None => Err(TinbergenError::ValidationError(format!(
            "{} definition is missing '{}'",
            statement, key
        ))),
    }
}
