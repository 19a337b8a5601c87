//! Immutable set of names, used for the permitted values of state/binary behaviors.

use crate::core::document::Node;
use crate::core::error::TinbergenError;
use crate::core::keyvals::FieldValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameSet(BTreeSet<String>);

impl NameSet {
    /// One-element set holding the string form of `value`.
    pub fn single(value: impl ToString) -> Self {
        NameSet(BTreeSet::from([value.to_string()]))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<T: ToString> FromIterator<T> for NameSet {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        NameSet(iter.into_iter().map(|s| s.to_string()).collect())
    }
}

impl From<&str> for NameSet {
    fn from(value: &str) -> Self {
        NameSet::single(value)
    }
}

impl From<String> for NameSet {
    fn from(value: String) -> Self {
        NameSet::single(value)
    }
}

impl From<&FieldValue> for NameSet {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Scalar(s) => NameSet::single(s),
            FieldValue::Tuple(items) => items.iter().collect(),
        }
    }
}

/// Names from a document node: a scalar is one name, a list of scalars is one
/// name per element. Null, mappings and nested containers are rejected.
impl TryFrom<&Node> for NameSet {
    type Error = TinbergenError;

    fn try_from(value: &Node) -> Result<Self, Self::Error> {
        fn name(node: &Node) -> Result<String, TinbergenError> {
            match node {
                Node::Null => Err(TinbergenError::DocumentError(
                    "value names cannot be null".to_string(),
                )),
                other => other.scalar_string().ok_or_else(|| {
                    TinbergenError::DocumentError(format!(
                        "value names must be scalars, found {}",
                        other.type_name()
                    ))
                }),
            }
        }
        match value {
            Node::List(items) => items.iter().map(name).collect(),
            other => name(other).map(NameSet::single),
        }
    }
}

impl fmt::Display for NameSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_string_is_not_split_into_chars() {
        let set = NameSet::from("sit");
        assert_eq!(set.len(), 1);
        assert!(set.contains("sit"));
        assert!(!set.contains("s"));
    }

    #[test]
    fn test_iterable_uses_string_form_of_each_element() {
        let set: NameSet = [1, 2, 2, 3].into_iter().collect();
        assert_eq!(set.len(), 3);
        assert!(set.contains("2"));
        assert!(!set.contains("4"));
    }

    #[test]
    fn test_non_iterable_value_becomes_singleton() {
        let set = NameSet::single(42);
        assert!(set.contains("42"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_from_field_value() {
        let tuple = FieldValue::Tuple(vec!["sit".into(), "stand".into()]);
        let set = NameSet::from(&tuple);
        assert!(set.contains("sit") && set.contains("stand"));
        assert_eq!(NameSet::from(&FieldValue::Scalar("a,b".into())).len(), 1);
    }

    #[test]
    fn test_try_from_node_accepts_scalars_and_scalar_lists() {
        let list: Node = serde_json::from_str(r#"["sit", 2, true]"#).unwrap();
        let set = NameSet::try_from(&list).unwrap();
        assert!(set.contains("sit") && set.contains("2") && set.contains("true"));
        assert_eq!(NameSet::try_from(&Node::text("sit")).unwrap().len(), 1);
    }

    #[test]
    fn test_try_from_node_rejects_containers_and_null() {
        for bad in [r#"{"sit": 1}"#, r#"[{"a": 1}]"#, r#"[["b"]]"#, "null", "[null]"] {
            let node: Node = serde_json::from_str(bad).unwrap();
            assert!(
                matches!(NameSet::try_from(&node), Err(TinbergenError::DocumentError(_))),
                "expected rejection of {}",
                bad
            );
        }
    }
}
