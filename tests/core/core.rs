use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use tinbergen::core::document::{Node, PathSegment};
use tinbergen::core::error::TinbergenError;
use tinbergen::core::ethogram::{Ethogram, Observation};
use tinbergen::core::hierarchy;
use tinbergen::core::keyvals::{self, FieldValue, Record};
use tinbergen::core::nameset::NameSet;
use tinbergen::core::template::ObservationPrototypeTemplate;

const PLAY: &str = include_str!("../fixtures/play.tbethogram");

fn play() -> Ethogram {
    Ethogram::new_from_lines(PLAY.lines()).expect("fixture ethogram loads")
}

fn record(pairs: &[(&str, FieldValue)]) -> Record {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn obs(pairs: &[(&str, &str)]) -> Observation {
    let mut o = Observation::new();
    for (k, v) in pairs {
        o.insert(*k, *v);
    }
    o
}

#[test]
fn escaped_comma_is_scalar_unescaped_comma_is_tuple() {
    let scalar = record(&[("value", FieldValue::from("a,b"))]);
    assert_eq!(keyvals::encode(&scalar), r"value=a\,b");
    assert_eq!(keyvals::decode(r"value=a\,b").unwrap(), scalar);

    let tuple = keyvals::decode("value=a,b").unwrap();
    assert_eq!(tuple["value"], FieldValue::from(vec!["a", "b"]));
}

#[test]
fn observation_lines_survive_encode_decode() {
    let original = record(&[
        ("entry", FieldValue::from("p sit")),
        ("name", FieldValue::from("posture")),
        ("note", FieldValue::from(r#"said "hi", left = early\"#)),
        ("pair", FieldValue::from(vec!["M 1", "F,2"])),
        ("single", FieldValue::from(vec!["only"])),
        ("blank", FieldValue::from("")),
    ]);
    let line = keyvals::encode(&original);
    assert_eq!(keyvals::decode(&line).unwrap(), original);
}

#[test]
fn malformed_text_is_a_parse_error() {
    for bad in ["a=1 stray", r#"a="open"#, "=v", "a=x\\"] {
        assert!(
            matches!(keyvals::decode(bad), Err(TinbergenError::ParseError { .. })),
            "expected parse error for {:?}",
            bad
        );
    }
}

#[test]
fn code_symbol_with_whitespace_is_rejected() {
    let mut e = play();
    let err = e
        .add_code("bad sym", "approach", None, Record::new())
        .unwrap_err();
    assert!(matches!(err, TinbergenError::LookupError(_)));
}

#[test]
fn code_for_unknown_behavior_is_rejected() {
    let mut e = play();
    assert!(matches!(
        e.add_code("z", "ghost", None, Record::new()),
        Err(TinbergenError::LookupError(_))
    ));
}

#[test]
fn state_values_are_validated() {
    let mut e = Ethogram::default();
    e.add_behavior("state", "posture", Some(NameSet::from_iter(["sit", "stand"])))
        .unwrap();
    assert!(
        e.validate(&obs(&[("name", "posture"), ("kind", "state"), ("value", "sit")]))
            .is_empty()
    );
    assert_eq!(
        e.validate(&obs(&[("name", "posture"), ("kind", "state"), ("value", "run")])),
        vec!["value"]
    );
    assert_eq!(
        e.validate(&obs(&[("name", "posture"), ("kind", "moment"), ("value", "run")])),
        vec!["kind", "value"]
    );
    assert_eq!(e.validate(&obs(&[("name", "nothing")])), vec!["name"]);
}

#[test]
fn strict_prototype_for_binary_code() {
    let e = play();
    let o = e.get_prototype("a1").unwrap();
    assert_eq!(o.name(), Some("alert"));
    assert_eq!(o.kind(), Some("binary"));
    assert_eq!(o.value(), Some("True"));
    assert_eq!(o.entry(), Some("a1"));
    assert!(e.validate(&o).is_empty());
}

#[test]
fn strict_prototype_rejects_unknown_and_invalid() {
    let e = play();
    assert!(matches!(
        e.get_prototype("unknownSym 1 2"),
        Err(TinbergenError::LookupError(_))
    ));
    let err = e.get_prototype("p run").unwrap_err();
    assert!(matches!(&err, TinbergenError::ValidationError(m) if m.contains("value")));
}

#[test]
fn lenient_parse_never_fails() {
    let e = play();
    let unknown = e.parse_entry("unknownSym 1 2");
    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown.entry(), Some("unknownSym 1 2"));

    let invalid = e.parse_entry("p run");
    assert_eq!(invalid.value(), Some("run"));
    assert_eq!(e.validate(&invalid), vec!["value"]);

    assert_eq!(e.parse_entry("").entry(), Some(""));
}

#[test]
fn positional_args_zip_against_parameter_names() {
    let e = play();
    let o = e.parse_entry("d 4 m extra");
    assert_eq!(o.get("value"), Some(&FieldValue::from("4")));
    assert_eq!(o.get("unit"), Some(&FieldValue::from("m")));
    assert_eq!(o.len(), 5);

    let short = e.parse_entry("d 4");
    assert_eq!(short.get("unit"), None);
}

#[test]
fn template_expands_supplied_variables_only() {
    let t = ObservationPrototypeTemplate::new(
        serde_json::from_str(r#"{"event": "approach", "actor": "=who"}"#).unwrap(),
    );
    let mut args = BTreeMap::new();
    args.insert("who".to_string(), Node::text("A"));
    assert_eq!(
        t.make_obs(&args),
        serde_json::from_str::<Node>(r#"{"event": "approach", "actor": "A"}"#).unwrap()
    );
    assert_eq!(
        t.make_obs(&BTreeMap::new()),
        serde_json::from_str::<Node>(r#"{"event": "approach", "actor": "=who"}"#).unwrap()
    );
}

#[test]
fn hierarchy_get_and_set_follow_paths() {
    let mut root: Node = serde_json::from_str(r#"{"a": [{"b": 1}, {"b": 2}]}"#).unwrap();
    let path = vec![
        PathSegment::from("a"),
        PathSegment::from(1usize),
        PathSegment::from("b"),
    ];
    assert_eq!(
        hierarchy::get(&root, &path).unwrap(),
        &serde_json::from_str::<Node>("2").unwrap()
    );
    hierarchy::set(&mut root, &path, Node::text("two")).unwrap();
    assert_eq!(hierarchy::get(&root, &path).unwrap(), &Node::text("two"));

    let missing = vec![PathSegment::from("a"), PathSegment::from(5usize), PathSegment::from("b")];
    assert!(matches!(
        hierarchy::set(&mut root, &missing, Node::Null),
        Err(TinbergenError::LookupError(_))
    ));
    assert!(hierarchy::set(&mut root, &[], Node::Null).is_err());
}

#[test]
fn nameset_keeps_single_strings_whole() {
    let set = NameSet::from("sit");
    assert_eq!(set.len(), 1);
    assert!(set.contains("sit"));
    assert!(!set.contains("s"));

    let numbers: NameSet = [1, 2, 2].into_iter().collect();
    assert_eq!(numbers.len(), 2);
    assert!(numbers.contains("2"));
}

#[test]
fn loaded_ethogram_is_shared_read_only_across_threads() {
    let e = Arc::new(play());
    let handles: Vec<_> = ["s1", "s2", "a0", "a1"]
        .into_iter()
        .map(|entry| {
            let e = Arc::clone(&e);
            thread::spawn(move || e.get_prototype(entry).map(|o| e.validate(&o)))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), Vec::<String>::new());
    }
}

#[test]
fn definition_errors_report_line_numbers() {
    let lines = [
        "name: Broken",
        "behavior: kind=moment name=approach",
        "code: symbol=ap name=approch",
    ];
    let err = Ethogram::new_from_lines(lines).unwrap_err();
    assert!(matches!(err, TinbergenError::DefinitionError { line: 3, .. }));
    assert!(matches!(err.root_cause(), TinbergenError::LookupError(_)));
}
