use std::fs;
use std::path::Path;

use tempfile::tempdir;
use tinbergen::core::error::TinbergenError;
use tinbergen::core::ethogram::Ethogram;
use tinbergen::plugins::ethogram::load_ethogram_file;
use tinbergen::plugins::observations::{Conflict, ObservationSet};

fn fixture(name: &str) -> Ethogram {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    load_ethogram_file(&path).expect("fixture ethogram loads")
}

#[test]
fn session_written_then_reread_validates_clean() {
    let e = fixture("play.tbethogram");
    let mut set = ObservationSet::new("Jane Doe", "colony/day1.mp4");
    set.add_observation(&e, "0.5", "ap M1").unwrap();
    set.add_observation(&e, "1.0", "s1").unwrap();
    set.add_observation(&e, "2.25", "p lie").unwrap();
    set.add_observation(&e, "3", "d 4 m").unwrap();

    let tmp = tempdir().unwrap();
    let path = tmp.path().join("day1.tbobs");
    fs::write(&path, set.render()).unwrap();

    let reread = ObservationSet::parse(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(reread, set);
    assert!(reread.conflicts(&e).is_empty());
    assert_eq!(reread.observations[0].get("who").unwrap().to_string(), "M1");
}

#[test]
fn hand_edited_observations_are_reported_not_dropped() {
    let e = fixture("play.tbethogram");
    let text = "\
observer: Jane Doe
obs: entry=s1 kind=state name=posture time=1 value=sit
obs: entry=s1 kind=state name=posture time=2 value=fly
obs: entry=zz time=3
obs: entry=a1 kind=moment name=alert time=4 value=maybe
";
    let set = ObservationSet::parse(text).unwrap();
    assert_eq!(set.observations.len(), 4);
    assert_eq!(
        set.conflicts(&e),
        vec![
            Conflict {
                index: 1,
                entry: Some("s1".to_string()),
                fields: vec!["value".to_string()],
            },
            Conflict {
                index: 2,
                entry: Some("zz".to_string()),
                fields: vec!["name".to_string()],
            },
            Conflict {
                index: 3,
                entry: Some("a1".to_string()),
                fields: vec!["kind".to_string(), "value".to_string()],
            },
        ]
    );
}

#[test]
fn strict_add_leaves_set_untouched_on_error() {
    let e = fixture("play.json");
    let mut set = ObservationSet::new("", "");
    assert!(matches!(
        set.add_observation(&e, "1", "nope"),
        Err(TinbergenError::LookupError(_))
    ));
    set.add_observation(&e, "2", "a1").unwrap();
    assert_eq!(set.observations.len(), 1);
    assert_eq!(set.observations[0].value(), Some("True"));
    assert!(set.render().starts_with("obs: "));
}
