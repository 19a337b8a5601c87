use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::collections::BTreeMap;
use tinbergen::core::document::Node;
use tinbergen::core::ethogram::Ethogram;
use tinbergen::core::keyvals::{self, FieldValue, Record};
use tinbergen::core::template::ObservationPrototypeTemplate;

fn observation(fields: usize) -> Record {
    let mut record = Record::new();
    record.insert("entry".into(), FieldValue::from("p sit now"));
    record.insert("pair".into(), FieldValue::from(vec!["M 1", "F,2"]));
    for i in 0..fields {
        record.insert(format!("field_{}", i), FieldValue::from(format!("value {} = {}", i, i)));
    }
    record
}

fn bench_keyvals(c: &mut Criterion) {
    let mut group = c.benchmark_group("keyvals");
    for fields in [4, 32] {
        let record = observation(fields);
        let line = keyvals::encode(&record);
        group.bench_with_input(BenchmarkId::new("encode", fields), &record, |b, r| {
            b.iter(|| keyvals::encode(black_box(r)))
        });
        group.bench_with_input(BenchmarkId::new("decode", fields), &line, |b, l| {
            b.iter(|| keyvals::decode(black_box(l)).unwrap())
        });
    }
    group.finish();
}

fn bench_entries(c: &mut Criterion) {
    let ethogram = Ethogram::new_from_lines(
        include_str!("../tests/fixtures/play.tbethogram").lines(),
    )
    .unwrap();
    let mut group = c.benchmark_group("entries");
    group.bench_function("parse_entry", |b| {
        b.iter(|| ethogram.parse_entry(black_box("d 4 m")))
    });
    group.bench_function("get_prototype", |b| {
        b.iter(|| ethogram.get_prototype(black_box("p stand")).unwrap())
    });
    group.finish();
}

fn bench_template(c: &mut Criterion) {
    let document: Node = serde_json::from_str(
        r#"{"interaction": "groom",
            "roles": {"giver": "=g", "receiver": "=r"},
            "trail": [{"who": "=g"}, {"who": "=r"}, {"who": "=g"}],
            "fixed": [1, 2, 3]}"#,
    )
    .unwrap();
    let template = ObservationPrototypeTemplate::new(document);
    let args: BTreeMap<String, Node> = [("g", "M1"), ("r", "F2")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), Node::text(v)))
        .collect();
    c.bench_function("template/make_obs", |b| {
        b.iter(|| template.make_obs(black_box(&args)))
    });
}

criterion_group!(benches, bench_keyvals, bench_entries, bench_template);
criterion_main!(benches);
