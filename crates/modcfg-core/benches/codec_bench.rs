//! Criterion benchmarks for the configuration JSON codec.
//!
//! Measures the save path (serialize + encode) and the load path
//! (decode + deserialize) for a small and a wide configuration.
//!
//! Run with:
//! ```bash
//! cargo bench --package modcfg-core --bench codec_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use modcfg_core::{
    decode_document, encode_document, PropertySchema, RawValue, SectionSchema,
};

// ── Schema fixtures ───────────────────────────────────────────────────────────

fn small_schema() -> SectionSchema {
    SectionSchema::new()
        .property("volume", PropertySchema::float(1.0))
        .property("enabled", PropertySchema::bool(true))
        .property("name", PropertySchema::string("default"))
}

fn wide_schema() -> SectionSchema {
    let mut schema = SectionSchema::new();
    for section in 0..16 {
        let mut inner = SectionSchema::new();
        for field in 0..16 {
            inner = inner.property(format!("field_{field}"), PropertySchema::int(field));
        }
        inner = inner.property(
            "list",
            PropertySchema::array(
                PropertySchema::float(0.0),
                (0..32).map(|i| RawValue::Float(i as f64 * 0.5)).collect(),
            ),
        );
        schema = schema.property(format!("section_{section}"), PropertySchema::section(inner));
    }
    schema
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_save(c: &mut Criterion) {
    let mut group = c.benchmark_group("save");
    for (name, schema) in [("small", small_schema()), ("wide", wide_schema())] {
        let tree = schema.create_value();
        group.bench_with_input(BenchmarkId::from_parameter(name), &tree, |b, tree| {
            b.iter(|| encode_document(black_box(&tree.serialize()), Some("1.0.0")).unwrap())
        });
    }
    group.finish();
}

fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load");
    for (name, schema) in [("small", small_schema()), ("wide", wide_schema())] {
        let text = encode_document(&schema.create_value().serialize(), Some("1.0.0")).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(name), &text, |b, text| {
            b.iter(|| {
                let doc = decode_document(black_box(text)).unwrap();
                let mut tree = schema.create_value();
                tree.deserialize(&doc.values);
                tree
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_save, bench_load);
criterion_main!(benches);
