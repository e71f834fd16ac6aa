//! Metadata serialization benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use glyph_bytecode::{serialize, MetadataImage, SerializeOptions};
use glyph_link::{Linker, ProgramDecl};
use glyph_types::Program;
use serde_json::{json, Value};

fn program(packages: usize, classes: usize) -> Program {
    let packages: Vec<Value> = (0..packages)
        .map(|p| {
            let items: Vec<Value> = (0..classes)
                .map(|c| {
                    json!({
                        "kind": "class",
                        "name": format!("C{p}_{c}"),
                        "methods": (0..8).map(|m| json!({
                            "name": format!("m{m}"),
                            "arguments": [{ "name": "x", "type": { "name": "🚂" } }],
                            "returns": { "name": "🚂", "optional": true },
                            "body": { "kind": "code", "locals": 2, "code": vec![0u8; 64], "literals": [format!("s{m}")] }
                        })).collect::<Vec<_>>()
                    })
                })
                .collect();
            json!({ "name": format!("p{p}"), "items": items })
        })
        .chain(std::iter::once(json!({ "name": "_", "items": [
            { "kind": "class", "name": "Main", "type_methods": [{ "name": "🏁", "returns": { "name": "🚂" } }] }
        ] })))
        .collect();
    let decl: ProgramDecl =
        serde_json::from_value(json!({ "packages": packages })).expect("benchmark program");
    Linker::new().link(&decl).expect("link").program
}

fn bench_serialize(c: &mut Criterion) {
    let program = program(16, 32);
    let options = SerializeOptions::default();
    let bytes = serialize(&program, &options).expect("serialize");

    let mut group = c.benchmark_group("metadata");
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("serialize", |b| {
        b.iter(|| serialize(black_box(&program), &options).expect("serialize"))
    });
    group.bench_function("decode", |b| {
        b.iter(|| MetadataImage::decode(black_box(&bytes)).expect("decode"))
    });
    group.finish();
}

criterion_group!(benches, bench_serialize);
criterion_main!(benches);
