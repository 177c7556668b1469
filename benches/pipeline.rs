//! Benchmarks for the flatten pipeline.

use std::fs;
use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use resflat::rewrite::{keyed, markup};
use resflat::{Flattener, Printer, SourceTree};

fn material_source(textures: usize) -> String {
    let entries: Vec<String> = (0..textures)
        .map(|i| {
            format!(
                r#"{{"samplerName": "sampler{i}", "filename": "textures/set{}/tex{i}.ktx"}}"#,
                i % 7
            )
        })
        .collect();
    format!(
        r#"{{"name": "bench", "useDepthTest": true, "textures": [{}], "lods": [[{{"filename": "a/b/lod.bin"}}]]}}"#,
        entries.join(", ")
    )
}

fn layout_source(buttons: usize) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?>\n<layout>\n");
    for i in 0..buttons {
        out.push_str(&format!(
            "  <button name=\"b{i}\" image=\"icons/set/b{i}.png\" hoverimage=\"icons/hover/b{i}.png\" pressedimage=\"icons/down/b{i}.png\"><label text=\"Button {i}\"/></button>\n"
        ));
    }
    out.push_str("</layout>\n");
    out
}

// -- Rewriter benchmarks --

fn bench_rewriters(c: &mut Criterion) {
    let mut group = c.benchmark_group("rewrite");

    let material = material_source(256);
    let layout = layout_source(256);

    group.bench_function("keyed_256_textures", |b| {
        b.iter(|| keyed::rewrite_document(black_box(material.as_bytes())).unwrap())
    });

    group.bench_function("markup_256_buttons", |b| {
        b.iter(|| markup::rewrite_document(black_box(layout.as_bytes())).unwrap())
    });

    group.finish();
}

// -- End-to-end benchmarks --

fn populate(root: &Path) {
    for dir in 0..8 {
        let sub = root.join(format!("pack{dir}/nested"));
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join(format!("m{dir}.material")), material_source(16)).unwrap();
        fs::write(sub.join(format!("ui{dir}.xml")), layout_source(16)).unwrap();
        fs::write(sub.join(format!("tex{dir}.png")), vec![0u8; 4096]).unwrap();
    }
}

fn bench_flatten(c: &mut Criterion) {
    let source = tempfile::tempdir().unwrap();
    populate(source.path());
    let printer = Printer::new();

    c.bench_function("flatten_24_files", |b| {
        b.iter(|| {
            let dest = tempfile::tempdir().unwrap();
            Flattener::new(dest.path(), &printer)
                .run(&SourceTree::new(source.path()))
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_rewriters, bench_flatten);
criterion_main!(benches);
