//! Benchmarks for window chunking over strings, files and many sources.

use std::io::Write;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use kiru::{Chunker, Source};

fn sample_text(size: usize) -> String {
    // Mixed ASCII and multi-byte text so character chunking has work to do
    let sentences = [
        "The quick brown fox jumps over the lazy dog. ",
        "Pack my box with five dozen liquor jugs. ",
        "Größenwahn überall, schöne Grüße. ",
        "日本語の文章もあります。",
        "Sphinx of black quartz, judge my vow. ",
    ];
    let mut text = String::with_capacity(size + 64);
    let mut i = 0;
    while text.len() < size {
        text.push_str(sentences[i % sentences.len()]);
        i += 1;
    }
    text
}

fn drain(iter: impl Iterator<Item = kiru::Result<kiru::Chunk>>) -> usize {
    iter.map(|c| c.map_or(0, |c| c.byte_len())).sum()
}

fn bench_on_string(c: &mut Criterion) {
    let mut group = c.benchmark_group("on_string");

    for size in [10_000, 100_000, 1_000_000] {
        let text: std::sync::Arc<str> = sample_text(size).into();
        group.throughput(Throughput::Bytes(text.len() as u64));

        let bytes = Chunker::by_bytes(1024, 128).unwrap();
        group.bench_with_input(BenchmarkId::new("bytes", size), &text, |b, text| {
            b.iter(|| drain(bytes.on_string(black_box(text.clone()))))
        });

        let chars = Chunker::by_characters(1024, 128).unwrap();
        group.bench_with_input(BenchmarkId::new("characters", size), &text, |b, text| {
            b.iter(|| drain(chars.on_string(black_box(text.clone()))))
        });
    }

    group.finish();
}

fn bench_on_file(c: &mut Criterion) {
    let mut group = c.benchmark_group("on_file");

    let size = 4_000_000;
    let text = sample_text(size);
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file.flush().unwrap();
    group.throughput(Throughput::Bytes(text.len() as u64));

    for (name, chunker) in [
        ("bytes", Chunker::by_bytes(4096, 256).unwrap()),
        ("characters", Chunker::by_characters(4096, 256).unwrap()),
    ] {
        group.bench_function(BenchmarkId::new(name, size), |b| {
            b.iter(|| drain(chunker.on_file(black_box(file.path()))))
        });
    }

    group.finish();
}

fn bench_on_sources_par(c: &mut Criterion) {
    let mut group = c.benchmark_group("on_sources_par");

    let sources: Vec<Source> = (0..16).map(|_| Source::text(sample_text(250_000))).collect();
    let total: usize = 16 * sample_text(250_000).len();
    group.throughput(Throughput::Bytes(total as u64));

    for workers in [1, 4] {
        let chunker = Chunker::by_characters(1024, 128)
            .unwrap()
            .with_max_workers(workers)
            .unwrap();
        group.bench_with_input(BenchmarkId::new("workers", workers), &sources, |b, sources| {
            b.iter(|| {
                chunker
                    .on_sources_par(sources.clone(), 1024)
                    .unwrap()
                    .filter_map(Result::ok)
                    .count()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_on_string, bench_on_file, bench_on_sources_par);
criterion_main!(benches);
