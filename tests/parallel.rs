//! Concurrent chunking: equivalence, isolation, backpressure, cancellation.

use std::collections::BTreeMap;
use std::fs;
use std::thread;
use std::time::{Duration, Instant};

use kiru::{Chunk, Chunker, ErrorKind, Source, SourceChunk, SourceId};

type Grouped = BTreeMap<SourceId, Vec<Chunk>>;

fn group<I>(items: I) -> (Grouped, usize)
where
    I: IntoIterator<Item = Result<SourceChunk, kiru::SourceFailure>>,
{
    let mut grouped = Grouped::new();
    let mut failures = 0;
    for item in items {
        match item {
            Ok(tagged) => grouped.entry(tagged.id).or_default().push(tagged.chunk),
            Err(_) => failures += 1,
        }
    }
    (grouped, failures)
}

fn corpus(dir: &std::path::Path) -> Vec<Source> {
    for (name, body) in [
        ("a.txt", "alpha beta gamma delta ".repeat(40)),
        ("b.txt", "日本語のテキスト。".repeat(30)),
        ("c.txt", String::new()),
    ] {
        fs::write(dir.join(name), body).unwrap();
    }
    fs::write(dir.join("solo.md"), "x".repeat(333)).unwrap();

    vec![
        Source::text("The quick brown fox jumps over the lazy dog."),
        Source::parse(&format!("glob://{}/*.txt", dir.display())),
        Source::file(dir.join("solo.md")),
        Source::text(""),
        Source::text("Ünïcödé ".repeat(100)),
    ]
}

#[test]
fn parallel_matches_sequential() {
    let dir = tempfile::tempdir().unwrap();
    let sources = corpus(dir.path());

    for chunker in [
        Chunker::by_bytes(17, 4).unwrap(),
        Chunker::by_characters(13, 5).unwrap(),
    ] {
        let (expected, none) = group(chunker.on_sources(sources.clone()));
        assert_eq!(none, 0);

        for workers in [1, 3, 8] {
            for depth in [0, 1, 4, 64] {
                let chunker = chunker.clone().with_max_workers(workers).unwrap();
                let (got, failures) =
                    group(chunker.on_sources_par(sources.clone(), depth).unwrap());
                assert_eq!(failures, 0);
                assert_eq!(got, expected, "workers {workers}, depth {depth}");
            }
        }
    }
}

#[test]
fn failing_source_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("ok.txt"), "abcdefghijkl").unwrap();

    let chunker = Chunker::by_bytes(4, 0).unwrap().with_max_workers(2).unwrap();
    let items: Vec<_> = chunker
        .on_sources_par(
            [
                Source::file(dir.path().join("ok.txt")),
                Source::file(dir.path().join("missing.txt")),
                Source::text("mnop"),
            ],
            2,
        )
        .unwrap()
        .collect();

    let failures: Vec<_> = items.iter().filter_map(|i| i.as_ref().err()).collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].id, SourceId { input: 1, member: 0 });
    assert_eq!(failures[0].error.kind(), ErrorKind::SourceResolution);

    let (grouped, _) = group(items);
    assert_eq!(grouped[&SourceId { input: 0, member: 0 }].len(), 3);
    assert_eq!(grouped[&SourceId { input: 2, member: 0 }].len(), 1);
}

#[test]
fn queue_is_bounded() {
    let chunker = Chunker::by_bytes(8, 0).unwrap().with_max_workers(4).unwrap();
    let sources: Vec<Source> = (0..4).map(|_| Source::text("z".repeat(10_000))).collect();

    for depth in [0, 1, 5] {
        let mut chunks = chunker.on_sources_par(sources.clone(), depth).unwrap();
        thread::sleep(Duration::from_millis(100));
        assert!(chunks.buffered() <= depth, "depth {depth}: {}", chunks.buffered());

        assert!(chunks.next().is_some());
        thread::sleep(Duration::from_millis(20));
        assert!(chunks.buffered() <= depth);
    }
}

#[test]
fn dropping_early_stops_workers() {
    let chunker = Chunker::by_characters(10, 2)
        .unwrap()
        .with_max_workers(4)
        .unwrap();
    let sources: Vec<Source> = (0..8).map(|_| Source::text("ab".repeat(500_000))).collect();

    let mut chunks = chunker.on_sources_par(sources, 1).unwrap();
    let taken: Vec<_> = chunks.by_ref().take(3).collect();
    assert_eq!(taken.len(), 3);

    let started = Instant::now();
    drop(chunks);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn close_joins_workers() {
    let chunker = Chunker::by_bytes(2, 0).unwrap();
    let mut chunks = chunker
        .on_sources_par([Source::text("x".repeat(100_000))], 0)
        .unwrap();
    assert!(chunks.next().is_some());
    chunks.close();
}

#[test]
fn empty_glob_yields_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let chunker = Chunker::by_bytes(4, 0).unwrap();
    let chunks = chunker
        .on_sources_par([format!("glob://{}/*.none", dir.path().display())], 4)
        .unwrap();
    assert_eq!(chunks.workers(), 0);
    assert_eq!(chunks.count(), 0);
}

#[test]
fn workers_never_exceed_sources() {
    let chunker = Chunker::by_bytes(4, 0).unwrap().with_max_workers(16).unwrap();
    let chunks = chunker
        .on_sources_par([Source::text("abcd"), Source::text("efgh")], 4)
        .unwrap();
    assert_eq!(chunks.workers(), 2);
    assert_eq!(chunks.count(), 2);
}
