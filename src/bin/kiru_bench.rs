//! Throughput benchmark for a single chunking run.
//!
//! ```text
//! kiru-bench chars file corpus.txt 1024 128
//! {"elapsed_secs":0.41,"num_chunks":10240,"total_bytes":11534336,"throughput_mb_s":26.8}
//! ```
//!
//! Failures print `{"error": "..."}` on stderr and exit with status 1.

use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use kiru::{Chunker, Source};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    Bytes,
    Chars,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceType {
    String,
    File,
    Http,
    Glob,
}

#[derive(Parser, Debug)]
#[command(name = "kiru-bench")]
#[command(about = "Measure chunking throughput over one source")]
struct Args {
    /// Unit of size and overlap
    strategy: StrategyArg,

    /// How to interpret PATH
    source_type: SourceType,

    /// Text, file path, URL or glob pattern
    path: String,

    /// Chunk size in units
    chunk_size: usize,

    /// Overlap in units
    overlap: usize,
}

#[derive(Serialize)]
struct BenchResult {
    elapsed_secs: f64,
    num_chunks: usize,
    total_bytes: usize,
    throughput_mb_s: f64,
}

#[derive(Serialize)]
struct BenchError {
    error: String,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => return fail(err.to_string().trim_end()),
    };

    match run(&args) {
        Ok(result) => match serde_json::to_string(&result) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(err) => fail(&err.to_string()),
        },
        Err(err) => fail(&format!("benchmark failed: {err}")),
    }
}

fn fail(message: &str) -> ExitCode {
    let error = BenchError {
        error: message.to_string(),
    };
    match serde_json::to_string(&error) {
        Ok(json) => eprintln!("{json}"),
        Err(_) => eprintln!("{message}"),
    }
    ExitCode::FAILURE
}

fn run(args: &Args) -> Result<BenchResult, Box<dyn std::error::Error>> {
    let chunker = match args.strategy {
        StrategyArg::Bytes => Chunker::by_bytes(args.chunk_size, args.overlap)?,
        StrategyArg::Chars => Chunker::by_characters(args.chunk_size, args.overlap)?,
    };
    let source = match args.source_type {
        SourceType::String => Source::text(args.path.as_str()),
        SourceType::File => Source::file(&args.path),
        SourceType::Http => Source::Remote(args.path.clone()),
        SourceType::Glob => Source::Glob(args.path.clone()),
    };
    debug!(%source, spec = ?chunker.spec(), "starting run");

    let start = Instant::now();
    let mut num_chunks = 0;
    let mut total_bytes = 0;
    for item in chunker.on_sources([source]) {
        let tagged = item.map_err(|failure| failure.error)?;
        num_chunks += 1;
        total_bytes += std::hint::black_box(tagged.chunk.byte_len());
    }
    let elapsed_secs = start.elapsed().as_secs_f64();

    let throughput_mb_s = if elapsed_secs > 0.0 {
        total_bytes as f64 / (1024.0 * 1024.0) / elapsed_secs
    } else {
        0.0
    };
    info!(num_chunks, total_bytes, elapsed_secs, "run finished");

    Ok(BenchResult {
        elapsed_secs,
        num_chunks,
        total_bytes,
        throughput_mb_s,
    })
}
