//! # kiru
//!
//! Fast, fixed-size, overlapping text chunking over strings, files, globs, and
//! URLs.
//!
//! ## The Problem
//!
//! Embedding pipelines want uniform windows over text of any length: every
//! chunk the same size, neighbours sharing a little context. The arithmetic is
//! trivial. Doing it over a 10 GB log file, a directory of markdown and a list
//! of URLs at the same time, without loading everything into memory and
//! without one bad URL killing the whole run, is not.
//!
//! ## Windows
//!
//! ```text
//! Content: "ABCDEFGHIJ"   size 4, overlap 1, step 3
//!
//! Chunk 0: "ABCD"  [0..4]
//! Chunk 1: "DEFG"  [3..7]   <- "D" shared with chunk 0
//! Chunk 2: "GHIJ"  [6..10]  <- reaches the end: last chunk
//! ```
//!
//! Chunk `i` starts at `i * (size - overlap)`. The chunk that reaches the end
//! of content is the last one, so content of `L > size` units produces exactly
//! `ceil((L - overlap) / (size - overlap))` chunks, and `0 < L <= size`
//! produces one.
//!
//! ## Units
//!
//! | Strategy | Unit | Chunk payload |
//! |----------|------|---------------|
//! | [`Chunker::by_bytes`] | byte | opaque bytes, may split a character |
//! | [`Chunker::by_characters`] | Unicode scalar value | valid UTF-8 text |
//!
//! Byte chunks never look at the encoding. Character chunks require valid
//! UTF-8 and report anything else as [`ErrorKind::Decoding`].
//!
//! ## Sources
//!
//! ```text
//! Source::text("...")          in-memory, shared not copied
//! "notes/today.md"             file, streamed in 8 KiB blocks
//! "glob://docs/**/*.md"        every matching file, in path order
//! "https://example.com/page"   HTTP body, streamed
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use kiru::Chunker;
//!
//! let chunker = Chunker::by_characters(4, 1)?;
//!
//! let chunks: Vec<String> = chunker
//!     .on_string("ABCDEFGHIJ")
//!     .map(|c| c.map(|c| c.to_string_lossy().into_owned()))
//!     .collect::<Result<_, _>>()?;
//! assert_eq!(chunks, ["ABCD", "DEFG", "GHIJ"]);
//!
//! // Many sources, one after another; unmatched globs are simply empty.
//! let items: Vec<_> = chunker.on_sources(["glob://no/such/*.txt"]).collect();
//! assert!(items.is_empty());
//! # Ok::<(), kiru::Error>(())
//! ```
//!
//! ## Parallel
//!
//! ```rust,no_run
//! use kiru::Chunker;
//!
//! let chunker = Chunker::by_bytes(4096, 256)?.with_max_workers(8)?;
//! for item in chunker.on_sources_par(["glob://corpus/*.txt", "https://example.com"], 1024)? {
//!     match item {
//!         Ok(tagged) => println!("{} #{}", tagged.id, tagged.chunk.index),
//!         Err(failure) => eprintln!("{failure}: {}", failure.error),
//!     }
//! }
//! # Ok::<(), kiru::Error>(())
//! ```
//!
//! Chunks of one source stay in order; sources interleave. A failing source
//! yields one [`SourceFailure`] and the rest carry on. Dropping the sequence
//! early stops and joins every worker before `drop` returns.
//!
//! ## Memory
//!
//! | Path | Resident |
//! |------|----------|
//! | `on_string` | the text (shared) |
//! | `on_file`, remote | about 2 × (chunk + block) |
//! | `on_sources_par` | the above per worker + `queue_depth` chunks |

mod chunk;
mod chunker;
mod error;
mod geometry;
mod parallel;
mod sequential;
mod source;
mod splitter;
mod window;

pub use chunk::{Chunk, SourceChunk};
pub use chunker::Chunker;
pub use error::{Error, ErrorKind, Result};
pub use geometry::{ChunkSpec, Strategy};
pub use parallel::ParallelChunks;
pub use sequential::{ChunkIter, SourcesIter};
pub use source::{Source, SourceFailure, SourceId};
