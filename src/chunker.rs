//! The chunker facade.
//!
//! A [`Chunker`] is an immutable value: a validated [`ChunkSpec`] plus reader
//! and pool settings. Entry points borrow it and hand back independent
//! sequences, so one chunker can serve any number of calls and threads.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::parallel::ParallelChunks;
use crate::sequential::{ChunkIter, SourcesIter};
use crate::source::ReadOptions;
use crate::splitter::windows;
use crate::{Chunk, ChunkSpec, Error, Result, Source, Strategy};

/// Fixed-size, overlapping chunker over strings, files, globs and URLs.
///
/// ## Example
///
/// ```rust
/// use kiru::Chunker;
///
/// let chunker = Chunker::by_bytes(100, 20).unwrap();
/// let text = "A".repeat(250);
///
/// // starts at 0, 80, 160; the third chunk reaches the end
/// let chunks: Vec<_> = chunker.on_string(text).collect::<Result<_, _>>().unwrap();
/// assert_eq!(chunks.len(), 3);
/// assert_eq!(chunks[1].start, 80);
/// assert_eq!(chunks[2].len(), 90);
/// ```
#[derive(Debug, Clone)]
pub struct Chunker {
    spec: ChunkSpec,
    options: ReadOptions,
    max_workers: usize,
}

impl Chunker {
    /// Chunker measuring size and overlap in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if `chunk_size == 0` or `overlap >= chunk_size`.
    pub fn by_bytes(chunk_size: usize, overlap: usize) -> Result<Self> {
        ChunkSpec::new(Strategy::Bytes, chunk_size, overlap).map(Self::new)
    }

    /// Chunker measuring size and overlap in Unicode characters.
    ///
    /// # Errors
    ///
    /// Returns an error if `chunk_size == 0` or `overlap >= chunk_size`.
    pub fn by_characters(chunk_size: usize, overlap: usize) -> Result<Self> {
        ChunkSpec::new(Strategy::Characters, chunk_size, overlap).map(Self::new)
    }

    /// Chunker for an already validated spec, with default settings.
    #[must_use]
    pub fn new(spec: ChunkSpec) -> Self {
        Self {
            spec,
            options: ReadOptions::default(),
            max_workers: default_workers(),
        }
    }

    /// Set the read block size for files and remote bodies (default 8 KiB).
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes == 0`.
    pub fn with_block_size(mut self, bytes: usize) -> Result<Self> {
        if bytes == 0 {
            return Err(Error::InvalidBlockSize(bytes));
        }
        self.options.block_size = bytes;
        Ok(self)
    }

    /// Set the per-source timeout for remote fetches (default 30 s).
    #[must_use]
    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.options.remote_timeout = timeout;
        self
    }

    /// Whether remote fetches honour proxy environment variables (default on).
    #[must_use]
    pub fn with_system_proxy(mut self, enabled: bool) -> Self {
        self.options.system_proxy = enabled;
        self
    }

    /// Cap the worker pool of [`Chunker::on_sources_par`].
    ///
    /// Defaults to the available parallelism of the machine.
    ///
    /// # Errors
    ///
    /// Returns an error if `workers == 0`.
    pub fn with_max_workers(mut self, workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(Error::InvalidWorkerCount(workers));
        }
        self.max_workers = workers;
        Ok(self)
    }

    /// The chunk geometry.
    #[must_use]
    pub fn spec(&self) -> &ChunkSpec {
        &self.spec
    }

    /// The worker cap for parallel calls.
    #[must_use]
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Exact number of chunks for content of `len` units.
    #[must_use]
    pub fn estimate_chunks(&self, len: usize) -> usize {
        self.spec.chunk_count(len)
    }

    /// Chunk resident text eagerly.
    ///
    /// Same output as collecting [`Chunker::on_string`], without the
    /// iterator machinery.
    #[must_use]
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        match self.spec.strategy() {
            Strategy::Bytes => windows(&self.spec, text.len())
                .enumerate()
                .map(|(i, r)| {
                    Chunk::bytes(text.as_bytes()[r.clone()].to_vec(), r.start, r.end, i)
                })
                .collect(),
            Strategy::Characters => {
                let offsets: Vec<usize> = text
                    .char_indices()
                    .map(|(i, _)| i)
                    .chain(std::iter::once(text.len()))
                    .collect();
                windows(&self.spec, offsets.len() - 1)
                    .enumerate()
                    .map(|(i, r)| {
                        let slice = &text[offsets[r.start]..offsets[r.end]];
                        Chunk::text(slice.to_string(), r.start, r.end, i)
                    })
                    .collect()
            }
        }
    }

    /// Lazily chunk in-memory text. The text is shared, not copied.
    pub fn on_string(&self, text: impl Into<Arc<str>>) -> ChunkIter {
        self.on_source(Source::Text(text.into()))
    }

    /// Lazily chunk a file. It is opened on the first pull.
    pub fn on_file(&self, path: impl Into<PathBuf>) -> ChunkIter {
        self.on_source(Source::File(path.into()))
    }

    /// Lazily chunk one text, file or remote source.
    ///
    /// Globs name several files; use [`Chunker::on_sources`] for them.
    pub fn on_source(&self, source: Source) -> ChunkIter {
        ChunkIter::new(self.spec, self.options.clone(), source)
    }

    /// Lazily chunk many sources in order, one after another.
    ///
    /// Accepts [`Source`] values or identifier strings (`"a.txt"`,
    /// `"glob://*.md"`, `"https://..."`).
    pub fn on_sources<I, S>(&self, sources: I) -> SourcesIter
    where
        I: IntoIterator<Item = S>,
        S: Into<Source>,
    {
        let sources = sources.into_iter().map(Into::into).collect();
        SourcesIter::new(self.spec, self.options.clone(), sources)
    }

    /// Chunk many sources concurrently.
    ///
    /// Globs are expanded and workers started before this returns. At most
    /// `queue_depth` chunks are buffered ahead of the consumer; a depth of 0
    /// hands each chunk over directly. Dropping the returned sequence stops
    /// and joins all workers.
    ///
    /// # Errors
    ///
    /// Returns an error if a worker thread cannot be spawned.
    pub fn on_sources_par<I, S>(&self, sources: I, queue_depth: usize) -> Result<ParallelChunks>
    where
        I: IntoIterator<Item = S>,
        S: Into<Source>,
    {
        let sources = sources.into_iter().map(Into::into).collect();
        ParallelChunks::spawn(
            self.spec,
            &self.options,
            self.max_workers,
            sources,
            queue_depth,
        )
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get)
}
