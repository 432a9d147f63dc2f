//! Lazy, single-threaded chunk sequences.
//!
//! Everything here runs on the caller's thread. A sequence does no work until
//! its first `next`, reads only as much input as the next window needs, and
//! stops (releasing its file handle or connection) when dropped or closed.

use std::collections::VecDeque;
use std::iter::FusedIterator;

use tracing::{debug, warn};

use crate::source::{self, ReadOptions};
use crate::splitter::{self, Boundary};
use crate::window::{self, Window};
use crate::{Chunk, ChunkSpec, Result, Source, SourceChunk, SourceFailure, SourceId};

enum State {
    Pending(Source),
    Open {
        window: Box<dyn Window>,
        cursor: usize,
    },
    Done,
}

/// Chunks of a single source, in order.
///
/// Yields `Err` at most once; the sequence ends after it.
///
/// ```rust
/// use kiru::Chunker;
///
/// let chunker = Chunker::by_characters(4, 1).unwrap();
/// let chunks: Vec<String> = chunker
///     .on_string("ABCDEFGHIJ")
///     .map(|c| c.unwrap().into_string().unwrap())
///     .collect();
/// assert_eq!(chunks, ["ABCD", "DEFG", "GHIJ"]);
/// ```
pub struct ChunkIter {
    spec: ChunkSpec,
    options: ReadOptions,
    state: State,
    index: usize,
}

impl ChunkIter {
    pub(crate) fn new(spec: ChunkSpec, options: ReadOptions, source: Source) -> Self {
        Self {
            spec,
            options,
            state: State::Pending(source),
            index: 0,
        }
    }

    /// Stop early and release the underlying reader.
    pub fn close(&mut self) {
        self.state = State::Done;
    }

    /// Number of chunks produced so far.
    #[must_use]
    pub fn produced(&self) -> usize {
        self.index
    }
}

impl Iterator for ChunkIter {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match &mut self.state {
                State::Done => return None,
                State::Pending(source) => match source.open(&self.options) {
                    Ok(input) => {
                        debug!(source = %source, strategy = %self.spec.strategy(), "reading source");
                        let window =
                            window::open(input, self.spec.strategy(), self.options.block_size);
                        self.state = State::Open { window, cursor: 0 };
                    }
                    Err(e) => {
                        self.state = State::Done;
                        return Some(Err(e));
                    }
                },
                State::Open { window, cursor } => {
                    match splitter::next_boundary(
                        &self.spec,
                        *cursor,
                        window.available(),
                        window.exhausted(),
                    ) {
                        Boundary::NeedMore => {
                            if let Err(e) = window.fill() {
                                self.state = State::Done;
                                return Some(Err(e));
                            }
                        }
                        Boundary::Exhausted => {
                            self.state = State::Done;
                            return None;
                        }
                        Boundary::Window { range, last } => {
                            let chunk = window.extract(range, self.index);
                            self.index += 1;
                            if last {
                                self.state = State::Done;
                            } else {
                                *cursor += self.spec.step();
                                window.release(*cursor);
                            }
                            return Some(Ok(chunk));
                        }
                    }
                }
            }
        }
    }
}

impl FusedIterator for ChunkIter {}

impl std::fmt::Debug for ChunkIter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.state {
            State::Pending(_) => "pending",
            State::Open { .. } => "open",
            State::Done => "done",
        };
        f.debug_struct("ChunkIter")
            .field("spec", &self.spec)
            .field("state", &state)
            .field("produced", &self.index)
            .finish()
    }
}

/// Chunks of many sources, one after another in input order.
///
/// Source `k` is drained completely before source `k + 1` is opened. Globs
/// are expanded when reached. A failing source yields one [`SourceFailure`]
/// and the sequence moves on to the next source.
pub struct SourcesIter {
    spec: ChunkSpec,
    options: ReadOptions,
    inputs: std::iter::Enumerate<std::vec::IntoIter<Source>>,
    queued: VecDeque<(SourceId, Source)>,
    current: Option<(SourceId, Source, ChunkIter)>,
}

impl SourcesIter {
    pub(crate) fn new(spec: ChunkSpec, options: ReadOptions, sources: Vec<Source>) -> Self {
        Self {
            spec,
            options,
            inputs: sources.into_iter().enumerate(),
            queued: VecDeque::new(),
            current: None,
        }
    }

    /// Stop early and release the current reader.
    pub fn close(&mut self) {
        self.current = None;
        self.queued.clear();
        self.inputs.by_ref().for_each(drop);
    }
}

impl Iterator for SourcesIter {
    type Item = std::result::Result<SourceChunk, SourceFailure>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((id, origin, iter)) = &mut self.current {
                let id = *id;
                match iter.next() {
                    Some(Ok(chunk)) => return Some(Ok(SourceChunk { id, chunk })),
                    Some(Err(error)) => {
                        warn!(source = %origin, %id, %error, "source failed");
                        let origin = origin.clone();
                        self.current = None;
                        return Some(Err(SourceFailure { id, origin, error }));
                    }
                    None => self.current = None,
                }
                continue;
            }

            if let Some((id, source)) = self.queued.pop_front() {
                let iter = ChunkIter::new(self.spec, self.options.clone(), source.clone());
                self.current = Some((id, source, iter));
                continue;
            }

            let (input, source) = self.inputs.next()?;
            match source::resolve(input, source) {
                Ok(members) => self.queued.extend(members),
                Err(failure) => {
                    warn!(source = %failure.origin, id = %failure.id, error = %failure.error, "source failed");
                    return Some(Err(failure));
                }
            }
        }
    }
}

impl FusedIterator for SourcesIter {}

impl std::fmt::Debug for SourcesIter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourcesIter")
            .field("spec", &self.spec)
            .field("current", &self.current.as_ref().map(|(id, _, _)| *id))
            .field("queued", &self.queued.len())
            .finish_non_exhaustive()
    }
}
