//! Concurrent chunking of many sources.
//!
//! ## Layout
//!
//! ```text
//!   jobs (unbounded, pre-filled)        results (bounded, depth Q)
//!  [s0 s1 s2 ... sN] --> worker 0 --\
//!                    --> worker 1 ---+--> [c c c ... ] --> consumer
//!                    --> worker W --/
//! ```
//!
//! Each worker takes one source at a time off the job list and runs an
//! ordinary [`ChunkIter`] over it, pushing every chunk into the result
//! channel. A full channel blocks the worker, so at most `Q` chunks are ever
//! waiting for the consumer.
//!
//! ## Ordering
//!
//! Chunks of one source arrive in order because one worker produces them.
//! Chunks of different sources interleave in whatever order workers finish.
//!
//! ## Shutdown
//!
//! Dropping [`ParallelChunks`] raises the cancel flag, disconnects the result
//! channel (waking any worker blocked on a full queue) and joins every worker
//! before returning. Workers see the flag between chunks, and their readers
//! refuse to start another block once it is raised, so a worker in the middle
//! of a read stops as soon as that read returns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::sequential::ChunkIter;
use crate::source::{self, ReadOptions};
use crate::{ChunkSpec, Error, Result, Source, SourceChunk, SourceFailure, SourceId};

type Item = std::result::Result<SourceChunk, SourceFailure>;

enum Job {
    Read { id: SourceId, source: Source },
    Failed(SourceFailure),
}

/// Chunks of many sources, produced concurrently.
///
/// Items arrive in completion order. Group by [`SourceChunk::id`] to recover
/// each source's ordered sequence.
pub struct ParallelChunks {
    results: Option<flume::Receiver<Item>>,
    cancel: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
}

impl ParallelChunks {
    /// Expand globs, queue every source, and start the worker pool.
    pub(crate) fn spawn(
        spec: ChunkSpec,
        options: &ReadOptions,
        max_workers: usize,
        sources: Vec<Source>,
        queue_depth: usize,
    ) -> Result<Self> {
        let inputs = sources.len();
        let mut jobs = Vec::with_capacity(inputs);
        for (input, source) in sources.into_iter().enumerate() {
            match source::resolve(input, source) {
                Ok(members) => jobs.extend(
                    members
                        .into_iter()
                        .map(|(id, source)| Job::Read { id, source }),
                ),
                Err(failure) => jobs.push(Job::Failed(failure)),
            }
        }

        let worker_count = jobs.len().min(max_workers);
        let (job_tx, job_rx) = flume::unbounded();
        for job in jobs {
            if job_tx.send(job).is_err() {
                break;
            }
        }
        drop(job_tx);

        let (result_tx, result_rx) = flume::bounded(queue_depth);
        let mut chunks = Self {
            results: Some(result_rx),
            cancel: Arc::new(AtomicBool::new(false)),
            workers: Vec::with_capacity(worker_count),
        };

        for worker in 0..worker_count {
            let jobs = job_rx.clone();
            let results = result_tx.clone();
            let cancel = Arc::clone(&chunks.cancel);
            let options = ReadOptions {
                cancel: Some(Arc::clone(&cancel)),
                ..options.clone()
            };
            let handle = thread::Builder::new()
                .name(format!("kiru-worker-{worker}"))
                .spawn(move || {
                    match run_worker(spec, &options, &jobs, &results, &cancel) {
                        Ok(()) => debug!(worker, "worker finished"),
                        Err(err) => debug!(worker, %err, "worker stopped early"),
                    }
                })
                .map_err(Error::Spawn)?;
            chunks.workers.push(handle);
        }
        // The channel disconnects once the last worker drops its sender.
        drop(result_tx);

        debug!(
            inputs,
            workers = worker_count,
            queue_depth,
            "started parallel chunking"
        );
        Ok(chunks)
    }

    /// Number of chunks currently waiting in the queue.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.results.as_ref().map_or(0, flume::Receiver::len)
    }

    /// Number of worker threads started for this call.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers.len()
    }

    /// Stop all workers and wait for them to release their sources.
    pub fn close(self) {
        drop(self);
    }
}

fn run_worker(
    spec: ChunkSpec,
    options: &ReadOptions,
    jobs: &flume::Receiver<Job>,
    results: &flume::Sender<Item>,
    cancel: &AtomicBool,
) -> Result<()> {
    while let Ok(job) = jobs.recv() {
        if cancel.load(Ordering::Relaxed) {
            return Err(Error::Cancelled);
        }

        match job {
            Job::Failed(failure) => {
                warn!(source = %failure.origin, id = %failure.id, error = %failure.error, "source failed");
                results.send(Err(failure)).map_err(|_| Error::Cancelled)?;
            }
            Job::Read { id, source } => {
                let mut iter = ChunkIter::new(spec, options.clone(), source.clone());
                for item in &mut iter {
                    if cancel.load(Ordering::Relaxed) {
                        return Err(Error::Cancelled);
                    }
                    let item = match item {
                        Ok(chunk) => Ok(SourceChunk { id, chunk }),
                        Err(error) => {
                            warn!(source = %source, %id, %error, "source failed");
                            Err(SourceFailure {
                                id,
                                origin: source.clone(),
                                error,
                            })
                        }
                    };
                    results.send(item).map_err(|_| Error::Cancelled)?;
                }
                debug!(%id, chunks = iter.produced(), "source drained");
            }
        }
    }
    Ok(())
}

impl Iterator for ParallelChunks {
    type Item = Item;

    fn next(&mut self) -> Option<Self::Item> {
        self.results.as_ref()?.recv().ok()
    }
}

impl Drop for ParallelChunks {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        self.results.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("chunking worker panicked");
            }
        }
    }
}

impl std::fmt::Debug for ParallelChunks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParallelChunks")
            .field("workers", &self.workers.len())
            .field("buffered", &self.buffered())
            .finish_non_exhaustive()
    }
}
