//! Error types for kiru.

use std::io;
use std::path::PathBuf;

/// Errors that can occur while configuring a chunker or reading a source.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid chunk size (must be > 0).
    #[error("invalid chunk size: {0} (must be > 0)")]
    InvalidChunkSize(usize),

    /// Overlap is not smaller than the chunk size.
    #[error("the overlap ({overlap}) must be less than the chunk size ({size})")]
    OverlapExceedsSize {
        /// The chunk size.
        size: usize,
        /// The overlap that reached or exceeded the size.
        overlap: usize,
    },

    /// Read block size of zero.
    #[error("invalid block size: {0} (must be > 0)")]
    InvalidBlockSize(usize),

    /// Worker pool of zero threads.
    #[error("invalid worker count: {0} (must be > 0)")]
    InvalidWorkerCount(usize),

    /// A file could not be opened or read.
    #[error("error reading {}", path.display())]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// A glob pattern failed to parse.
    #[error("invalid glob pattern {pattern:?}: {message}")]
    InvalidGlob {
        /// The pattern as given.
        pattern: String,
        /// Parser diagnostic.
        message: String,
    },

    /// Content is not valid UTF-8 under the characters strategy.
    #[error("invalid UTF-8 in {origin} at byte {offset}")]
    Decoding {
        /// Display form of the source.
        origin: String,
        /// Absolute byte offset of the first invalid byte.
        offset: usize,
    },

    /// A remote source could not be fetched.
    #[error("error fetching {uri}: {message}")]
    Network {
        /// The requested URI.
        uri: String,
        /// Transport or status diagnostic.
        message: String,
    },

    /// The consumer stopped pulling before the source was drained.
    #[error("chunking cancelled")]
    Cancelled,

    /// A worker thread could not be started.
    #[error("failed to spawn worker thread")]
    Spawn(#[source] io::Error),
}

/// Coarse classification of [`Error`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid chunker configuration, reported before any I/O.
    Configuration,
    /// A path, pattern, or thread could not be resolved.
    SourceResolution,
    /// Invalid text encoding.
    Decoding,
    /// Remote fetch failure.
    Network,
    /// Clean shutdown after the consumer left.
    Cancellation,
}

impl Error {
    /// The category this error belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidChunkSize(_)
            | Self::OverlapExceedsSize { .. }
            | Self::InvalidBlockSize(_)
            | Self::InvalidWorkerCount(_) => ErrorKind::Configuration,
            Self::Io { .. } | Self::InvalidGlob { .. } | Self::Spawn(_) => {
                ErrorKind::SourceResolution
            }
            Self::Decoding { .. } => ErrorKind::Decoding,
            Self::Network { .. } => ErrorKind::Network,
            Self::Cancelled => ErrorKind::Cancellation,
        }
    }

    pub(crate) fn network(uri: &str, err: &impl std::fmt::Display) -> Self {
        Self::Network {
            uri: uri.to_string(),
            message: err.to_string(),
        }
    }
}

/// Result type for kiru operations.
pub type Result<T> = std::result::Result<T, Error>;
