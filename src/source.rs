//! Content origins and how to open them.
//!
//! A [`Source`] is a description, not a handle: nothing is opened until a
//! chunk sequence built from it is first pulled. Every open produces a fresh,
//! single-use reader, so the same `Source` can be chunked any number of times.
//!
//! ## Identifier Grammar
//!
//! ```text
//! notes/today.md           -> File
//! file:///var/log/app.log  -> File("/var/log/app.log")
//! glob://docs/**/*.md      -> Glob("docs/**/*.md")
//! https://example.com/a    -> Remote
//! s3://bucket/key          -> Remote (any other scheme)
//! ```
//!
//! Literal text has no string form; build it with [`Source::text`].

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::{Error, Result};

/// Where chunk content comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// In-memory text.
    Text(Arc<str>),
    /// A local file.
    File(PathBuf),
    /// A glob pattern, expanded into the files it matches.
    Glob(String),
    /// A remote resource fetched over HTTP(S).
    Remote(String),
}

impl Source {
    /// Literal text.
    pub fn text(text: impl Into<Arc<str>>) -> Self {
        Self::Text(text.into())
    }

    /// A local file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// Parse a source identifier.
    ///
    /// ```rust
    /// use kiru::Source;
    ///
    /// assert_eq!(Source::parse("a.txt"), Source::file("a.txt"));
    /// assert_eq!(Source::parse("file:///tmp/a.txt"), Source::file("/tmp/a.txt"));
    /// assert_eq!(Source::parse("glob://*.md"), Source::Glob("*.md".into()));
    /// assert!(matches!(Source::parse("https://example.com"), Source::Remote(_)));
    /// ```
    #[must_use]
    pub fn parse(id: &str) -> Self {
        if let Some(path) = id.strip_prefix("file://") {
            return Self::File(PathBuf::from(path));
        }
        if let Some(pattern) = id.strip_prefix("glob://") {
            return Self::Glob(pattern.to_string());
        }
        match id.split_once("://") {
            Some((scheme, _)) if is_scheme(scheme) => Self::Remote(id.to_string()),
            _ => Self::File(PathBuf::from(id)),
        }
    }

    /// Expand into readable sources: a glob becomes its matching files in
    /// lexicographic order, anything else is returned as is.
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed pattern or an unreadable directory.
    pub fn expand(&self) -> Result<Vec<Source>> {
        match self {
            Self::Glob(pattern) => Ok(expand_glob(pattern)?
                .into_iter()
                .map(Source::File)
                .collect()),
            other => Ok(vec![other.clone()]),
        }
    }

    /// Open a fresh reader over this source.
    pub(crate) fn open(&self, options: &ReadOptions) -> Result<Input> {
        let input = match self {
            Self::Text(text) => Ok(Input::Resident(Arc::clone(text))),
            Self::File(path) => {
                let file = File::open(path).map_err(|source| Error::Io {
                    path: path.clone(),
                    source,
                })?;
                debug!(path = %path.display(), "opened file");
                Ok(Input::Stream {
                    reader: Box::new(file),
                    origin: Origin::File(path.clone()),
                })
            }
            Self::Remote(uri) => open_remote(uri, options),
            Self::Glob(pattern) => Err(Error::InvalidGlob {
                pattern: pattern.clone(),
                message: "glob sources must be expanded before reading".to_string(),
            }),
        }?;
        Ok(match &options.cancel {
            Some(flag) => input.cancellable(flag),
            None => input,
        })
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => write!(f, "<text: {} bytes>", text.len()),
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Glob(pattern) => write!(f, "glob://{pattern}"),
            Self::Remote(uri) => f.write_str(uri),
        }
    }
}

impl From<&str> for Source {
    fn from(id: &str) -> Self {
        Self::parse(id)
    }
}

impl From<String> for Source {
    fn from(id: String) -> Self {
        Self::parse(&id)
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

impl From<&Path> for Source {
    fn from(path: &Path) -> Self {
        Self::File(path.to_path_buf())
    }
}

fn is_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern).map_err(|e| Error::InvalidGlob {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;

    let mut files = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| Error::Io {
            path: e.path().to_path_buf(),
            source: e.into_error(),
        })?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    debug!(pattern, matches = files.len(), "expanded glob");
    Ok(files)
}

fn open_remote(uri: &str, options: &ReadOptions) -> Result<Input> {
    let mut builder = reqwest::blocking::Client::builder().timeout(options.remote_timeout);
    if !options.system_proxy {
        builder = builder.no_proxy();
    }
    let client = builder.build().map_err(|e| Error::network(uri, &e))?;

    let response = client
        .get(uri)
        .send()
        .and_then(reqwest::blocking::Response::error_for_status)
        .map_err(|e| Error::network(uri, &e))?;

    debug!(uri, status = %response.status(), "fetched remote source");
    Ok(Input::Stream {
        reader: Box::new(response),
        origin: Origin::Remote(uri.to_string()),
    })
}

/// Reader settings shared by every source a chunker opens.
#[derive(Debug, Clone)]
pub(crate) struct ReadOptions {
    /// Bytes requested per read from a file or response body.
    pub block_size: usize,
    /// Whole-request timeout for remote sources.
    pub remote_timeout: Duration,
    /// Honour `HTTP_PROXY` and friends for remote sources.
    pub system_proxy: bool,
    /// Raised to abort reads between blocks.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            block_size: 8 * 1024,
            remote_timeout: Duration::from_secs(30),
            system_proxy: true,
            cancel: None,
        }
    }
}

/// An opened source.
pub(crate) enum Input {
    /// Text already in memory, shared rather than copied.
    Resident(Arc<str>),
    /// A byte stream read block by block.
    Stream {
        reader: Box<dyn Read + Send>,
        origin: Origin,
    },
}

impl Input {
    fn cancellable(self, flag: &Arc<AtomicBool>) -> Self {
        match self {
            Self::Stream { reader, origin } => Self::Stream {
                reader: Box::new(Cancellable {
                    reader,
                    flag: Arc::clone(flag),
                }),
                origin,
            },
            resident => resident,
        }
    }
}

/// Fails every read once the flag is raised.
struct Cancellable {
    reader: Box<dyn Read + Send>,
    flag: Arc<AtomicBool>,
}

impl Read for Cancellable {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.flag.load(Ordering::Relaxed) {
            return Err(io::Error::other("read cancelled"));
        }
        self.reader.read(buf)
    }
}

/// Where a stream comes from, for error attribution.
#[derive(Debug, Clone)]
pub(crate) enum Origin {
    File(PathBuf),
    Remote(String),
}

impl Origin {
    pub(crate) fn read_error(&self, err: io::Error) -> Error {
        match self {
            Self::File(path) => Error::Io {
                path: path.clone(),
                source: err,
            },
            Self::Remote(uri) => Error::network(uri, &err),
        }
    }

    pub(crate) fn decoding(&self, offset: usize) -> Error {
        Error::Decoding {
            origin: self.to_string(),
            offset,
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Remote(uri) => f.write_str(uri),
        }
    }
}

/// Position of a resolved source in a multi-source call.
///
/// `input` is the index in the caller's list. `member` is the position within
/// a glob's expansion, and 0 for every other source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId {
    /// Index in the caller's source list.
    pub input: usize,
    /// Index within a glob expansion.
    pub member: usize,
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.input, self.member)
    }
}

/// A source that failed, tagged with its position.
///
/// Delivered in place of that source's remaining chunks; other sources are
/// unaffected.
#[derive(Debug, thiserror::Error)]
#[error("source {id} ({origin}) failed")]
pub struct SourceFailure {
    /// Which source failed.
    pub id: SourceId,
    /// The failing source.
    pub origin: Source,
    /// What went wrong.
    #[source]
    pub error: Error,
}

/// Resolve one entry of a multi-source call into tagged, readable sources.
pub(crate) fn resolve(
    input: usize,
    source: Source,
) -> std::result::Result<Vec<(SourceId, Source)>, SourceFailure> {
    match source.expand() {
        Ok(members) => Ok(members
            .into_iter()
            .enumerate()
            .map(|(member, s)| (SourceId { input, member }, s))
            .collect()),
        Err(error) => Err(SourceFailure {
            id: SourceId { input, member: 0 },
            origin: source,
            error,
        }),
    }
}
