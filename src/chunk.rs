//! The Chunk type: one window of content with position metadata.

use std::borrow::Cow;

use crate::SourceId;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Payload {
    Bytes(Vec<u8>),
    Text(String),
}

/// An owned window of content with its position in the source.
///
/// ## Offsets
///
/// `start` and `end` are measured in the unit of the strategy that produced
/// the chunk: byte offsets for [`Strategy::Bytes`](crate::Strategy::Bytes),
/// character offsets for
/// [`Strategy::Characters`](crate::Strategy::Characters).
///
/// ```text
/// Source:  "ABCDEFGHIJ"   size 4, overlap 1
/// Chunk 0: "ABCD"  [0..4]
/// Chunk 1: "DEFG"  [3..7]   <- "D" repeated
/// Chunk 2: "GHIJ"  [6..10]
/// ```
///
/// ## Payload
///
/// Character chunks always hold valid text, so [`Chunk::as_str`] returns
/// `Some`. Byte chunks are opaque: they are returned as text only if the
/// window happens to be valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    payload: Payload,
    /// Offset where this chunk starts in the source, in strategy units.
    pub start: usize,
    /// Offset where this chunk ends (exclusive), in strategy units.
    pub end: usize,
    /// Zero-based index of this chunk in its source's sequence.
    pub index: usize,
}

impl Chunk {
    pub(crate) fn bytes(data: Vec<u8>, start: usize, end: usize, index: usize) -> Self {
        Self {
            payload: Payload::Bytes(data),
            start,
            end,
            index,
        }
    }

    pub(crate) fn text(data: String, start: usize, end: usize, index: usize) -> Self {
        Self {
            payload: Payload::Text(data),
            start,
            end,
            index,
        }
    }

    /// The raw bytes of this chunk.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match &self.payload {
            Payload::Bytes(b) => b,
            Payload::Text(s) => s.as_bytes(),
        }
    }

    /// The chunk as text, if it is valid UTF-8.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match &self.payload {
            Payload::Bytes(b) => std::str::from_utf8(b).ok(),
            Payload::Text(s) => Some(s),
        }
    }

    /// The chunk as text, replacing invalid sequences with U+FFFD.
    #[must_use]
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }

    /// Consume the chunk, returning its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        match self.payload {
            Payload::Bytes(b) => b,
            Payload::Text(s) => s.into_bytes(),
        }
    }

    /// Consume the chunk, returning its text.
    ///
    /// # Errors
    ///
    /// Returns the chunk unchanged if it is not valid UTF-8.
    pub fn into_string(self) -> Result<String, Self> {
        match self.payload {
            Payload::Text(s) => Ok(s),
            Payload::Bytes(b) => String::from_utf8(b).map_err(|e| Self {
                payload: Payload::Bytes(e.into_bytes()),
                start: self.start,
                end: self.end,
                index: self.index,
            }),
        }
    }

    /// Length in strategy units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether this chunk is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Length in bytes, whatever the strategy.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.as_bytes().len()
    }

    /// The span of this chunk in the source, in strategy units.
    #[must_use]
    pub fn span(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

impl std::fmt::Display for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Chunk {{ index: {}, span: {}..{}, bytes: {} }}",
            self.index,
            self.start,
            self.end,
            self.byte_len()
        )
    }
}

/// A chunk tagged with the source it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceChunk {
    /// The source that produced the chunk.
    pub id: SourceId,
    /// The chunk itself.
    pub chunk: Chunk,
}
