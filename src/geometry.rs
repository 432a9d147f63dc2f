//! Chunk geometry: unit, size, and overlap.
//!
//! ## Units
//!
//! The same window arithmetic runs over two different units:
//!
//! - [`Strategy::Bytes`]: one unit is one byte. Boundaries may land inside a
//!   multi-byte character, so chunks are opaque payloads.
//! - [`Strategy::Characters`]: one unit is one Unicode scalar value (a Rust
//!   `char`). Every chunk is valid UTF-8 on its own.
//!
//! ```text
//! "añb" as bytes:      [61] [c3 b1] [62]   -> 4 units
//! "añb" as characters: [a]  [ñ]     [b]    -> 3 units
//! ```
//!
//! ## Step
//!
//! Chunk `i` starts at `i * (size - overlap)`. Requiring `overlap < size`
//! keeps the step positive, so the cursor always advances.

/// The unit in which chunk size and overlap are measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Raw bytes.
    Bytes,
    /// Unicode scalar values.
    Characters,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bytes => f.write_str("bytes"),
            Self::Characters => f.write_str("characters"),
        }
    }
}

/// Validated chunk geometry.
///
/// # Examples
///
/// ```rust
/// use kiru::{ChunkSpec, Strategy};
///
/// let spec = ChunkSpec::new(Strategy::Characters, 4, 1).unwrap();
/// assert_eq!(spec.step(), 3);
///
/// // "ABCDEFGHIJ": starts at 0, 3, 6
/// assert_eq!(spec.chunk_count(10), 3);
///
/// assert!(ChunkSpec::new(Strategy::Bytes, 4, 4).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpec {
    strategy: Strategy,
    size: usize,
    overlap: usize,
}

impl ChunkSpec {
    /// Create a spec.
    ///
    /// # Errors
    ///
    /// Returns an error if `size == 0` or `overlap >= size`.
    pub fn new(strategy: Strategy, size: usize, overlap: usize) -> crate::Result<Self> {
        if size == 0 {
            return Err(crate::Error::InvalidChunkSize(size));
        }
        if overlap >= size {
            return Err(crate::Error::OverlapExceedsSize { size, overlap });
        }
        Ok(Self {
            strategy,
            size,
            overlap,
        })
    }

    /// The unit of measurement.
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Maximum chunk length in units.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Units shared by adjacent chunks.
    #[must_use]
    pub const fn overlap(&self) -> usize {
        self.overlap
    }

    /// Distance between consecutive chunk starts. Always > 0.
    #[must_use]
    pub const fn step(&self) -> usize {
        self.size - self.overlap
    }

    /// Exact number of chunks produced for content of `len` units.
    ///
    /// Zero for empty content, one when `len <= size`, otherwise
    /// `ceil((len - overlap) / step)`.
    #[must_use]
    pub fn chunk_count(&self, len: usize) -> usize {
        if len == 0 {
            0
        } else if len <= self.size {
            1
        } else {
            (len - self.overlap).div_ceil(self.step())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_valid_spec() {
        let spec = ChunkSpec::new(Strategy::Bytes, 10, 3).unwrap();
        assert_eq!(spec.size(), 10);
        assert_eq!(spec.overlap(), 3);
        assert_eq!(spec.step(), 7);
        assert_eq!(spec.strategy(), Strategy::Bytes);
    }

    #[test]
    fn test_zero_size_rejected() {
        let err = ChunkSpec::new(Strategy::Bytes, 0, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidChunkSize(0)));
    }

    #[test]
    fn test_overlap_equal_to_size_rejected() {
        let err = ChunkSpec::new(Strategy::Characters, 4, 4).unwrap_err();
        assert!(matches!(
            err,
            Error::OverlapExceedsSize {
                size: 4,
                overlap: 4
            }
        ));
    }

    #[test]
    fn test_chunk_count() {
        let spec = ChunkSpec::new(Strategy::Characters, 4, 1).unwrap();
        assert_eq!(spec.chunk_count(0), 0);
        assert_eq!(spec.chunk_count(1), 1);
        assert_eq!(spec.chunk_count(4), 1);
        assert_eq!(spec.chunk_count(5), 2);
        assert_eq!(spec.chunk_count(10), 3);

        let spec = ChunkSpec::new(Strategy::Bytes, 10, 3).unwrap();
        assert_eq!(spec.chunk_count(20), 3); // 0, 7, 14
        assert_eq!(spec.chunk_count(26), 4); // 0, 7, 14, 21
    }

    #[test]
    fn test_strategy_display() {
        assert_eq!(Strategy::Bytes.to_string(), "bytes");
        assert_eq!(Strategy::Characters.to_string(), "characters");
    }
}
