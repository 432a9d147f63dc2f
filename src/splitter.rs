//! Window boundary arithmetic.
//!
//! The splitter is a pure function of the cursor, the amount of content
//! buffered so far, and whether the input is exhausted. It never touches the
//! content itself, so the same code drives byte and character windows,
//! resident strings and streamed files.
//!
//! ## How It Works
//!
//! ```text
//! size = 10, overlap = 3
//!
//! Content: "abcdefghijklmnopqrstuvwxyz"
//!
//! Chunk 0: "abcdefghij"   [0..10]
//! Chunk 1: "hijklmnopq"   [7..17]   <- starts at 10 - 3 = 7
//! Chunk 2: "opqrstuvwx"   [14..24]  <- starts at 17 - 3 = 14
//! Chunk 3: "vwxyz"        [21..26]  <- reaches the end: last chunk
//! ```
//!
//! The chunk that reaches the end of content is the last one. A trailing
//! window lying entirely inside the previous chunk's overlap is never emitted.
//!
//! ## Streaming
//!
//! When content arrives incrementally, a full window `[s, s + size)` is only
//! emitted once at least one unit past it is buffered (or the input is
//! exhausted). Otherwise we could not tell whether the window is the last one.

use std::ops::Range;

use crate::ChunkSpec;

/// What the splitter wants to happen next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Boundary {
    /// Emit this window. When `last` is set, the sequence ends after it.
    Window { range: Range<usize>, last: bool },
    /// Buffer more content before deciding.
    NeedMore,
    /// Nothing left to emit.
    Exhausted,
}

/// Decide the next window for a cursor at `start`.
///
/// * `available` - absolute offset one past the last buffered unit
/// * `exhausted` - whether the input has no more units beyond `available`
pub(crate) fn next_boundary(
    spec: &ChunkSpec,
    start: usize,
    available: usize,
    exhausted: bool,
) -> Boundary {
    let target = start + spec.size();

    if available > target {
        return Boundary::Window {
            range: start..target,
            last: false,
        };
    }

    if !exhausted {
        return Boundary::NeedMore;
    }

    if start >= available {
        return Boundary::Exhausted;
    }

    Boundary::Window {
        range: start..available.min(target),
        last: true,
    }
}

/// All windows over content of `len` units, in order.
///
/// Convenience for resident content; equivalent to driving
/// [`next_boundary`] with `exhausted = true`.
pub(crate) fn windows(spec: &ChunkSpec, len: usize) -> impl Iterator<Item = Range<usize>> + '_ {
    let mut start = 0;
    let mut done = false;
    std::iter::from_fn(move || {
        if done {
            return None;
        }
        match next_boundary(spec, start, len, true) {
            Boundary::Window { range, last } => {
                done = last;
                start += spec.step();
                Some(range)
            }
            Boundary::NeedMore | Boundary::Exhausted => {
                done = true;
                None
            }
        }
    })
}
