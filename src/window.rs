//! Unit-addressable buffers over opened sources.
//!
//! A [`Window`] exposes content as a run of units (bytes or characters) with
//! absolute offsets. The iterator asks for windows at a monotonically
//! increasing cursor and tells the buffer when earlier units can be dropped,
//! so a streamed source only ever holds about one chunk plus one read block.
//!
//! ```text
//!            released        live          read ahead
//! file:  |--------------|=============|-------------|...
//!                       ^cursor       ^cursor+size  ^available
//! ```

use std::io::{self, Read};
use std::ops::Range;
use std::sync::Arc;

use crate::source::{Input, Origin};
use crate::{Chunk, Result, Strategy};

/// Content addressable in strategy units.
pub(crate) trait Window: Send {
    /// Absolute offset one past the last buffered unit.
    fn available(&self) -> usize;

    /// Whether no units exist beyond [`Window::available`].
    fn exhausted(&self) -> bool;

    /// Buffer at least one more block, or mark the input exhausted.
    fn fill(&mut self) -> Result<()>;

    /// Copy out the units in `range`. `range.start` is never below the last
    /// released offset.
    fn extract(&self, range: Range<usize>, index: usize) -> Chunk;

    /// Units before `upto` will not be requested again.
    fn release(&mut self, upto: usize);
}

/// Build the window matching `strategy` over an opened source.
pub(crate) fn open(input: Input, strategy: Strategy, block_size: usize) -> Box<dyn Window> {
    match (input, strategy) {
        (Input::Resident(text), Strategy::Bytes) => Box::new(ResidentBytes { text }),
        (Input::Resident(text), Strategy::Characters) => Box::new(ResidentChars::new(text)),
        (Input::Stream { reader, origin }, Strategy::Bytes) => Box::new(StreamBytes {
            reader,
            origin,
            block_size,
            buf: Vec::new(),
            base: 0,
            eof: false,
        }),
        (Input::Stream { reader, origin }, Strategy::Characters) => Box::new(StreamChars {
            reader,
            origin,
            block_size,
            buf: String::new(),
            pending: Vec::new(),
            decoded: 0,
            head_char: 0,
            head_byte: 0,
            end_char: 0,
            eof: false,
        }),
    }
}

/// Byte offset reached by walking `n` characters forward from `from`.
fn advance_chars(s: &str, from: usize, n: usize) -> usize {
    s[from..]
        .char_indices()
        .nth(n)
        .map_or(s.len(), |(i, _)| from + i)
}

/// Read into `buf`, retrying on interruption. Returns 0 at end of input.
fn read_block(reader: &mut dyn Read, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

struct ResidentBytes {
    text: Arc<str>,
}

impl Window for ResidentBytes {
    fn available(&self) -> usize {
        self.text.len()
    }

    fn exhausted(&self) -> bool {
        true
    }

    fn fill(&mut self) -> Result<()> {
        Ok(())
    }

    fn extract(&self, range: Range<usize>, index: usize) -> Chunk {
        let data = self.text.as_bytes()[range.clone()].to_vec();
        Chunk::bytes(data, range.start, range.end, index)
    }

    fn release(&mut self, _upto: usize) {}
}

struct ResidentChars {
    text: Arc<str>,
    chars: usize,
    head_char: usize,
    head_byte: usize,
}

impl ResidentChars {
    fn new(text: Arc<str>) -> Self {
        let chars = text.chars().count();
        Self {
            text,
            chars,
            head_char: 0,
            head_byte: 0,
        }
    }
}

impl Window for ResidentChars {
    fn available(&self) -> usize {
        self.chars
    }

    fn exhausted(&self) -> bool {
        true
    }

    fn fill(&mut self) -> Result<()> {
        Ok(())
    }

    fn extract(&self, range: Range<usize>, index: usize) -> Chunk {
        let start = advance_chars(&self.text, self.head_byte, range.start - self.head_char);
        let end = advance_chars(&self.text, start, range.len());
        Chunk::text(self.text[start..end].to_string(), range.start, range.end, index)
    }

    fn release(&mut self, upto: usize) {
        self.head_byte = advance_chars(&self.text, self.head_byte, upto - self.head_char);
        self.head_char = upto;
    }
}

struct StreamBytes {
    reader: Box<dyn Read + Send>,
    origin: Origin,
    block_size: usize,
    buf: Vec<u8>,
    /// Absolute offset of `buf[0]`.
    base: usize,
    eof: bool,
}

impl Window for StreamBytes {
    fn available(&self) -> usize {
        self.base + self.buf.len()
    }

    fn exhausted(&self) -> bool {
        self.eof
    }

    fn fill(&mut self) -> Result<()> {
        let len = self.buf.len();
        self.buf.resize(len + self.block_size, 0);
        let read = read_block(&mut *self.reader, &mut self.buf[len..]);
        let n = match read {
            Ok(n) => n,
            Err(e) => {
                self.buf.truncate(len);
                return Err(self.origin.read_error(e));
            }
        };
        self.buf.truncate(len + n);
        if n == 0 {
            self.eof = true;
        }
        Ok(())
    }

    fn extract(&self, range: Range<usize>, index: usize) -> Chunk {
        let data = self.buf[range.start - self.base..range.end - self.base].to_vec();
        Chunk::bytes(data, range.start, range.end, index)
    }

    fn release(&mut self, upto: usize) {
        let drop = upto.saturating_sub(self.base).min(self.buf.len());
        // Compact only once the dead prefix outweighs the live tail.
        if drop > 0 && drop * 2 >= self.buf.len() {
            self.buf.drain(..drop);
            self.base += drop;
        }
    }
}

struct StreamChars {
    reader: Box<dyn Read + Send>,
    origin: Origin,
    block_size: usize,
    /// Decoded text. `buf[head_byte..]` starts at character `head_char`.
    buf: String,
    /// Undecoded tail: an incomplete UTF-8 sequence split across reads.
    pending: Vec<u8>,
    /// Absolute byte offset of the end of `buf` in the source.
    decoded: usize,
    head_char: usize,
    head_byte: usize,
    end_char: usize,
    eof: bool,
}

impl Window for StreamChars {
    fn available(&self) -> usize {
        self.end_char
    }

    fn exhausted(&self) -> bool {
        self.eof
    }

    fn fill(&mut self) -> Result<()> {
        let keep = self.pending.len();
        self.pending.resize(keep + self.block_size, 0);
        let read = read_block(&mut *self.reader, &mut self.pending[keep..]);
        let n = match read {
            Ok(n) => n,
            Err(e) => {
                self.pending.truncate(keep);
                return Err(self.origin.read_error(e));
            }
        };
        self.pending.truncate(keep + n);

        if n == 0 {
            self.eof = true;
            if !self.pending.is_empty() {
                return Err(self.origin.decoding(self.decoded));
            }
            return Ok(());
        }

        let valid = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(e) => return Err(self.origin.decoding(self.decoded + e.valid_up_to())),
        };
        let text = std::str::from_utf8(&self.pending[..valid])
            .map_err(|e| self.origin.decoding(self.decoded + e.valid_up_to()))?;

        self.end_char += text.chars().count();
        self.buf.push_str(text);
        self.decoded += valid;
        self.pending.drain(..valid);
        Ok(())
    }

    fn extract(&self, range: Range<usize>, index: usize) -> Chunk {
        let start = advance_chars(&self.buf, self.head_byte, range.start - self.head_char);
        let end = advance_chars(&self.buf, start, range.len());
        Chunk::text(self.buf[start..end].to_string(), range.start, range.end, index)
    }

    fn release(&mut self, upto: usize) {
        if upto <= self.head_char {
            return;
        }
        self.head_byte = advance_chars(&self.buf, self.head_byte, upto - self.head_char);
        self.head_char = upto;
        if self.head_byte * 2 >= self.buf.len() {
            self.buf.drain(..self.head_byte);
            self.head_byte = 0;
        }
    }
}
