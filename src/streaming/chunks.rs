//! Fixed-capacity chunk reader that yields whole lines.
//!
//! A single buffer is refilled from the input. After each read the reader
//! looks backward for the last `\n`; everything up to and including it is
//! handed out as a [`Chunk`], and the trailing partial line is moved to the
//! front of the buffer before the next refill. A `Chunk` borrows the reader,
//! so no line can outlive the refill that would overwrite it.

use crate::measurements::{MeasureError, Result};
use memchr::{memchr, memrchr};
use std::io::{ErrorKind, Read};
use std::ops::Range;
use tracing::trace;

/// Where the reader is in its refill/drain cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Reading more bytes after any carried partial line.
    Filling,
    /// A chunk of complete lines has been handed out.
    Draining,
    /// The input is exhausted and nothing is carried.
    Done,
}

/// A run of complete lines borrowed from the reader's buffer.
#[derive(Debug, Clone, Copy)]
pub struct Chunk<'a> {
    data: &'a [u8],
    offset: u64,
}

impl<'a> Chunk<'a> {
    /// Raw chunk bytes. Ends with `\n` except for a final unterminated line.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Stream offset of the first byte of this chunk.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Iterate the lines of this chunk with their stream offsets.
    pub fn lines(&self) -> Lines<'a> {
        Lines::new(self.data, self.offset)
    }
}

/// Iterator over `(offset, line)` pairs. Lines exclude the terminator.
///
/// Bytes after the last `\n` are yielded as a final line, which is how an
/// input without a trailing newline ends.
#[derive(Debug, Clone)]
pub struct Lines<'a> {
    data: &'a [u8],
    pos: usize,
    base_offset: u64,
}

impl<'a> Lines<'a> {
    /// Iterate the lines in `data`, which starts at `base_offset` in the stream.
    pub fn new(data: &'a [u8], base_offset: u64) -> Self {
        Self {
            data,
            pos: 0,
            base_offset,
        }
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = (u64, &'a [u8]);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.data.len() {
            return None;
        }
        let start = self.pos;
        let rest = &self.data[start..];
        let line = match memchr(b'\n', rest) {
            Some(newline) => {
                self.pos += newline + 1;
                &rest[..newline]
            }
            None => {
                self.pos = self.data.len();
                rest
            }
        };
        Some((self.base_offset + start as u64, line))
    }
}

/// Chunked line reader over any `Read`.
pub struct ChunkReader<R: Read> {
    reader: R,
    buf: Box<[u8]>,
    /// Partial line left over from the last chunk, moved to the front on refill.
    pending: Range<usize>,
    /// Stream offset of `buf[0]`.
    base_offset: u64,
    bytes_read: u64,
    chunks: u64,
    eof: bool,
    state: ScanState,
}

impl<R: Read> ChunkReader<R> {
    /// Create a reader with a buffer of `capacity` bytes.
    ///
    /// The capacity bounds the longest accepted line, terminator included.
    pub fn with_capacity(capacity: usize, reader: R) -> Self {
        Self {
            reader,
            buf: vec![0u8; capacity.max(1)].into_boxed_slice(),
            pending: 0..0,
            base_offset: 0,
            bytes_read: 0,
            chunks: 0,
            eof: false,
            state: ScanState::Filling,
        }
    }

    /// Refill the buffer and return the next run of complete lines.
    ///
    /// Returns `Ok(None)` once the input is exhausted. A final line without a
    /// terminator is returned as its own chunk. A line that cannot fit in the
    /// buffer fails with `OversizedLine`; it is never truncated.
    pub fn next_chunk(&mut self) -> Result<Option<Chunk<'_>>> {
        let carried = self.pending.len();
        if carried > 0 {
            self.buf.copy_within(self.pending.clone(), 0);
        }
        self.base_offset += self.pending.start as u64;
        self.pending = 0..0;

        if self.eof {
            self.state = ScanState::Done;
            return Ok(None);
        }

        self.state = ScanState::Filling;
        let mut filled = carried;
        loop {
            let n = match self.reader.read(&mut self.buf[filled..]) {
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(MeasureError::Io(e)),
            };
            self.bytes_read += n as u64;

            if n == 0 {
                self.eof = true;
                if filled == 0 {
                    self.state = ScanState::Done;
                    return Ok(None);
                }
                trace!(offset = self.base_offset, len = filled, "final unterminated line");
                self.pending = filled..filled;
                self.chunks += 1;
                self.state = ScanState::Draining;
                return Ok(Some(Chunk {
                    data: &self.buf[..filled],
                    offset: self.base_offset,
                }));
            }

            // The carried bytes hold no terminator, so only the new bytes are searched.
            let fresh = filled;
            filled += n;
            match memrchr(b'\n', &self.buf[fresh..filled]) {
                Some(newline) => {
                    let end = fresh + newline + 1;
                    trace!(
                        offset = self.base_offset,
                        len = end,
                        carried,
                        "chunk ready"
                    );
                    self.pending = end..filled;
                    self.chunks += 1;
                    self.state = ScanState::Draining;
                    return Ok(Some(Chunk {
                        data: &self.buf[..end],
                        offset: self.base_offset,
                    }));
                }
                None if filled == self.buf.len() => {
                    return Err(MeasureError::OversizedLine {
                        offset: self.base_offset,
                        capacity: self.buf.len(),
                    });
                }
                None => continue,
            }
        }
    }

    /// Current position in the fill/drain cycle.
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Buffer capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Total bytes read from the input so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Number of chunks handed out so far.
    pub fn chunks(&self) -> u64 {
        self.chunks
    }
}
