//! Efficient output formatting for the summary line.
//!
//! Uses itoa for integer formatting; tenths are written as
//! `<integer part>.<digit>` without ever going through floating point.

use crate::measurements::MeasureError;
use crate::station::StationStats;
use crate::streaming::buffers::DEFAULT_OUTPUT_BUFFER;
use std::fmt;
use std::io::{self, BufWriter, Write};

/// Write a tenths value with exactly one fractional digit.
///
/// Negative zero cannot occur: `0` always renders as `0.0`.
#[inline]
pub fn write_tenths<W: Write>(
    writer: &mut W,
    itoa_buf: &mut itoa::Buffer,
    value: i64,
) -> io::Result<()> {
    if value < 0 {
        writer.write_all(b"-")?;
    }
    let magnitude = value.unsigned_abs();
    writer.write_all(itoa_buf.format(magnitude / 10).as_bytes())?;
    writer.write_all(&[b'.', b'0' + (magnitude % 10) as u8])
}

/// Display adapter for a tenths value, for non-hot-path formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tenths(pub i64);

impl fmt::Display for Tenths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.0.unsigned_abs();
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{}", sign, magnitude / 10, magnitude % 10)
    }
}

/// Buffered writer for `{key=min/mean/max, ...}` summaries.
pub struct SummaryWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
    entries: usize,
}

impl<W: Write> SummaryWriter<W> {
    /// Create a new SummaryWriter with the default 64KB buffer.
    pub fn new(output: W) -> Self {
        Self::with_capacity(DEFAULT_OUTPUT_BUFFER, output)
    }

    /// Create a new SummaryWriter with specified buffer size.
    pub fn with_capacity(capacity: usize, output: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, output),
            itoa_buf: itoa::Buffer::new(),
            entries: 0,
        }
    }

    /// Write the opening brace.
    pub fn begin(&mut self) -> Result<(), MeasureError> {
        self.writer.write_all(b"{").map_err(MeasureError::Io)?;
        Ok(())
    }

    /// Write one `key=min/mean/max` entry, preceded by `, ` if not first.
    ///
    /// Key bytes are written verbatim.
    #[inline]
    pub fn write_station(&mut self, key: &[u8], stats: &StationStats) -> Result<(), MeasureError> {
        if self.entries > 0 {
            self.writer.write_all(b", ").map_err(MeasureError::Io)?;
        }
        self.writer.write_all(key).map_err(MeasureError::Io)?;
        self.writer.write_all(b"=").map_err(MeasureError::Io)?;
        self.write_tenths(stats.min as i64)?;
        self.writer.write_all(b"/").map_err(MeasureError::Io)?;
        self.write_tenths(stats.mean_tenths())?;
        self.writer.write_all(b"/").map_err(MeasureError::Io)?;
        self.write_tenths(stats.max as i64)?;
        self.entries += 1;
        Ok(())
    }

    /// Write a tenths value using itoa.
    #[inline]
    pub fn write_tenths(&mut self, value: i64) -> Result<(), MeasureError> {
        write_tenths(&mut self.writer, &mut self.itoa_buf, value).map_err(MeasureError::Io)
    }

    /// Write the closing brace and line terminator, then flush.
    pub fn finish(&mut self) -> Result<usize, MeasureError> {
        self.writer.write_all(b"}\n").map_err(MeasureError::Io)?;
        self.flush()?;
        Ok(self.entries)
    }

    /// Flush the output buffer.
    pub fn flush(&mut self) -> Result<(), MeasureError> {
        self.writer.flush().map_err(MeasureError::Io)?;
        Ok(())
    }
}
