//! Measurement records, the crate error type, and a line-at-a-time reader.
//!
//! `MeasurementReader` materializes one owned [`Measurement`] per line. It is
//! the simple path: the chunked driver in [`crate::commands::fast_aggregate`]
//! never builds records and should be preferred for large inputs.

use crate::streaming::output::Tenths;
use crate::streaming::parsing::parse_record;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// Maximum number of line bytes echoed back in error messages.
const ERROR_LINE_PREVIEW: usize = 80;

/// Why a line was rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedKind {
    #[error("missing ';' separator")]
    MissingSeparator,

    #[error("empty station name")]
    EmptyKey,

    #[error("value is not of the form -?D[D].D")]
    InvalidValue,
}

/// Errors that can occur while reading or aggregating measurements.
#[derive(Error, Debug)]
pub enum MeasureError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed record at byte {offset}: {kind}: '{line}'")]
    MalformedRecord {
        offset: u64,
        kind: MalformedKind,
        line: String,
    },

    #[error("Line at byte {offset} does not fit in the {capacity}-byte read buffer")]
    OversizedLine { offset: u64, capacity: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl MeasureError {
    /// Build a `MalformedRecord` error from the raw line bytes.
    ///
    /// The line is decoded lossily and shortened for display.
    pub fn malformed(offset: u64, kind: MalformedKind, line: &[u8]) -> Self {
        let shown = &line[..line.len().min(ERROR_LINE_PREVIEW)];
        let mut text = String::from_utf8_lossy(shown).into_owned();
        if line.len() > ERROR_LINE_PREVIEW {
            text.push_str("...");
        }
        MeasureError::MalformedRecord {
            offset,
            kind,
            line: text,
        }
    }

    /// The malformation kind, if this is a `MalformedRecord` error.
    pub fn malformed_kind(&self) -> Option<MalformedKind> {
        match self {
            MeasureError::MalformedRecord { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, MeasureError>;

/// A single parsed `station;value` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measurement {
    /// Raw station name bytes.
    pub station: Vec<u8>,
    /// Value in tenths of a degree.
    pub tenths: i16,
}

impl Measurement {
    pub fn new(station: impl Into<Vec<u8>>, tenths: i16) -> Self {
        Self {
            station: station.into(),
            tenths,
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{};{}",
            String::from_utf8_lossy(&self.station),
            Tenths(self.tenths as i64)
        )
    }
}

/// A streaming measurement reader.
pub struct MeasurementReader<R: Read> {
    reader: BufReader<R>,
    line_number: usize,
    offset: u64,
    buffer: Vec<u8>,
}

impl MeasurementReader<File> {
    /// Open a measurement file from a path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file))
    }
}

impl<R: Read> MeasurementReader<R> {
    /// Create a new reader from any readable source.
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
            offset: 0,
            buffer: Vec::with_capacity(128),
        }
    }

    /// Read the next measurement.
    ///
    /// A final line without a terminator is returned as a normal record.
    pub fn read_measurement(&mut self) -> Result<Option<Measurement>> {
        self.buffer.clear();
        let bytes_read = self.reader.read_until(b'\n', &mut self.buffer)?;
        if bytes_read == 0 {
            return Ok(None);
        }

        let offset = self.offset;
        self.offset += bytes_read as u64;
        self.line_number += 1;

        let line = self
            .buffer
            .strip_suffix(b"\n")
            .unwrap_or(self.buffer.as_slice());
        let (station, tenths) =
            parse_record(line).map_err(|kind| MeasureError::malformed(offset, kind, line))?;

        Ok(Some(Measurement::new(station, tenths)))
    }

    /// Number of lines consumed so far.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Byte offset of the next unread line.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Get an iterator over all measurements.
    pub fn records(self) -> MeasurementIter<R> {
        MeasurementIter { reader: self }
    }
}

/// Iterator over measurements.
pub struct MeasurementIter<R: Read> {
    reader: MeasurementReader<R>,
}

impl<R: Read> Iterator for MeasurementIter<R> {
    type Item = Result<Measurement>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_measurement().transpose()
    }
}

/// Parse measurements from a string (useful for testing).
pub fn parse_measurements(content: &str) -> Result<Vec<Measurement>> {
    MeasurementReader::new(content.as_bytes()).records().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_measurements() {
        let records = parse_measurements("Hamburg;12.0\nBulawayo;8.9\nPalembang;-38.8\n").unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0], Measurement::new("Hamburg", 120));
        assert_eq!(records[1], Measurement::new("Bulawayo", 89));
        assert_eq!(records[2], Measurement::new("Palembang", -388));
    }

    #[test]
    fn test_missing_final_terminator() {
        let records = parse_measurements("A;1.0\nB;2.0").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1], Measurement::new("B", 20));
    }

    #[test]
    fn test_malformed_reports_offset() {
        let err = parse_measurements("A;1.0\nB;100.0\n").unwrap_err();
        match err {
            MeasureError::MalformedRecord { offset, kind, line } => {
                assert_eq!(offset, 6);
                assert_eq!(kind, MalformedKind::InvalidValue);
                assert_eq!(line, "B;100.0");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_separator() {
        let err = parse_measurements("no separator here\n").unwrap_err();
        assert_eq!(err.malformed_kind(), Some(MalformedKind::MissingSeparator));
    }

    #[test]
    fn test_line_counters() {
        let mut reader = MeasurementReader::new("A;1.0\nBB;-2.5\n".as_bytes());
        reader.read_measurement().unwrap();
        assert_eq!(reader.line_number(), 1);
        assert_eq!(reader.offset(), 6);
        reader.read_measurement().unwrap();
        assert_eq!(reader.offset(), 14);
        assert!(reader.read_measurement().unwrap().is_none());
    }

    #[test]
    fn test_error_preview_truncated() {
        let line = vec![b'x'; 200];
        let err = MeasureError::malformed(0, MalformedKind::MissingSeparator, &line);
        let MeasureError::MalformedRecord { line, .. } = err else {
            panic!("expected MalformedRecord");
        };
        assert_eq!(line.len(), ERROR_LINE_PREVIEW + 3);
        assert!(line.ends_with("..."));
    }

    #[test]
    fn test_display_round_trip() {
        let m = Measurement::new("Abha", -5);
        assert_eq!(m.to_string(), "Abha;-0.5");
        assert_eq!(parse_measurements(&m.to_string()).unwrap()[0], m);
    }
}
