//! Chunked streaming aggregation with zero-allocation parsing.
//!
//! Optimizations:
//! - One fixed read buffer, refilled in place; partial lines are moved to
//!   the front instead of being copied into a side buffer
//! - memchr/memrchr for line and separator scanning
//! - Fixed-offset integer parsing of values (no floats, no digit loop)
//! - Station keys copied once, on first sight
//!
//! Memory: O(buffer + distinct stations)

use crate::config::validate_buffer_size;
use crate::measurements::{MeasureError, Result};
use crate::report::write_report;
use crate::station::StationTable;
use crate::streaming::buffers::DEFAULT_READ_BUFFER;
use crate::streaming::chunks::{ChunkReader, Lines};
use crate::streaming::parsing::parse_record;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

/// Statistics from a fast aggregation run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FastAggregateStats {
    pub records: u64,
    pub stations: usize,
    pub bytes: u64,
    pub chunks: u64,
}

impl std::fmt::Display for FastAggregateStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Records: {}, Stations: {}, Bytes: {}, Chunks: {}",
            self.records, self.stations, self.bytes, self.chunks
        )
    }
}

/// Fold every line of `data` into `table`.
///
/// `base_offset` is the stream position of `data[0]` and is only used for
/// error messages. A line that would not fit in a `capacity`-byte read
/// buffer, terminator included, fails with `OversizedLine` so every driver
/// enforces the same limit. Returns the number of records ingested. Fails
/// on the first malformed or oversized line.
#[inline]
pub fn ingest_lines(
    table: &mut StationTable,
    data: &[u8],
    base_offset: u64,
    capacity: usize,
) -> Result<u64> {
    let mut records = 0u64;
    for (offset, line) in Lines::new(data, base_offset) {
        if line.len() >= capacity {
            return Err(MeasureError::OversizedLine { offset, capacity });
        }
        let (station, tenths) =
            parse_record(line).map_err(|kind| MeasureError::malformed(offset, kind, line))?;
        table.update(station, tenths);
        records += 1;
    }
    Ok(records)
}

/// Fast streaming aggregate command.
#[derive(Debug, Clone)]
pub struct FastAggregateCommand {
    buffer_size: usize,
}

impl Default for FastAggregateCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl FastAggregateCommand {
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_READ_BUFFER,
        }
    }

    /// Use a read buffer of `size` bytes (power of two).
    pub fn with_buffer_size(mut self, size: usize) -> Result<Self> {
        self.buffer_size = validate_buffer_size(size)?;
        Ok(self)
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Run aggregation on a file and write the summary.
    pub fn run<P: AsRef<Path>, W: Write>(
        &self,
        input_path: P,
        output: &mut W,
    ) -> Result<FastAggregateStats> {
        let file = File::open(input_path.as_ref())?;
        self.run_reader(file, output)
    }

    /// Aggregate the whole input, then write the summary.
    ///
    /// Nothing is written unless the input was consumed without error.
    pub fn run_reader<R: Read, W: Write>(
        &self,
        reader: R,
        output: &mut W,
    ) -> Result<FastAggregateStats> {
        let (table, stats) = self.aggregate_reader(reader)?;
        write_report(&table, output)?;
        Ok(stats)
    }

    /// Aggregate a file without writing anything.
    pub fn aggregate_path<P: AsRef<Path>>(
        &self,
        input_path: P,
    ) -> Result<(StationTable, FastAggregateStats)> {
        let file = File::open(input_path.as_ref())?;
        self.aggregate_reader(file)
    }

    /// Core driver: refill, split, parse, aggregate until end of stream.
    pub fn aggregate_reader<R: Read>(
        &self,
        reader: R,
    ) -> Result<(StationTable, FastAggregateStats)> {
        let mut chunks = ChunkReader::with_capacity(self.buffer_size, reader);
        let mut table = StationTable::new();
        let mut stats = FastAggregateStats::default();

        while let Some(chunk) = chunks.next_chunk()? {
            stats.records += ingest_lines(
                &mut table,
                chunk.as_bytes(),
                chunk.offset(),
                self.buffer_size,
            )?;
        }

        stats.stations = table.len();
        stats.bytes = chunks.bytes_read();
        stats.chunks = chunks.chunks();
        debug!(
            records = stats.records,
            stations = stats.stations,
            bytes = stats.bytes,
            chunks = stats.chunks,
            "streaming aggregation complete"
        );

        Ok((table, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurements::MalformedKind;
    use crate::report::render_report;

    fn run_to_string(cmd: &FastAggregateCommand, input: &[u8]) -> Result<String> {
        let mut output = Vec::new();
        cmd.run_reader(input, &mut output)?;
        Ok(String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_scenario_basic() {
        let out = run_to_string(&FastAggregateCommand::new(), b"A;5.0\nB;-3.2\nA;7.4\n").unwrap();
        assert_eq!(out, "{A=5.0/6.2/7.4, B=-3.2/-3.2/-3.2}\n");
    }

    #[test]
    fn test_small_buffer_matches_default() {
        let input = b"Hamburg;12.0\nBulawayo;8.9\nPalembang;38.8\nHamburg;-3.4\nBulawayo;10.1\n";
        let expected = run_to_string(&FastAggregateCommand::new(), input).unwrap();
        for size in [16, 32, 64, 128] {
            let cmd = FastAggregateCommand::new().with_buffer_size(size).unwrap();
            assert_eq!(run_to_string(&cmd, input).unwrap(), expected, "buffer {}", size);
        }
    }

    #[test]
    fn test_missing_final_terminator() {
        let out = run_to_string(&FastAggregateCommand::new(), b"A;1.0\nA;3.0").unwrap();
        assert_eq!(out, "{A=1.0/2.0/3.0}\n");
    }

    #[test]
    fn test_empty_input() {
        let (table, stats) = FastAggregateCommand::new().aggregate_reader(&b""[..]).unwrap();
        assert!(table.is_empty());
        assert_eq!(stats, FastAggregateStats::default());
        assert_eq!(render_report(&table), b"{}\n");
    }

    #[test]
    fn test_malformed_writes_nothing() {
        let mut output = Vec::new();
        let err = FastAggregateCommand::new()
            .run_reader(&b"A;1.0\nB;100.0\n"[..], &mut output)
            .unwrap_err();

        assert_eq!(err.malformed_kind(), Some(MalformedKind::InvalidValue));
        assert!(output.is_empty());
    }

    #[test]
    fn test_malformed_offset_across_chunks() {
        let input = b"A;1.0\nB;2.0\nC;3.0\nD;4.0\nE;x.0\n";
        let cmd = FastAggregateCommand::new().with_buffer_size(16).unwrap();
        match cmd.aggregate_reader(&input[..]).unwrap_err() {
            MeasureError::MalformedRecord { offset, line, .. } => {
                assert_eq!(offset, 24);
                assert_eq!(line, "E;x.0");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_line_is_malformed() {
        let err = FastAggregateCommand::new()
            .aggregate_reader(&b"A;1.0\n\nB;2.0\n"[..])
            .unwrap_err();
        assert_eq!(err.malformed_kind(), Some(MalformedKind::MissingSeparator));
    }

    #[test]
    fn test_run_on_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"A;5.0\nB;-3.2\nA;7.4\n").unwrap();
        file.flush().unwrap();

        let mut output = Vec::new();
        let stats = FastAggregateCommand::new().run(file.path(), &mut output).unwrap();
        assert_eq!(output, b"{A=5.0/6.2/7.4, B=-3.2/-3.2/-3.2}\n");
        assert_eq!(stats.records, 3);
    }

    #[test]
    fn test_ingest_lines_enforces_capacity() {
        let mut table = StationTable::new();
        let err = ingest_lines(&mut table, b"A;1.0\nLongName;1.0\n", 100, 8).unwrap_err();
        assert!(matches!(
            err,
            MeasureError::OversizedLine {
                offset: 106,
                capacity: 8
            }
        ));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_rejects_bad_buffer_size() {
        assert!(FastAggregateCommand::new().with_buffer_size(1000).is_err());
        assert!(FastAggregateCommand::new().with_buffer_size(8).is_err());
    }

    #[test]
    fn test_stats() {
        let (_, stats) = FastAggregateCommand::new()
            .aggregate_reader(&b"A;1.0\nB;2.0\nA;3.0\n"[..])
            .unwrap();
        assert_eq!(stats.records, 3);
        assert_eq!(stats.stations, 2);
        assert_eq!(stats.bytes, 18);
        assert_eq!(stats.chunks, 1);
        assert_eq!(
            stats.to_string(),
            "Records: 3, Stations: 2, Bytes: 18, Chunks: 1"
        );
    }
}
