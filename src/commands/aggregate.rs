//! Line-at-a-time aggregation through [`MeasurementReader`].
//!
//! Each line becomes an owned `Measurement` before it is aggregated. This is
//! slower than [`FastAggregateCommand`](super::FastAggregateCommand) but has no
//! line-length limit and keeps the parsing path easy to audit, which makes it
//! the reference the fast paths are checked against.

use crate::measurements::{MeasurementReader, Result};
use crate::report::write_report;
use crate::station::StationTable;
use std::io::{Read, Write};
use std::path::Path;

/// Statistics from a reference aggregation run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AggregateStats {
    pub records: u64,
    pub stations: usize,
    pub bytes: u64,
}

impl std::fmt::Display for AggregateStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Records: {}, Stations: {}, Bytes: {}",
            self.records, self.stations, self.bytes
        )
    }
}

/// Reference aggregate command.
#[derive(Debug, Clone, Default)]
pub struct AggregateCommand;

impl AggregateCommand {
    pub fn new() -> Self {
        Self
    }

    /// Run aggregation on a file and write the summary.
    pub fn run<P: AsRef<Path>, W: Write>(
        &self,
        input_path: P,
        output: &mut W,
    ) -> Result<AggregateStats> {
        let (table, stats) = self.aggregate_path(input_path)?;
        write_report(&table, output)?;
        Ok(stats)
    }

    pub fn run_reader<R: Read, W: Write>(&self, reader: R, output: &mut W) -> Result<AggregateStats> {
        let (table, stats) = self.aggregate_reader(reader)?;
        write_report(&table, output)?;
        Ok(stats)
    }

    /// Aggregate a file without writing anything.
    pub fn aggregate_path<P: AsRef<Path>>(
        &self,
        input_path: P,
    ) -> Result<(StationTable, AggregateStats)> {
        self.aggregate_measurements(MeasurementReader::from_path(input_path)?)
    }

    pub fn aggregate_reader<R: Read>(&self, reader: R) -> Result<(StationTable, AggregateStats)> {
        self.aggregate_measurements(MeasurementReader::new(reader))
    }

    fn aggregate_measurements<R: Read>(
        &self,
        mut measurements: MeasurementReader<R>,
    ) -> Result<(StationTable, AggregateStats)> {
        let mut table = StationTable::new();
        let mut stats = AggregateStats::default();

        while let Some(m) = measurements.read_measurement()? {
            table.update(&m.station, m.tenths);
            stats.records += 1;
        }

        stats.stations = table.len();
        stats.bytes = measurements.offset();
        Ok((table, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::FastAggregateCommand;
    use crate::report::render_report;

    #[test]
    fn test_reference_scenario() {
        let mut output = Vec::new();
        let stats = AggregateCommand::new()
            .run_reader(&b"A;5.0\nB;-3.2\nA;7.4\n"[..], &mut output)
            .unwrap();

        assert_eq!(output, b"{A=5.0/6.2/7.4, B=-3.2/-3.2/-3.2}\n");
        assert_eq!(stats.records, 3);
        assert_eq!(stats.bytes, 19);
    }

    #[test]
    fn test_agrees_with_fast_path() {
        let input = "Abha;-23.0\nAccra;64.4\nAbha;5.5\nAdana;12.2\nAccra;-0.1\nAdana;12.2";
        let (reference, _) = AggregateCommand::new()
            .aggregate_reader(input.as_bytes())
            .unwrap();
        let (fast, _) = FastAggregateCommand::new()
            .with_buffer_size(16)
            .unwrap()
            .aggregate_reader(input.as_bytes())
            .unwrap();

        assert_eq!(render_report(&reference), render_report(&fast));
    }

    #[test]
    fn test_long_lines_have_no_limit() {
        let name = "x".repeat(10_000);
        let input = format!("{};1.0\n", name);
        let (table, _) = AggregateCommand::new()
            .aggregate_reader(input.as_bytes())
            .unwrap();
        assert_eq!(table.get(name.as_bytes()).unwrap().count, 1);
    }

    #[test]
    fn test_run_on_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"Oslo;-1.5\nOslo;2.5\n").unwrap();
        file.flush().unwrap();

        let mut output = Vec::new();
        let stats = AggregateCommand::new().run(file.path(), &mut output).unwrap();
        assert_eq!(output, b"{Oslo=-1.5/0.5/2.5}\n");
        assert_eq!(stats.records, 2);
        assert!(AggregateCommand::new()
            .aggregate_path("/nonexistent/measurements.txt")
            .is_err());
    }

    #[test]
    fn test_malformed_fails_fast() {
        let mut output = Vec::new();
        let result = AggregateCommand::new().run_reader(&b"A;1.0\nB;1.25\n"[..], &mut output);
        assert!(result.is_err());
        assert!(output.is_empty());
    }
}
