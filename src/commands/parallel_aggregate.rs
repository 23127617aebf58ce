//! Parallel aggregation over a memory-mapped file.
//!
//! Optimizations:
//! - Memory-mapped input, no read buffer or copying
//! - File split into byte ranges whose boundaries are moved forward to the
//!   next line start, so no line is ever split between workers
//! - One station table per range on the Rayon pool, merged in range order
//!
//! min/max/sum/count merge exactly and rounding only happens when the
//! summary is written, so the output is byte-identical to the sequential
//! driver. Small files and stdin go through the sequential driver.

use crate::commands::fast_aggregate::{ingest_lines, FastAggregateCommand};
use crate::measurements::Result;
use crate::report::write_report;
use crate::station::StationTable;
use memchr::memchr;
use memmap2::Mmap;
use rayon::prelude::*;
use std::fs::File;
use std::io::Write;
use std::ops::Range;
use std::path::Path;
use tracing::debug;

/// Minimum file size to use mmap (smaller files use the sequential driver)
const MMAP_THRESHOLD: usize = 1024 * 1024;

/// Smallest range worth handing to a worker
const MIN_PARTITION_SIZE: usize = 64 * 1024;

/// Statistics from a parallel aggregation run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParallelAggregateStats {
    pub records: u64,
    pub stations: usize,
    pub bytes: u64,
    pub partitions: usize,
    pub used_mmap: bool,
}

impl std::fmt::Display for ParallelAggregateStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Records: {}, Stations: {}, Bytes: {}, Partitions: {}, Mmap: {}",
            self.records,
            self.stations,
            self.bytes,
            self.partitions,
            if self.used_mmap { "yes" } else { "no" }
        )
    }
}

/// Split `data` into at most `parts` ranges that each start at a line start.
///
/// Every range except possibly the last ends just past a `\n`. The ranges
/// cover `data` exactly, in order.
pub fn partition_bounds(data: &[u8], parts: usize) -> Vec<Range<usize>> {
    let len = data.len();
    let step = len.div_ceil(parts.max(1)).max(1);
    let mut bounds = Vec::with_capacity(parts.max(1));
    let mut start = 0;

    while start < len {
        let target = start + step;
        let end = if target >= len {
            len
        } else {
            match memchr(b'\n', &data[target - 1..]) {
                Some(newline) => target + newline,
                None => len,
            }
        };
        bounds.push(start..end);
        start = end;
    }

    bounds
}

/// Parallel aggregate command.
#[derive(Debug, Clone)]
pub struct ParallelAggregateCommand {
    /// Number of ranges; defaults to the Rayon pool size
    partitions: Option<usize>,
    mmap_threshold: usize,
    min_partition_size: usize,
    sequential: FastAggregateCommand,
}

impl Default for ParallelAggregateCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl ParallelAggregateCommand {
    pub fn new() -> Self {
        Self {
            partitions: None,
            mmap_threshold: MMAP_THRESHOLD,
            min_partition_size: MIN_PARTITION_SIZE,
            sequential: FastAggregateCommand::new(),
        }
    }

    /// Use exactly `n` ranges instead of one per Rayon thread.
    pub fn with_partitions(mut self, n: usize) -> Self {
        self.partitions = Some(n.max(1));
        self
    }

    /// Files at least this large are memory-mapped and split.
    pub fn with_mmap_threshold(mut self, bytes: usize) -> Self {
        self.mmap_threshold = bytes;
        self
    }

    /// Never create ranges smaller than this (except the last one).
    pub fn with_min_partition_size(mut self, bytes: usize) -> Self {
        self.min_partition_size = bytes.max(1);
        self
    }

    /// Read buffer for the sequential fallback. Also the longest line, terminator
    /// included, that the mapped path accepts.
    pub fn with_buffer_size(mut self, size: usize) -> Result<Self> {
        self.sequential = self.sequential.with_buffer_size(size)?;
        Ok(self)
    }

    /// Run aggregation on a file and write the summary.
    pub fn run<P: AsRef<Path>, W: Write>(
        &self,
        input_path: P,
        output: &mut W,
    ) -> Result<ParallelAggregateStats> {
        let (table, stats) = self.aggregate_path(input_path)?;
        write_report(&table, output)?;
        Ok(stats)
    }

    /// Aggregate a file without writing anything.
    pub fn aggregate_path<P: AsRef<Path>>(
        &self,
        input_path: P,
    ) -> Result<(StationTable, ParallelAggregateStats)> {
        let file = File::open(input_path.as_ref())?;
        let file_size = file.metadata()?.len() as usize;

        if file_size == 0 || file_size < self.mmap_threshold {
            let (table, seq) = self.sequential.aggregate_reader(file)?;
            let stats = ParallelAggregateStats {
                records: seq.records,
                stations: seq.stations,
                bytes: seq.bytes,
                partitions: 1,
                used_mmap: false,
            };
            return Ok((table, stats));
        }

        // The map is read-only and dropped before this function returns.
        let mmap = unsafe { Mmap::map(&file)? };
        let (table, mut stats) = self.aggregate_bytes(&mmap)?;
        stats.used_mmap = true;
        Ok((table, stats))
    }

    /// Aggregate an in-memory buffer, splitting it across the Rayon pool.
    pub fn aggregate_bytes(&self, data: &[u8]) -> Result<(StationTable, ParallelAggregateStats)> {
        let wanted = self
            .partitions
            .unwrap_or_else(rayon::current_num_threads)
            .max(1);
        let parts = wanted.min(data.len() / self.min_partition_size).max(1);
        let bounds = partition_bounds(data, parts);
        let capacity = self.sequential.buffer_size();
        debug!(
            bytes = data.len(),
            partitions = bounds.len(),
            "partitioned input"
        );

        let results: Vec<Result<(StationTable, u64)>> = bounds
            .par_iter()
            .map(|range| {
                let mut table = StationTable::new();
                let records =
                    ingest_lines(&mut table, &data[range.clone()], range.start as u64, capacity)?;
                Ok((table, records))
            })
            .collect();

        // Merge in range order so the earliest error wins.
        let mut table = StationTable::new();
        let mut stats = ParallelAggregateStats {
            bytes: data.len() as u64,
            partitions: bounds.len(),
            ..Default::default()
        };
        for result in results {
            let (part, records) = result?;
            table.merge(part);
            stats.records += records;
        }
        stats.stations = table.len();

        debug!(
            records = stats.records,
            stations = stats.stations,
            "parallel aggregation complete"
        );
        Ok((table, stats))
    }
}
