//! Buffer size constants for streaming operations.
//!
//! These constants control memory usage vs I/O throughput tradeoffs.

/// Default read buffer size (4 MB).
/// Large enough that refill overhead is negligible next to parsing.
pub const DEFAULT_READ_BUFFER: usize = 4 * 1024 * 1024;

/// Smallest accepted read buffer (16 bytes).
/// Only useful for exercising chunk-boundary handling in tests.
pub const MIN_READ_BUFFER: usize = 16;

/// Largest accepted read buffer (1 GB).
pub const MAX_READ_BUFFER: usize = 1024 * 1024 * 1024;

/// Default output buffer size (64 KB).
/// The summary is a single line; this only matters for very many stations.
pub const DEFAULT_OUTPUT_BUFFER: usize = 64 * 1024;

/// Initial capacity of the station table.
/// Typical inputs carry a few hundred to ten thousand distinct stations.
pub const DEFAULT_STATION_CAPACITY: usize = 1024;
