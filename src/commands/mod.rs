//! Command implementations for onebrc.

pub mod aggregate;
pub mod fast_aggregate;
pub mod generate;
pub mod parallel_aggregate;

pub use aggregate::{AggregateCommand, AggregateStats};
pub use fast_aggregate::{ingest_lines, FastAggregateCommand, FastAggregateStats};
pub use generate::{GenerateCommand, GenerateConfig, GenerateStats};
pub use parallel_aggregate::{partition_bounds, ParallelAggregateCommand, ParallelAggregateStats};
