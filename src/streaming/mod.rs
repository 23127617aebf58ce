//! Centralized streaming utilities.
//!
//! This module provides the shared components of every aggregation path:
//! - Chunked line reading with partial lines carried across refills
//! - Zero-allocation fixed-point measurement parsing
//! - Summary output formatting
//!
//! Memory is O(buffer + distinct stations) regardless of input size.

pub mod buffers;
pub mod chunks;
pub mod output;
pub mod parsing;

pub use chunks::{Chunk, ChunkReader, Lines, ScanState};
pub use output::{write_tenths, SummaryWriter, Tenths};
pub use parsing::{parse_record, parse_tenths};
