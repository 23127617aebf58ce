//! onebrc: streaming min/mean/max aggregation of `station;temperature` files.
//!
//! The input is a stream of `KEY;VALUE\n` lines where `VALUE` is a signed
//! decimal with exactly one fractional digit. The output is a single sorted
//! summary line `{key=min/mean/max, ...}`.
//!
//! # Features
//!
//! - **Chunked ingestion**: fixed-size buffer refills with lines carried across
//!   chunk boundaries, no per-line allocation
//! - **Fixed-point parsing**: values are held as integer tenths, never floats
//! - **Parallel mode**: memory-mapped files split into line-aligned ranges and
//!   aggregated with Rayon
//!
//! # Example
//!
//! ```rust,no_run
//! use onebrc::commands::FastAggregateCommand;
//!
//! let cmd = FastAggregateCommand::new();
//! let mut out = std::io::stdout().lock();
//! let stats = cmd.run("measurements.txt", &mut out).unwrap();
//! eprintln!("{}", stats);
//! ```

pub mod commands;
pub mod config;
pub mod measurements;
pub mod report;
pub mod station;
pub mod streaming;

// Re-export commonly used types
pub use measurements::{MalformedKind, MeasureError, Measurement, MeasurementReader};
pub use report::{render_report, write_report};
pub use station::{StationStats, StationTable};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::commands::{
        AggregateCommand, FastAggregateCommand, GenerateCommand, ParallelAggregateCommand,
    };
    pub use crate::measurements::{MeasureError, Measurement, MeasurementReader};
    pub use crate::report::{render_report, write_report};
    pub use crate::station::{StationStats, StationTable};
}
