//! Generate synthetic measurement files for benchmarking.
//!
//! Features:
//! - Built-in catalog of weather stations with per-station mean temperatures
//! - Station counts beyond the catalog reuse names with a numeric suffix
//! - Values always within the accepted `-99.9..=99.9` range
//! - Deterministic reproducibility via seed

use crate::measurements::{MeasureError, Result};
use crate::streaming::output::write_tenths;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Buffer size for I/O operations (8MB for better throughput)
const BUF_SIZE: usize = 8 * 1024 * 1024;

/// Largest deviation from a station's mean, in tenths.
const SPREAD: i16 = 150;

/// Value bounds in tenths.
const MIN_VALUE: i16 = -999;
const MAX_VALUE: i16 = 999;

/// Station names with mean temperature in tenths of a degree.
const STATIONS: &[(&str, i16)] = &[
    ("Abha", 180),
    ("Abidjan", 260),
    ("Accra", 264),
    ("Addis Ababa", 160),
    ("Adelaide", 173),
    ("Alexandria", 200),
    ("Anchorage", 28),
    ("Athens", 192),
    ("Baghdad", 228),
    ("Bangkok", 286),
    ("Beijing", 129),
    ("Bergen", 77),
    ("Bulawayo", 189),
    ("Cairo", 214),
    ("Chihuahua", 186),
    ("Dakar", 240),
    ("Dikson", -111),
    ("Dodoma", 227),
    ("Edmonton", 42),
    ("Hamburg", 97),
    ("Honolulu", 254),
    ("İzmir", 179),
    ("Jakarta", 267),
    ("Kuopio", 34),
    ("Lhasa", 76),
    ("Lima", 199),
    ("Mexico City", 175),
    ("Murmansk", 6),
    ("Nuuk", -14),
    ("Oslo", 57),
    ("Palembang", 273),
    ("Reykjavík", 43),
    ("São Paulo", 199),
    ("St. John's", 50),
    ("Tromsø", 29),
    ("Ürümqi", 74),
    ("Yakutsk", -88),
    ("Zürich", 93),
];

/// Configuration for the generate command.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    pub rows: u64,
    pub stations: usize,
    pub seed: u64,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            rows: 1_000_000,
            stations: STATIONS.len(),
            seed: 42,
        }
    }
}

/// Statistics from generate operation.
#[derive(Debug, Default, Clone)]
pub struct GenerateStats {
    pub rows: u64,
    pub stations: usize,
    pub bytes: u64,
    pub elapsed_secs: f64,
}

impl std::fmt::Display for GenerateStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} rows over {} stations, {} bytes ({:.1}s)",
            self.rows, self.stations, self.bytes, self.elapsed_secs
        )
    }
}

/// Generate command.
pub struct GenerateCommand {
    config: GenerateConfig,
    /// Station names and means actually used, `config.stations` long
    catalog: Vec<(Vec<u8>, i16)>,
}

impl GenerateCommand {
    /// Create a new generate command with the given config.
    pub fn new(config: GenerateConfig) -> Result<Self> {
        if config.stations == 0 {
            return Err(MeasureError::InvalidConfig(
                "Station count must be at least 1".to_string(),
            ));
        }
        let catalog = build_catalog(config.stations);
        Ok(Self { config, catalog })
    }

    /// Write the file at `path`. Refuses to overwrite unless `force` is set.
    pub fn run<P: AsRef<Path>>(&self, path: P, force: bool) -> Result<GenerateStats> {
        let path = path.as_ref();
        if path.exists() && !force {
            return Err(MeasureError::InvalidConfig(format!(
                "{} already exists (use --force to overwrite)",
                path.display()
            )));
        }
        let file = File::create(path)?;
        let stats = self.write_to(file)?;
        info!(path = %path.display(), "{}", stats);
        Ok(stats)
    }

    /// Write `rows` measurement lines to any writer.
    pub fn write_to<W: Write>(&self, output: W) -> Result<GenerateStats> {
        let start = Instant::now();
        let mut writer = BufWriter::with_capacity(BUF_SIZE, output);
        let mut rng = SmallRng::seed_from_u64(self.config.seed);
        let mut itoa_buf = itoa::Buffer::new();
        let mut line = Vec::with_capacity(64);
        let mut stats = GenerateStats {
            stations: self.catalog.len(),
            ..Default::default()
        };

        for _ in 0..self.config.rows {
            let (name, mean) = &self.catalog[rng.gen_range(0..self.catalog.len())];
            let value = (mean + rng.gen_range(-SPREAD..=SPREAD)).clamp(MIN_VALUE, MAX_VALUE);

            line.clear();
            line.extend_from_slice(name);
            line.push(b';');
            write_tenths(&mut line, &mut itoa_buf, value as i64)?;
            line.push(b'\n');
            writer.write_all(&line)?;

            stats.rows += 1;
            stats.bytes += line.len() as u64;
        }

        writer.flush()?;
        stats.elapsed_secs = start.elapsed().as_secs_f64();
        Ok(stats)
    }
}

/// Pick `count` distinct station names, suffixing repeats of the catalog.
fn build_catalog(count: usize) -> Vec<(Vec<u8>, i16)> {
    (0..count)
        .map(|i| {
            let (name, mean) = STATIONS[i % STATIONS.len()];
            let round = i / STATIONS.len();
            let name = if round == 0 {
                name.to_string()
            } else {
                format!("{} {}", name, round + 1)
            };
            (name.into_bytes(), mean)
        })
        .collect()
}
