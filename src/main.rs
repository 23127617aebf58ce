//! onebrc: per-station min/mean/max over `station;temperature` files
//!
//! Usage: onebrc <COMMAND> [OPTIONS]

use clap::{ArgAction, Parser, Subcommand};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use onebrc::commands::{
    AggregateCommand, FastAggregateCommand, GenerateCommand, GenerateConfig,
    ParallelAggregateCommand,
};
use onebrc::config::{parse_buffer_size, parse_count};
use onebrc::{write_report, MeasureError, StationTable};

#[derive(Parser)]
#[command(name = "onebrc")]
#[command(author = "Manish Kumar Bobbili")]
#[command(version)]
#[command(about = "Streaming min/mean/max aggregation of station;temperature measurements", long_about = None)]
struct Cli {
    /// Number of threads to use (default: number of CPUs)
    #[arg(long, short = 't', global = true)]
    threads: Option<usize>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate a measurements file into a sorted min/mean/max summary
    Aggregate {
        /// Input measurements file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Read buffer size, a power of two (e.g. 64K, 4M, 1G)
        #[arg(long, default_value = "4M")]
        buffer_size: String,

        /// Memory-map the input and aggregate ranges in parallel
        #[arg(long, conflicts_with = "reference")]
        parallel: bool,

        /// Use the line-at-a-time reference reader
        #[arg(long)]
        reference: bool,

        /// Print aggregation statistics to stderr
        #[arg(long)]
        stats: bool,
    },

    /// Generate a synthetic measurements file
    Generate {
        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Number of rows (supports K/M/G suffixes)
        #[arg(long, default_value = "1M")]
        rows: String,

        /// Number of distinct stations
        #[arg(long, default_value_t = 413)]
        stations: usize,

        /// Random seed for reproducibility
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("onebrc={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = configure_threads(cli.threads).and_then(|_| match cli.command {
        Commands::Aggregate {
            input,
            output,
            buffer_size,
            parallel,
            reference,
            stats,
        } => run_aggregate(input, output, buffer_size, parallel, reference, stats),

        Commands::Generate {
            output,
            rows,
            stations,
            seed,
            force,
        } => run_generate(output, rows, stations, seed, force),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn configure_threads(threads: Option<usize>) -> Result<(), MeasureError> {
    if let Some(n) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .map_err(|e| {
                MeasureError::InvalidConfig(format!("Failed to initialize thread pool: {}", e))
            })?;
    }
    Ok(())
}

fn run_aggregate(
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    buffer_size: String,
    parallel: bool,
    reference: bool,
    stats: bool,
) -> Result<(), MeasureError> {
    let buffer_size = parse_buffer_size(&buffer_size)?;
    let path = input.as_deref().filter(|p| *p != Path::new("-"));
    let start = Instant::now();

    // The whole input is aggregated before any output is opened, so a
    // failed run never leaves a truncated summary behind.
    let (table, summary): (StationTable, String) = match path {
        _ if reference => {
            let cmd = AggregateCommand::new();
            let (table, s) = match path {
                Some(path) => cmd.aggregate_path(path)?,
                None => cmd.aggregate_reader(io::stdin().lock())?,
            };
            (table, s.to_string())
        }
        Some(path) if parallel => {
            let cmd = ParallelAggregateCommand::new().with_buffer_size(buffer_size)?;
            let (table, s) = cmd.aggregate_path(path)?;
            (table, s.to_string())
        }
        _ => {
            if parallel {
                warn!("--parallel needs a seekable file, reading stdin sequentially");
            }
            let cmd = FastAggregateCommand::new().with_buffer_size(buffer_size)?;
            let (table, s) = match path {
                Some(path) => cmd.aggregate_path(path)?,
                None => cmd.aggregate_reader(io::stdin().lock())?,
            };
            (table, s.to_string())
        }
    };

    info!(
        stations = table.len(),
        records = table.total_records(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "aggregation finished"
    );

    match output {
        Some(path) => {
            let file = File::create(&path)?;
            write_report(&table, file)?;
        }
        None => {
            let stdout = io::stdout();
            write_report(&table, stdout.lock())?;
        }
    }

    if stats {
        eprintln!("Aggregate stats: {}", summary);
    }

    Ok(())
}

fn run_generate(
    output: PathBuf,
    rows: String,
    stations: usize,
    seed: u64,
    force: bool,
) -> Result<(), MeasureError> {
    let config = GenerateConfig {
        rows: parse_count(&rows)?,
        stations,
        seed,
    };

    let cmd = GenerateCommand::new(config)?;
    let stats = cmd.run(&output, force)?;
    eprintln!("Generated {}: {}", output.display(), stats);

    Ok(())
}
