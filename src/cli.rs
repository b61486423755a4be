use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CliOptions {
    /// Path to the binary file of little-endian u64 values
    #[arg(long)]
    pub pathname: Option<PathBuf>,

    /// Number of worker threads (overrides config)
    #[arg(short = 'M', long)]
    pub workers: Option<usize>,

    /// Segment size in bytes (overrides config)
    #[arg(short = 'N', long)]
    pub segment_size: Option<u64>,

    /// Chunk size in bytes (overrides config)
    #[arg(short = 'C', long)]
    pub chunk_size: Option<u64>,

    /// Optional path to config file (YAML)
    #[arg(long)]
    pub config_path: Option<PathBuf>,

    /// Start all workers immediately
    #[arg(long)]
    pub no_stagger: bool,

    /// Seed for the worker startup stagger
    #[arg(long)]
    pub stagger_seed: Option<u64>,

    /// Log progress every N milliseconds (overrides config)
    #[arg(long)]
    pub progress_ms: Option<u64>,

    /// Result output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output_format: OutputFormat,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,

    /// Generate a test data file instead of scanning
    #[arg(long)]
    pub generate: bool,

    /// Minimum value to write
    #[arg(long, default_value_t = 0)]
    pub min: u64,

    /// Maximum value to write
    #[arg(long, default_value_t = 1_000_000)]
    pub max: u64,

    /// How many values to write
    #[arg(long, alias = "rng", default_value_t = 1_000_000)]
    pub count: u64,

    /// Generate values randomly (true) or sequentially (false)
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    pub random: bool,

    /// Seed for random generation
    #[arg(long)]
    pub seed: Option<u64>,

    /// Generated data file
    #[arg(long, default_value = "newgen.dat")]
    pub output: PathBuf,

    /// Text file listing the first generated values
    #[arg(long, default_value = "readmeGEN.txt")]
    pub sidecar: PathBuf,
}

pub fn parse() -> CliOptions {
    CliOptions::parse()
}
