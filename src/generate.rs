//! # Test Data Generator
//!
//! Writes a flat file of little-endian u64 values plus a text sidecar with
//! the first values in decimal, for exercising the scan pipeline.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::constants::SIDECAR_PREVIEW_LEN;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("minimum value {min} cannot be greater than maximum value {max}")]
    InvalidRange { min: u64, max: u64 },
    #[error("number of samples ({count}) cannot exceed the range size ({range})")]
    TooManySamples { count: u64, range: u64 },
    #[error("cannot create {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed writing {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct GenerateConfig {
    pub min: u64,
    pub max: u64,
    pub count: u64,
    /// Draw uniformly with replacement instead of cycling through the range
    pub randomize: bool,
    pub seed: Option<u64>,
    pub output: PathBuf,
    pub sidecar: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateSummary {
    pub output: PathBuf,
    pub sidecar: PathBuf,
    pub values_written: u64,
    pub bytes_written: u64,
}

impl GenerateConfig {
    pub fn validate(&self) -> Result<(), GenerateError> {
        if self.min > self.max {
            return Err(GenerateError::InvalidRange {
                min: self.min,
                max: self.max,
            });
        }
        // A full u64 span is not representable; any count fits in it.
        if let Some(range) = (self.max - self.min).checked_add(1) {
            if self.count > range {
                return Err(GenerateError::TooManySamples {
                    count: self.count,
                    range,
                });
            }
        }
        Ok(())
    }
}

/// Value at position `index` in sequential mode.
pub fn sequential_value(min: u64, max: u64, index: u64) -> u64 {
    match (max - min).checked_add(1) {
        Some(span) => min + index % span,
        None => min.wrapping_add(index),
    }
}

pub fn generate_file(cfg: &GenerateConfig) -> Result<GenerateSummary, GenerateError> {
    cfg.validate()?;

    let mut binary = create_writer(&cfg.output)?;
    let mut sidecar = create_writer(&cfg.sidecar)?;
    let mut rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    for i in 0..cfg.count {
        let value = if cfg.randomize {
            rng.random_range(cfg.min..=cfg.max)
        } else {
            sequential_value(cfg.min, cfg.max, i)
        };

        binary
            .write_all(&value.to_le_bytes())
            .map_err(|source| write_error(&cfg.output, source))?;

        if i < SIDECAR_PREVIEW_LEN {
            writeln!(sidecar, "{value}").map_err(|source| write_error(&cfg.sidecar, source))?;
        }
    }

    binary
        .flush()
        .map_err(|source| write_error(&cfg.output, source))?;
    sidecar
        .flush()
        .map_err(|source| write_error(&cfg.sidecar, source))?;

    let summary = GenerateSummary {
        output: cfg.output.clone(),
        sidecar: cfg.sidecar.clone(),
        values_written: cfg.count,
        bytes_written: cfg.count * 8,
    };
    info!(
        "generated {} values in [{}, {}] randomize={} output={}",
        summary.values_written,
        cfg.min,
        cfg.max,
        cfg.randomize,
        summary.output.display()
    );
    Ok(summary)
}

fn create_writer(path: &Path) -> Result<BufWriter<File>, GenerateError> {
    let file = File::create(path).map_err(|source| GenerateError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufWriter::new(file))
}

fn write_error(path: &Path, source: std::io::Error) -> GenerateError {
    GenerateError::Write {
        path: path.to_path_buf(),
        source,
    }
}
