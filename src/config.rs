use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::constants::{
    DEFAULT_CHUNK_SIZE, DEFAULT_QUEUE_CAPACITY, DEFAULT_SEGMENT_SIZE, DEFAULT_WORKERS, RECORD_SIZE,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be a positive integer")]
    NotPositive(&'static str),
    #[error("{0} does not fit in memory on this platform")]
    TooLarge(&'static str),
    #[error("stagger.min_ms ({min}) is greater than stagger.max_ms ({max})")]
    StaggerRange { min: u64, max: u64 },
}

/// Random per-worker startup delay, drawn from `[min_ms, max_ms]`.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct StaggerConfig {
    pub min_ms: u64,
    pub max_ms: u64,
    pub seed: Option<u64>,
}

impl StaggerConfig {
    pub fn disabled() -> Self {
        Self {
            min_ms: 0,
            max_ms: 0,
            seed: None,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.max_ms == 0
    }
}

impl Default for StaggerConfig {
    fn default() -> Self {
        Self {
            min_ms: 400,
            max_ms: 600,
            seed: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScanConfig {
    pub run_id: String,
    pub workers: usize,
    pub segment_size: u64,
    pub chunk_size: u64,
    pub queue_capacity: usize,
    pub stagger: StaggerConfig,
    pub progress_interval_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            run_id: String::new(),
            workers: DEFAULT_WORKERS,
            segment_size: DEFAULT_SEGMENT_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            stagger: StaggerConfig::default(),
            progress_interval_ms: 0,
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NotPositive("workers (M)"));
        }
        if self.segment_size == 0 {
            return Err(ConfigError::NotPositive("segment_size (N)"));
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::NotPositive("chunk_size (C)"));
        }
        if usize::try_from(self.chunk_size.min(self.segment_size)).is_err() {
            return Err(ConfigError::TooLarge("chunk_size (C)"));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::NotPositive("queue_capacity"));
        }
        if !self.stagger.is_disabled() && self.stagger.min_ms > self.stagger.max_ms {
            return Err(ConfigError::StaggerRange {
                min: self.stagger.min_ms,
                max: self.stagger.max_ms,
            });
        }
        Ok(())
    }

    /// Settings that are accepted but change what gets counted or how well
    /// the run performs.
    pub fn warnings(&self) -> Vec<String> {
        let record = RECORD_SIZE as u64;
        let mut out = Vec::new();
        if self.chunk_size < self.segment_size && self.chunk_size % record != 0 {
            out.push(format!(
                "chunk_size {} is not a multiple of {record}; records straddling chunk boundaries will not be counted",
                self.chunk_size
            ));
        }
        if self.segment_size % record != 0 {
            out.push(format!(
                "segment_size {} is not a multiple of {record}; records straddling segment boundaries will not be counted",
                self.segment_size
            ));
        }
        if self.chunk_size > self.segment_size {
            out.push(format!(
                "chunk_size {} exceeds segment_size {}; each segment is read in a single chunk",
                self.chunk_size, self.segment_size
            ));
        }
        let cpus = num_cpus::get();
        if self.workers > cpus {
            out.push(format!(
                "workers {} exceeds available cpus {cpus}",
                self.workers
            ));
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: ScanConfig,
    pub config_hash: String,
}

pub fn load_config(path: Option<&Path>) -> Result<LoadedConfig> {
    let bytes: Vec<u8> = if let Some(p) = path {
        std::fs::read(p).with_context(|| format!("reading config {}", p.display()))?
    } else {
        include_bytes!("../config/default.yml").to_vec()
    };

    let mut config: ScanConfig = serde_yaml::from_slice(&bytes).context("parsing config")?;
    if config.run_id.trim().is_empty() {
        config.run_id = generate_run_id();
    }

    let config_hash = hash_bytes(&bytes);

    Ok(LoadedConfig {
        config,
        config_hash,
    })
}

fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    hex::encode(digest)
}

fn generate_run_id() -> String {
    let now = chrono::Utc::now();
    format!("{}_{}", now.format("%Y%m%dT%H%M%SZ"), rand_suffix())
}

fn rand_suffix() -> String {
    format!("{:08x}", rand::random::<u32>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_matches_documented_defaults() {
        let loaded = load_config(None).expect("config");
        let cfg = loaded.config;
        assert_eq!(cfg.workers, 1);
        assert_eq!(cfg.segment_size, 65_536);
        assert_eq!(cfg.chunk_size, 1024);
        assert_eq!(cfg.queue_capacity, 100);
        assert_eq!(cfg.stagger.min_ms, 400);
        assert_eq!(cfg.stagger.max_ms, 600);
        assert!(!cfg.run_id.is_empty());
        assert_eq!(loaded.config_hash.len(), 64);
        cfg.validate().expect("default config is valid");
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "run_id: custom\nworkers: 4\nstagger:\n  max_ms: 0").expect("write");
        let loaded = load_config(Some(file.path())).expect("config");
        assert_eq!(loaded.config.run_id, "custom");
        assert_eq!(loaded.config.workers, 4);
        assert_eq!(loaded.config.chunk_size, 1024);
        assert!(loaded.config.stagger.is_disabled());
        loaded.config.validate().expect("max_ms 0 disables the stagger");
    }

    #[test]
    fn rejects_zero_sizes() {
        let mut cfg = ScanConfig::default();
        cfg.chunk_size = 0;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::NotPositive("chunk_size (C)"))
        );

        let mut cfg = ScanConfig::default();
        cfg.workers = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = ScanConfig::default();
        cfg.segment_size = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_inverted_stagger() {
        let mut cfg = ScanConfig::default();
        cfg.stagger.min_ms = 10;
        cfg.stagger.max_ms = 5;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::StaggerRange { min: 10, max: 5 })
        );
    }

    #[test]
    fn warns_on_unaligned_chunk_size() {
        let mut cfg = ScanConfig::default();
        cfg.chunk_size = 12;
        let warnings = cfg.warnings();
        assert!(warnings.iter().any(|w| w.contains("chunk_size 12")));
        cfg.validate().expect("unaligned chunk size is still accepted");
    }

    #[test]
    fn single_chunk_segments_skip_chunk_alignment_warning() {
        let mut cfg = ScanConfig::default();
        cfg.segment_size = 64;
        cfg.chunk_size = 100;
        let warnings = cfg.warnings();
        assert!(!warnings.iter().any(|w| w.contains("chunk boundaries")));
        assert!(warnings.iter().any(|w| w.contains("exceeds segment_size")));
    }

    #[test]
    fn warns_when_chunk_exceeds_segment() {
        let mut cfg = ScanConfig::default();
        cfg.segment_size = 16;
        cfg.chunk_size = 64;
        assert!(cfg.warnings().iter().any(|w| w.contains("exceeds segment_size")));
    }
}
