//! # Utility Module
//!
//! Glue between the command line, the configuration file and the library
//! entry points.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Result, anyhow};
use tracing::warn;

use crate::cli::CliOptions;
use crate::config::ScanConfig;
use crate::generate::GenerateConfig;
use crate::pipeline::{LogProgress, ProgressConfig};

/// Apply CLI overrides on top of the loaded configuration.
pub fn apply_cli_overrides(cfg: &mut ScanConfig, opts: &CliOptions) {
    if let Some(workers) = opts.workers {
        cfg.workers = workers;
    }
    if let Some(segment_size) = opts.segment_size {
        cfg.segment_size = segment_size;
    }
    if let Some(chunk_size) = opts.chunk_size {
        cfg.chunk_size = chunk_size;
    }
    if opts.no_stagger {
        cfg.stagger.max_ms = 0;
        cfg.stagger.min_ms = 0;
    }
    if let Some(seed) = opts.stagger_seed {
        cfg.stagger.seed = Some(seed);
    }
    if let Some(ms) = opts.progress_ms {
        cfg.progress_interval_ms = ms;
    }
}

/// Validate `cfg` and log every accepted-but-suspicious setting.
pub fn check_scan_config(cfg: &ScanConfig) -> Result<()> {
    cfg.validate()?;
    for warning in cfg.warnings() {
        warn!("{warning}");
    }
    Ok(())
}

pub fn generate_config_from_cli(opts: &CliOptions) -> GenerateConfig {
    GenerateConfig {
        min: opts.min,
        max: opts.max,
        count: opts.count,
        randomize: opts.random,
        seed: opts.seed,
        output: opts.output.clone(),
        sidecar: opts.sidecar.clone(),
    }
}

pub fn progress_from_config(cfg: &ScanConfig) -> Option<ProgressConfig> {
    if cfg.progress_interval_ms == 0 {
        return None;
    }
    Some(ProgressConfig {
        reporter: Arc::new(LogProgress),
        interval: Duration::from_millis(cfg.progress_interval_ms),
    })
}

/// Install a Ctrl+C handler that raises the returned flag.
pub fn install_cancel_handler() -> Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = flag.clone();
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::Relaxed);
    })
    .map_err(|err| anyhow!("failed to install Ctrl+C handler: {err}"))?;
    Ok(flag)
}
