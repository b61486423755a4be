//! Shared test infrastructure for pipeline tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use primescan::config::{ScanConfig, StaggerConfig};
use primescan::input::{InputSource, RawFileSource};
use primescan::pipeline::{self, ScanError, ScanSummary};

pub fn encode(values: &[u64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Write `bytes` to a fresh file inside `dir`.
pub fn write_input(dir: &Path, bytes: &[u8]) -> PathBuf {
    let path = dir.join("input.bin");
    fs::write(&path, bytes).expect("write input");
    path
}

pub fn scan_config(workers: usize, segment_size: u64, chunk_size: u64) -> ScanConfig {
    ScanConfig {
        run_id: "integration_test".to_string(),
        workers,
        segment_size,
        chunk_size,
        queue_capacity: 8,
        stagger: StaggerConfig::disabled(),
        progress_interval_ms: 0,
    }
}

pub fn open_source(path: &Path) -> Arc<dyn InputSource> {
    Arc::new(RawFileSource::open(path).expect("open input"))
}

pub fn scan_file(path: &Path, cfg: &ScanConfig) -> Result<ScanSummary, ScanError> {
    pipeline::run_scan(cfg, open_source(path))
}

/// Scan `bytes` through a real file on disk.
pub fn scan_bytes(bytes: &[u8], workers: usize, segment_size: u64, chunk_size: u64) -> ScanSummary {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_input(dir.path(), bytes);
    scan_file(&path, &scan_config(workers, segment_size, chunk_size)).expect("scan")
}
