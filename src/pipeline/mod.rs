//! # Pipeline Module
//!
//! Partition, dispatch and aggregate. A dispatcher thread plans segments
//! into a bounded task queue, `M` workers scan them and push counts into a
//! bounded result queue, and the aggregator reduces those counts once the
//! completion coordinator has closed the result queue.

pub mod aggregate;
pub mod coordinator;
pub mod events;
pub mod workers;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Sender, bounded};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{ConfigError, ScanConfig};
use crate::constants::MIB;
use crate::input::{InputError, InputSource};
use crate::segment::{Segment, SegmentIter, segment_count};

use coordinator::{CompletionCoordinator, ScanControl};
use events::{AggregateReport, SegmentResult};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("worker {worker} failed on segment {segment_id} [{start}..{end}): {source}")]
    Segment {
        worker: usize,
        segment_id: u64,
        start: u64,
        end: u64,
        #[source]
        source: InputError,
    },
    #[error("worker {worker} panicked")]
    WorkerPanicked { worker: usize },
    #[error("{0} thread panicked")]
    ThreadPanicked(&'static str),
    #[error("scan cancelled after {processed} of {expected} segments")]
    Cancelled { processed: u64, expected: u64 },
    #[error("scan incomplete: {processed} of {expected} segments reported")]
    Incomplete { processed: u64, expected: u64 },
    #[error("aggregator exited without reporting a total")]
    MissingTotal,
}

/// Outcome of a successful scan
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    pub total_primes: u64,
    pub records_scanned: u64,
    pub bytes_scanned: u64,
    pub segments_processed: u64,
    pub workers: usize,
    pub elapsed_seconds: f64,
    pub throughput_mib: f64,
}

/// Progress snapshot reported during a run.
#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    pub bytes_scanned: u64,
    pub total_bytes: u64,
    pub segments_processed: u64,
    pub primes_found: u64,
    pub elapsed_seconds: f64,
    pub throughput_mib: f64,
    /// Completion percentage (0.0 - 100.0)
    pub completion_pct: f64,
}

impl ProgressSnapshot {
    fn new(report: &AggregateReport, total_bytes: u64, start_time: &Instant) -> Self {
        let elapsed_seconds = start_time.elapsed().as_secs_f64();
        let completion_pct = if total_bytes > 0 {
            (report.bytes_scanned as f64 / total_bytes as f64) * 100.0
        } else {
            0.0
        };
        Self {
            bytes_scanned: report.bytes_scanned,
            total_bytes,
            segments_processed: report.segments_processed,
            primes_found: report.total_primes,
            elapsed_seconds,
            throughput_mib: throughput_mib(report.bytes_scanned, elapsed_seconds),
            completion_pct,
        }
    }
}

/// Progress callback trait for long-running scans.
pub trait ProgressReporter: Send + Sync {
    fn on_progress(&self, snapshot: &ProgressSnapshot);
}

pub struct ProgressConfig {
    pub reporter: Arc<dyn ProgressReporter>,
    pub interval: Duration,
}

/// Reports progress through `tracing` at info level.
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn on_progress(&self, snapshot: &ProgressSnapshot) {
        info!(
            "progress {:.1}% bytes={}/{} segments={} primes={} throughput={:.2} MiB/s",
            snapshot.completion_pct,
            snapshot.bytes_scanned,
            snapshot.total_bytes,
            snapshot.segments_processed,
            snapshot.primes_found,
            snapshot.throughput_mib
        );
    }
}

/// Count the primes stored in `source`.
pub fn run_scan(cfg: &ScanConfig, source: Arc<dyn InputSource>) -> Result<ScanSummary, ScanError> {
    PipelineRunner::new(cfg, source, None, None).run()
}

/// Run the scan with an external cancellation flag (e.g., Ctrl+C).
///
/// A cancelled run fails with [`ScanError::Cancelled`]; no partial total is
/// reported.
pub fn run_scan_with_cancel(
    cfg: &ScanConfig,
    source: Arc<dyn InputSource>,
    cancel_flag: Arc<AtomicBool>,
    progress: Option<ProgressConfig>,
) -> Result<ScanSummary, ScanError> {
    PipelineRunner::new(cfg, source, Some(cancel_flag), progress).run()
}

struct PipelineRunner<'a> {
    cfg: &'a ScanConfig,
    source: Arc<dyn InputSource>,
    cancel_flag: Option<Arc<AtomicBool>>,
    progress: Option<ProgressConfig>,
}

impl<'a> PipelineRunner<'a> {
    fn new(
        cfg: &'a ScanConfig,
        source: Arc<dyn InputSource>,
        cancel_flag: Option<Arc<AtomicBool>>,
        progress: Option<ProgressConfig>,
    ) -> Self {
        Self {
            cfg,
            source,
            cancel_flag,
            progress,
        }
    }

    fn run(mut self) -> Result<ScanSummary, ScanError> {
        self.cfg.validate()?;
        // A segment never needs more than one segment's worth of buffer.
        let chunk_size = usize::try_from(self.cfg.chunk_size.min(self.cfg.segment_size))
            .map_err(|_| ConfigError::TooLarge("chunk_size (C)"))?;

        let total_bytes = self.source.len();
        let expected_segments = segment_count(total_bytes, self.cfg.segment_size);
        info!(
            "starting scan run_id={} bytes={} segments={} workers={} segment_size={} chunk_size={}",
            self.cfg.run_id,
            total_bytes,
            expected_segments,
            self.cfg.workers,
            self.cfg.segment_size,
            self.cfg.chunk_size
        );

        let start_time = Instant::now();
        let control = Arc::new(ScanControl::new(self.cancel_flag.clone()));
        let (task_tx, task_rx) = bounded::<Segment>(self.cfg.queue_capacity);
        let (result_tx, result_rx) = bounded::<SegmentResult>(self.cfg.queue_capacity);
        let (done_tx, done_rx) = bounded::<AggregateReport>(1);

        let worker_handles = workers::spawn_scan_workers(
            self.cfg.workers,
            self.source.clone(),
            chunk_size,
            self.cfg.stagger,
            task_rx,
            &result_tx,
            control.clone(),
        );
        let coordinator = CompletionCoordinator::new(worker_handles, result_tx, control.clone());

        let aggregator =
            aggregate::spawn_aggregator(result_rx, done_tx, self.progress.take(), total_bytes);
        let dispatcher =
            spawn_dispatcher(total_bytes, self.cfg.segment_size, task_tx, control.clone());

        coordinator.wait();

        let dispatched = dispatcher
            .join()
            .map_err(|_| ScanError::ThreadPanicked("dispatcher"))?;
        let report = done_rx.recv().map_err(|_| ScanError::MissingTotal);
        aggregator
            .join()
            .map_err(|_| ScanError::ThreadPanicked("aggregator"))?;

        if let Some(err) = control.take_error() {
            return Err(err);
        }
        let report = report?;
        if report.segments_processed != expected_segments {
            if control.cancelled() {
                info!("shutdown requested; scan abandoned");
                return Err(ScanError::Cancelled {
                    processed: report.segments_processed,
                    expected: expected_segments,
                });
            }
            return Err(ScanError::Incomplete {
                processed: report.segments_processed,
                expected: expected_segments,
            });
        }
        debug!(dispatched, "dispatcher finished");

        let elapsed_seconds = start_time.elapsed().as_secs_f64();
        let summary = ScanSummary {
            total_primes: report.total_primes,
            records_scanned: report.records_scanned,
            bytes_scanned: report.bytes_scanned,
            segments_processed: report.segments_processed,
            workers: self.cfg.workers,
            elapsed_seconds,
            throughput_mib: throughput_mib(report.bytes_scanned, elapsed_seconds),
        };

        info!(
            "run_summary total_primes={} records_scanned={} bytes_scanned={} segments_processed={} elapsed={:.3}s",
            summary.total_primes,
            summary.records_scanned,
            summary.bytes_scanned,
            summary.segments_processed,
            summary.elapsed_seconds
        );

        Ok(summary)
    }
}

/// Push planned segments into the task queue in order, then close it by
/// dropping the sender. Returns the number of segments dispatched.
fn spawn_dispatcher(
    total_bytes: u64,
    segment_size: u64,
    task_tx: Sender<Segment>,
    control: Arc<ScanControl>,
) -> thread::JoinHandle<u64> {
    thread::spawn(move || {
        let mut dispatched = 0u64;
        for segment in SegmentIter::new(total_bytes, segment_size) {
            if control.should_stop() {
                debug!("stop requested; dispatcher exiting at segment {}", segment.id);
                break;
            }
            if task_tx.send(segment).is_err() {
                debug!("task queue closed; dispatcher exiting at segment {}", segment.id);
                break;
            }
            dispatched += 1;
        }
        dispatched
    })
}

fn throughput_mib(bytes: u64, elapsed_seconds: f64) -> f64 {
    if elapsed_seconds > 0.0 {
        bytes as f64 / MIB as f64 / elapsed_seconds
    } else {
        0.0
    }
}
