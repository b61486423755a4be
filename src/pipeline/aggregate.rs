//! # Aggregator
//!
//! Drains per-segment results into the running total.

use std::thread;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};
use tracing::warn;

use super::events::{AggregateReport, SegmentResult};
use super::{ProgressConfig, ProgressSnapshot};

/// Running total. Owned by the aggregator thread only.
#[derive(Debug, Default)]
pub struct Aggregator {
    report: AggregateReport,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, result: &SegmentResult) {
        self.report.total_primes += result.primes;
        self.report.records_scanned += result.records;
        self.report.bytes_scanned += result.segment.length;
        self.report.segments_processed += 1;
    }

    pub fn current(&self) -> &AggregateReport {
        &self.report
    }

    pub fn finish(self) -> AggregateReport {
        self.report
    }
}

/// Spawn the aggregator. It returns once the result queue is both empty
/// and closed, after sending one report on `done_tx`.
pub fn spawn_aggregator(
    rx: Receiver<SegmentResult>,
    done_tx: Sender<AggregateReport>,
    progress: Option<ProgressConfig>,
    total_bytes: u64,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut aggregator = Aggregator::new();
        let start_time = Instant::now();
        let mut last_progress = Instant::now();

        for result in rx {
            aggregator.add(&result);
            if let Some(progress) = &progress {
                if progress.interval.is_zero() || last_progress.elapsed() >= progress.interval {
                    let snapshot =
                        ProgressSnapshot::new(aggregator.current(), total_bytes, &start_time);
                    progress.reporter.on_progress(&snapshot);
                    last_progress = Instant::now();
                }
            }
        }

        let report = aggregator.finish();
        if let Some(progress) = &progress {
            progress
                .reporter
                .on_progress(&ProgressSnapshot::new(&report, total_bytes, &start_time));
        }
        if let Err(err) = done_tx.send(report) {
            warn!("caller stopped waiting for the final total: {err}");
        }
    })
}
