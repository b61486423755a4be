//! # Pipeline Events
//!
//! Values handed between pipeline stages. Each is produced once and
//! consumed once.

use serde::Serialize;

use crate::segment::Segment;

/// Per-segment count sent from a worker to the aggregator
#[derive(Debug, Clone, Copy)]
pub struct SegmentResult {
    pub segment: Segment,
    pub worker_id: usize,
    /// Complete records decoded from the segment
    pub records: u64,
    /// Records that passed the primality test
    pub primes: u64,
}

/// Final reduction, signalled by the aggregator exactly once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregateReport {
    pub total_primes: u64,
    pub records_scanned: u64,
    pub bytes_scanned: u64,
    pub segments_processed: u64,
}
