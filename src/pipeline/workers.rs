//! # Pipeline Workers
//!
//! Scan worker threads: claim a segment, read it chunk by chunk with
//! positioned reads, decode records and count primes.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error, warn};

use crate::config::StaggerConfig;
use crate::constants::RECORD_SIZE;
use crate::input::{InputError, InputSource, read_exact_at};
use crate::prime::is_prime;
use crate::segment::Segment;

use super::ScanError;
use super::coordinator::ScanControl;
use super::events::SegmentResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentTally {
    pub records: u64,
    pub primes: u64,
}

/// Decode `chunk` as consecutive little-endian u64 records and count the
/// primes. Trailing bytes that do not fill a whole record are ignored.
pub fn decode_records(chunk: &[u8]) -> SegmentTally {
    let mut tally = SegmentTally::default();
    for record in chunk.chunks_exact(RECORD_SIZE) {
        let mut bytes = [0u8; RECORD_SIZE];
        bytes.copy_from_slice(record);
        tally.records += 1;
        if is_prime(u64::from_le_bytes(bytes)) {
            tally.primes += 1;
        }
    }
    tally
}

/// Scan one segment using `buf` as the chunk buffer; `buf.len()` is the
/// chunk size. The last chunk of the segment may be shorter.
pub fn scan_segment(
    source: &dyn InputSource,
    segment: &Segment,
    buf: &mut [u8],
) -> Result<SegmentTally, InputError> {
    let chunk_size = buf.len() as u64;
    let mut tally = SegmentTally::default();
    let mut offset = 0u64;
    while offset < segment.length {
        let read_len = (segment.length - offset).min(chunk_size) as usize;
        let chunk = &mut buf[..read_len];
        read_exact_at(source, segment.start + offset, chunk)?;
        let chunk_tally = decode_records(chunk);
        tally.records += chunk_tally.records;
        tally.primes += chunk_tally.primes;
        offset += read_len as u64;
    }
    Ok(tally)
}

/// Startup delay for `worker_id`. A seeded stagger gives every worker a
/// reproducible delay.
pub fn startup_delay(worker_id: usize, stagger: &StaggerConfig) -> Duration {
    if stagger.is_disabled() {
        return Duration::ZERO;
    }
    let low = stagger.min_ms.min(stagger.max_ms);
    let high = stagger.max_ms;
    let ms = match stagger.seed {
        Some(seed) => {
            StdRng::seed_from_u64(seed.wrapping_add(worker_id as u64)).random_range(low..=high)
        }
        None => rand::rng().random_range(low..=high),
    };
    Duration::from_millis(ms)
}

/// Spawn prime scanning worker threads. Each worker owns one buffer of
/// `chunk_size` bytes; callers cap it at the segment size.
pub fn spawn_scan_workers(
    workers: usize,
    source: Arc<dyn InputSource>,
    chunk_size: usize,
    stagger: StaggerConfig,
    rx: Receiver<Segment>,
    result_tx: &Sender<SegmentResult>,
    control: Arc<ScanControl>,
) -> Vec<thread::JoinHandle<()>> {
    let mut handles = Vec::new();
    let worker_count = workers.max(1);

    for worker_id in 0..worker_count {
        let source = source.clone();
        let rx = rx.clone();
        let result_tx = result_tx.clone();
        let control = control.clone();

        handles.push(thread::spawn(move || {
            let delay = startup_delay(worker_id, &stagger);
            if !delay.is_zero() {
                let delay_ms = delay.as_millis() as u64;
                debug!(worker_id, delay_ms, "staggering worker start");
                thread::sleep(delay);
            }

            let mut buf = vec![0u8; chunk_size.max(1)];
            let mut segments_done = 0u64;
            loop {
                if control.should_stop() {
                    debug!(worker_id, "stop requested; no longer claiming segments");
                    break;
                }
                let segment = match rx.recv() {
                    Ok(segment) => segment,
                    Err(_) => break,
                };

                match scan_segment(source.as_ref(), &segment, &mut buf) {
                    Ok(tally) => {
                        debug!(
                            worker_id,
                            segment_id = segment.id,
                            start = segment.start,
                            length = segment.length,
                            records = tally.records,
                            primes = tally.primes,
                            "segment scanned"
                        );
                        let result = SegmentResult {
                            segment,
                            worker_id,
                            records: tally.records,
                            primes: tally.primes,
                        };
                        if let Err(err) = result_tx.send(result) {
                            warn!("result channel closed while sending segment {}: {err}", segment.id);
                            break;
                        }
                        segments_done += 1;
                    }
                    Err(err) => {
                        error!(
                            "worker {worker_id} failed on segment {} [{}..{}): {err}",
                            segment.id,
                            segment.start,
                            segment.end()
                        );
                        control.record(ScanError::Segment {
                            worker: worker_id,
                            segment_id: segment.id,
                            start: segment.start,
                            end: segment.end(),
                            source: err,
                        });
                        break;
                    }
                }
            }
            debug!(worker_id, segments_done, "worker exiting");
        }));
    }

    handles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MemorySource;

    fn encode(values: &[u64]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn decodes_little_endian_records() {
        let tally = decode_records(&encode(&[2, 4, 7]));
        assert_eq!(tally, SegmentTally { records: 3, primes: 2 });
    }

    #[test]
    fn trailing_partial_record_is_skipped() {
        let mut bytes = encode(&[3, 5]);
        bytes.extend_from_slice(&[7, 0, 0]);
        let tally = decode_records(&bytes);
        assert_eq!(tally, SegmentTally { records: 2, primes: 2 });
    }

    #[test]
    fn chunk_shorter_than_record_decodes_nothing() {
        assert_eq!(decode_records(&[2, 0, 0, 0]), SegmentTally::default());
    }

    #[test]
    fn scan_segment_reads_only_its_range() {
        let source = MemorySource::new(encode(&[2, 3, 4, 5, 6, 7]));
        let segment = Segment {
            id: 1,
            start: 16,
            length: 24,
        };
        let mut buf = vec![0u8; 8];
        let tally = scan_segment(&source, &segment, &mut buf).expect("scan");
        // 4, 5, 6
        assert_eq!(tally, SegmentTally { records: 3, primes: 1 });
    }

    #[test]
    fn chunks_not_aligned_to_records_drop_straddling_values() {
        let source = MemorySource::new(encode(&[2, 3, 5, 7]));
        let segment = Segment {
            id: 0,
            start: 0,
            length: 32,
        };
        let mut aligned = vec![0u8; 16];
        let full = scan_segment(&source, &segment, &mut aligned).expect("scan");
        assert_eq!(full.primes, 4);

        // Chunks of 12 bytes: [0,12) [12,24) [24,32) each hold one whole record.
        let mut unaligned = vec![0u8; 12];
        let partial = scan_segment(&source, &segment, &mut unaligned).expect("scan");
        assert_eq!(partial.records, 3);
        assert!(partial.primes < full.primes);
    }

    #[test]
    fn short_source_fails_the_segment() {
        let source = MemorySource::new(encode(&[2]));
        let segment = Segment {
            id: 0,
            start: 0,
            length: 16,
        };
        let mut buf = vec![0u8; 16];
        let err = scan_segment(&source, &segment, &mut buf).expect_err("short read");
        assert!(matches!(err, InputError::ShortRead { .. }));
    }

    #[test]
    fn disabled_stagger_has_no_delay() {
        assert_eq!(startup_delay(3, &StaggerConfig::disabled()), Duration::ZERO);
    }

    #[test]
    fn seeded_stagger_is_reproducible_and_bounded() {
        let stagger = StaggerConfig {
            min_ms: 10,
            max_ms: 20,
            seed: Some(42),
        };
        for worker_id in 0..8 {
            let a = startup_delay(worker_id, &stagger);
            let b = startup_delay(worker_id, &stagger);
            assert_eq!(a, b);
            assert!(a >= Duration::from_millis(10) && a <= Duration::from_millis(20));
        }
    }
}
