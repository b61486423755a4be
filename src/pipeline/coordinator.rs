//! # Completion Coordinator
//!
//! Tracks worker lifetimes, owns the last handle on the result queue, and
//! holds the first error raised anywhere in the run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crossbeam_channel::Sender;
use tracing::{debug, error};

use super::ScanError;
use super::events::SegmentResult;

/// Shared stop signal plus a first-error-wins slot.
pub struct ScanControl {
    first_error: Mutex<Option<ScanError>>,
    stop: AtomicBool,
    cancel_flag: Option<Arc<AtomicBool>>,
}

impl ScanControl {
    pub fn new(cancel_flag: Option<Arc<AtomicBool>>) -> Self {
        Self {
            first_error: Mutex::new(None),
            stop: AtomicBool::new(false),
            cancel_flag,
        }
    }

    /// Keep `err` if it is the first one and ask every stage to stop.
    /// Returns false when an earlier error already won.
    pub fn record(&self, err: ScanError) -> bool {
        self.stop.store(true, Ordering::SeqCst);
        let mut slot = self
            .first_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if slot.is_some() {
            debug!("suppressing follow-on error: {err}");
            return false;
        }
        *slot = Some(err);
        true
    }

    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::SeqCst) || self.cancelled()
    }

    pub fn cancelled(&self) -> bool {
        self.cancel_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    pub fn take_error(&self) -> Option<ScanError> {
        self.first_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }
}

/// Closes the result queue only after every worker has exited.
///
/// Workers each hold a clone of the result sender; the coordinator keeps
/// the original, so the aggregator cannot observe a closed queue until
/// [`CompletionCoordinator::wait`] drops it after the last join.
pub struct CompletionCoordinator {
    handles: Vec<JoinHandle<()>>,
    result_tx: Option<Sender<SegmentResult>>,
    control: Arc<ScanControl>,
}

impl CompletionCoordinator {
    pub fn new(
        handles: Vec<JoinHandle<()>>,
        result_tx: Sender<SegmentResult>,
        control: Arc<ScanControl>,
    ) -> Self {
        Self {
            handles,
            result_tx: Some(result_tx),
            control,
        }
    }

    /// Join every worker, then close the result queue. Returns the number
    /// of workers joined.
    pub fn wait(mut self) -> usize {
        let mut joined = 0usize;
        for (worker_id, handle) in std::mem::take(&mut self.handles).into_iter().enumerate() {
            if handle.join().is_err() {
                error!("worker {worker_id} panicked");
                self.control
                    .record(ScanError::WorkerPanicked { worker: worker_id });
            }
            joined += 1;
        }
        drop(self.result_tx.take());
        debug!(workers = joined, "all workers finished; result queue closed");
        joined
    }
}
