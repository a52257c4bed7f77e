//! Work queue for the parallel walker.
//!
//! Walker threads pull [`TraversalRequest`]s from the queue and push the
//! children they discover back onto it. The queue counts every request that
//! has been pushed but not yet completed; the walk is over when that count
//! drops to zero, which covers work spawned transitively by other work.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::TraversalRequest;

/// Statistics for the work queue
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Total requests enqueued
    pub enqueued: AtomicU64,

    /// Total requests dequeued
    pub dequeued: AtomicU64,
}

/// Shared queue of pending traversal requests.
pub struct WorkQueue {
    sender: Sender<TraversalRequest>,
    receiver: Receiver<TraversalRequest>,
    /// Requests pushed but not yet marked complete
    outstanding: AtomicUsize,
    stats: QueueStats,
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            outstanding: AtomicUsize::new(0),
            stats: QueueStats::default(),
        }
    }

    /// Add a request. Counted as outstanding until [`complete`](Self::complete).
    pub fn push(&self, request: TraversalRequest) {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        if self.sender.send(request).is_err() {
            // Receiver lives as long as the queue; only reachable during teardown.
            self.outstanding.fetch_sub(1, Ordering::SeqCst);
            return;
        }
        self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// Wait up to `timeout` for the next request.
    pub fn next(&self, timeout: Duration) -> Option<TraversalRequest> {
        match self.receiver.recv_timeout(timeout) {
            Ok(request) => {
                self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
                Some(request)
            }
            Err(_) => None,
        }
    }

    /// Mark one dequeued request as fully processed.
    ///
    /// Must be called after the request's children have been pushed.
    pub fn complete(&self) {
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
    }

    /// True once every pushed request has been completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.outstanding.load(Ordering::SeqCst) == 0
    }

    /// Queue statistics
    #[must_use]
    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }
}
