//! Ceiling on concurrently running hash tasks.
//!
//! The parallel walker asks the [`Governor`] for a [`Permit`] before it
//! dispatches a file to the hashing pool. Once the ceiling is reached the
//! dispatcher blocks until a running task drops its permit, so pending
//! work never queues up without bound and open file handles stay capped.

use std::sync::{Arc, Condvar, Mutex, PoisonError};

/// Default ceiling multiplier over available CPUs.
pub const CPU_MULTIPLIER: usize = 8;

/// Counting permit gate.
#[derive(Debug)]
pub struct Governor {
    ceiling: usize,
    in_flight: Mutex<usize>,
    released: Condvar,
}

impl Governor {
    /// Create a governor admitting at most `ceiling` tasks (at least 1).
    #[must_use]
    pub fn new(ceiling: usize) -> Self {
        Self {
            ceiling: ceiling.max(1),
            in_flight: Mutex::new(0),
            released: Condvar::new(),
        }
    }

    /// Create a governor sized to `available_parallelism() * multiplier`.
    #[must_use]
    pub fn for_available_parallelism(multiplier: usize) -> Self {
        Self::new(available_cpus().saturating_mul(multiplier.max(1)))
    }

    /// Maximum number of simultaneous permits.
    #[must_use]
    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Number of permits currently held.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        *self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take a permit, blocking while the ceiling is reached.
    #[must_use]
    pub fn acquire(self: &Arc<Self>) -> Permit {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        while *in_flight >= self.ceiling {
            log::trace!("Governor at ceiling ({}), waiting", self.ceiling);
            in_flight = self
                .released
                .wait(in_flight)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *in_flight += 1;
        Permit {
            governor: Arc::clone(self),
        }
    }

    fn release(&self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        *in_flight = in_flight.saturating_sub(1);
        self.released.notify_one();
    }
}

/// Admission to run one hash task. Released on drop.
#[derive(Debug)]
pub struct Permit {
    governor: Arc<Governor>,
}

impl Drop for Permit {
    fn drop(&mut self) {
        self.governor.release();
    }
}

/// Number of CPUs available to this process (at least 1).
#[must_use]
pub fn available_cpus() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}
