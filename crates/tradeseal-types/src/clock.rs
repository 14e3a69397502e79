//! Logical time sources.
//!
//! All time checks are data-level comparisons against a [`Timestamp`]
//! supplied by the caller. Production callers read it from [`SystemClock`];
//! tests drive a [`ManualClock`].

use std::cell::Cell;

use chrono::Utc;

use crate::Timestamp;

pub trait Clock {
    /// Current time in seconds since the Unix epoch.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time from the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        // Pre-epoch clocks read as zero.
        u64::try_from(Utc::now().timestamp()).unwrap_or(0)
    }
}

/// Manually advanced clock for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Timestamp>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.set(now);
    }

    pub fn advance(&self, secs: u64) {
        self.now.set(self.now.get().saturating_add(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.get()
    }
}
