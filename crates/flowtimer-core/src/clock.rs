//! Wall-clock abstraction.
//!
//! Every timestamp the core produces goes through [`Clock`], so tests can
//! substitute a hand-driven clock and replay whole schedules deterministically.

use std::cell::Cell;

use chrono::{DateTime, Duration, Utc};

/// Source of the current wall-clock instant.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock advanced by hand. Only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        self.now.set(instant);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}
