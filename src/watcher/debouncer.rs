//! Global debounce gate for change events.
//!
//! Editors often save several times in quick succession (auto-save,
//! format-on-save). The gate lets the first event through and drops the
//! rest until the interval has passed.

use std::time::{Duration, Instant};

/// Accepts at most one event per interval, across all paths.
#[derive(Debug)]
pub struct ChangeDebouncer {
    /// When the most recent event was accepted.
    last_accepted: Option<Instant>,
    /// Minimum spacing between two accepted events.
    interval: Duration,
}

impl ChangeDebouncer {
    pub fn new(interval: Duration) -> Self {
        Self {
            last_accepted: None,
            interval,
        }
    }

    /// Create a debouncer with the given interval in milliseconds.
    pub fn from_millis(debounce_ms: u64) -> Self {
        Self::new(Duration::from_millis(debounce_ms))
    }

    /// Decide whether an event observed at `now` passes the gate.
    ///
    /// On acceptance the gate restarts from `now`. A rejected event leaves
    /// the state untouched, so a steady stream of events is still let
    /// through once per interval.
    pub fn accept(&mut self, now: Instant) -> bool {
        let ready = match self.last_accepted {
            None => true,
            Some(last) => now
                .checked_duration_since(last)
                .is_some_and(|elapsed| elapsed >= self.interval),
        };

        if ready {
            self.last_accepted = Some(now);
        }
        ready
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_accepted(&self) -> Option<Instant> {
        self.last_accepted
    }
}
