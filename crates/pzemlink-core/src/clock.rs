//! Millisecond time sources used to bound response reads.

use std::cell::Cell;
use std::time::Instant;

/// Monotonic millisecond timestamp. Must never go backwards within one read.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wall-clock-independent clock anchored at construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Deterministic clock that advances by a fixed step every time it is read.
///
/// Lets timeout paths run instantly and reproducibly.
///
/// # Examples
/// ```
/// use pzemlink_core::{Clock, StepClock};
///
/// let clock = StepClock::new(5);
/// assert_eq!(clock.now_ms(), 0);
/// assert_eq!(clock.now_ms(), 5);
/// ```
#[derive(Debug, Default)]
pub struct StepClock {
    now: Cell<u64>,
    step: u64,
}

impl StepClock {
    pub fn new(step_ms: u64) -> Self {
        Self {
            now: Cell::new(0),
            step: step_ms,
        }
    }

    /// Number of milliseconds the clock has reported so far.
    pub fn elapsed_ms(&self) -> u64 {
        self.now.get()
    }
}

impl Clock for StepClock {
    fn now_ms(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now.saturating_add(self.step));
        now
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}
