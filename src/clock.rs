//! Clock sources for stamp timing
//!
//! All instants are milliseconds as `f64`. `MonotonicClock` is the default
//! and never goes backwards; `SystemClock` follows the wall clock and is
//! exposed for hosts that need epoch-based instants, at the cost of being
//! affected by clock adjustments. `ManualClock` only moves when told to.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// A source of monotonically non-decreasing instants in milliseconds
pub trait Clock {
    /// Current instant in milliseconds
    fn now(&self) -> f64;
}

/// Monotonic clock anchored at construction time
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
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Wall-clock milliseconds since the Unix epoch
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64()
            * 1000.0
    }
}

/// Caller-driven clock for deterministic timings
///
/// Clones share the same instant, so a test can keep one handle and give
/// another to a tracker.
///
/// # Example
/// ```
/// use vlug::clock::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// let shared = clock.clone();
/// clock.advance(2.5);
/// assert_eq!(shared.now(), 2.5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by `millis`
    pub fn advance(&self, millis: f64) {
        self.now.set(self.now.get() + millis);
    }

    /// Jump to an absolute instant
    pub fn set(&self, millis: f64) {
        self.now.set(millis);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}

/// The clock trackers use unless told otherwise
pub fn default_clock() -> Rc<dyn Clock> {
    Rc::new(MonotonicClock::new())
}
