//! Per-identifier time tracking
//!
//! A [`TimeTracker`] records start/end stamps under string identifiers and
//! accumulates iteration counts and elapsed time for each of them. Owners
//! (the runner and the interceptor) hold a tracker and expose it through
//! [`TimingTracked`].
//!
//! How many iterations one stamp pair stands for is fixed by the tracker's
//! [`IterationMode`]: a runner stamp wraps a whole batch of calls, an
//! interceptor stamp wraps exactly one.

use crate::clock::{default_clock, Clock};
use crate::console::{default_console, Console};
use crate::error::{Result, VlugError};
use crate::report::{Report, ReportEntry};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Iterations added to an identifier per completed stamp pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationMode {
    /// One stamp pair covers `n` iterations of a batch
    Batch(u64),
    /// One stamp pair covers a single call
    SingleCall,
}

impl IterationMode {
    pub fn iterations_to_add(&self) -> u64 {
        match self {
            IterationMode::Batch(n) => *n,
            IterationMode::SingleCall => 1,
        }
    }
}

/// Running totals for one identifier
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TotalTime {
    pub iterations_run: u64,
    /// Milliseconds
    pub total_time: f64,
}

struct TrackerState {
    mode: IterationMode,
    log: bool,
    time_stamps: HashMap<String, f64>,
    total_times: HashMap<String, TotalTime>,
}

/// Shared handle to timing state
///
/// Cloning the handle does not copy the statistics: every clone records
/// into, and reports from, the same totals. Interception hooks rely on this
/// to feed the interceptor's tracker from inside wrapped methods.
#[derive(Clone)]
pub struct TimeTracker {
    state: Rc<RefCell<TrackerState>>,
    clock: Rc<dyn Clock>,
    console: Rc<dyn Console>,
}

impl TimeTracker {
    /// Create a tracker with the default clock and console, logging enabled
    pub fn new(mode: IterationMode) -> Self {
        Self {
            state: Rc::new(RefCell::new(TrackerState {
                mode,
                log: true,
                time_stamps: HashMap::new(),
                total_times: HashMap::new(),
            })),
            clock: default_clock(),
            console: default_console(),
        }
    }

    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_console(mut self, console: Rc<dyn Console>) -> Self {
        self.console = console;
        self
    }

    pub fn with_log(self, log: bool) -> Self {
        self.set_log(log);
        self
    }

    pub fn console(&self) -> &Rc<dyn Console> {
        &self.console
    }

    pub fn log(&self) -> bool {
        self.state.borrow().log
    }

    pub fn set_log(&self, log: bool) {
        self.state.borrow_mut().log = log;
    }

    pub fn mode(&self) -> IterationMode {
        self.state.borrow().mode
    }

    /// Change the iterations counted by later stamp pairs
    pub fn set_mode(&self, mode: IterationMode) {
        self.state.borrow_mut().mode = mode;
    }

    /// Whether `stamp_start` has ever been called for `id`
    pub fn has_started(&self, id: &str) -> bool {
        self.state.borrow().time_stamps.contains_key(id)
    }

    /// Record the start instant for `id`
    ///
    /// A second start before the matching end overwrites the first one, so
    /// re-entrant intervals are measured from the innermost start.
    pub fn stamp_start(&self, id: &str) {
        let log = self.log();
        if log {
            self.console.time(id);
        }
        tracing::trace!(id, "stamp start");
        let now = self.clock.now();
        self.state
            .borrow_mut()
            .time_stamps
            .insert(id.to_string(), now);
    }

    /// Close the interval for `id` and fold it into the totals
    ///
    /// Returns the elapsed milliseconds.
    pub fn stamp_end(&self, id: &str) -> Result<f64> {
        let now = self.clock.now();
        let (log, elapsed) = {
            let mut state = self.state.borrow_mut();
            let start = state
                .time_stamps
                .get(id)
                .copied()
                .ok_or_else(|| VlugError::MissingStart { id: id.to_string() })?;
            let elapsed = now - start;
            let iterations = state.mode.iterations_to_add();

            let totals = state.total_times.entry(id.to_string()).or_default();
            totals.iterations_run = totals.iterations_run.saturating_add(iterations);
            totals.total_time += elapsed;
            tracing::trace!(id, elapsed, iterations, "stamp end");

            (state.log, elapsed)
        };

        if log {
            self.console.time_end(id);
        }
        Ok(elapsed)
    }

    /// Stamp a pair around `f` and return its value
    ///
    /// # Example
    /// ```
    /// use vlug::tracker::{IterationMode, TimeTracker};
    ///
    /// let tracker = TimeTracker::new(IterationMode::SingleCall).with_log(false);
    /// let value = tracker.measure("answer", || 42).unwrap();
    /// assert_eq!(value, 42);
    /// assert_eq!(tracker.report().get("answer").unwrap().iterations_run, 1);
    /// ```
    pub fn measure<F, R>(&self, id: &str, f: F) -> Result<R>
    where
        F: FnOnce() -> R,
    {
        self.stamp_start(id);
        let result = f();
        self.stamp_end(id)?;
        Ok(result)
    }

    /// Totals recorded for `id`, if any stamp pair completed
    pub fn totals(&self, id: &str) -> Option<TotalTime> {
        self.state.borrow().total_times.get(id).copied()
    }

    /// Snapshot of all identifiers with their averages
    pub fn report(&self) -> Report {
        let state = self.state.borrow();
        let mut report = Report::new();
        for (id, totals) in &state.total_times {
            report.insert(
                id.clone(),
                ReportEntry::new(totals.iterations_run, totals.total_time),
            );
        }
        report
    }
}

impl std::fmt::Debug for TimeTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("TimeTracker")
            .field("mode", &state.mode)
            .field("log", &state.log)
            .field("in_flight", &state.time_stamps.len())
            .field("identifiers", &state.total_times.len())
            .finish()
    }
}

/// Capability of owning a [`TimeTracker`]
///
/// Implementors only supply the tracker; stamping and reporting come for
/// free and always go through that tracker's iteration mode.
pub trait TimingTracked {
    fn tracker(&self) -> &TimeTracker;

    fn stamp_start(&self, id: &str) {
        self.tracker().stamp_start(id);
    }

    fn stamp_end(&self, id: &str) -> Result<f64> {
        self.tracker().stamp_end(id)
    }

    fn get_report(&self) -> Report {
        self.tracker().report()
    }
}

impl TimingTracked for TimeTracker {
    fn tracker(&self) -> &TimeTracker {
        self
    }
}
