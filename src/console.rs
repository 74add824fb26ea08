//! Console sinks for timer and message output
//!
//! The tracker and interceptor never print directly. They talk to a
//! [`Console`], which is either the `tracing`-backed default or a
//! [`RecordingConsole`] that keeps every event in memory.

use crate::clock::{default_clock, Clock};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Log target used for console output
pub const CONSOLE_TARGET: &str = "vlug::console";

/// Start/end timer pair plus a plain message sink
pub trait Console {
    /// Start a named timer
    fn time(&self, id: &str);
    /// Stop a named timer and report its elapsed time
    fn time_end(&self, id: &str);
    /// Emit a message
    fn log(&self, message: &str);
}

/// Render a finished timer the way `console.timeEnd` does
pub fn format_timer(id: &str, elapsed_ms: f64) -> String {
    format!("{}: {:.3}ms", id, elapsed_ms)
}

/// Console that emits `tracing` events under [`CONSOLE_TARGET`]
pub struct TracingConsole {
    clock: Rc<dyn Clock>,
    timers: RefCell<HashMap<String, f64>>,
}

impl TracingConsole {
    pub fn new() -> Self {
        Self::with_clock(default_clock())
    }

    pub fn with_clock(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            timers: RefCell::new(HashMap::new()),
        }
    }
}

impl Default for TracingConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for TracingConsole {
    fn time(&self, id: &str) {
        self.timers
            .borrow_mut()
            .insert(id.to_string(), self.clock.now());
    }

    fn time_end(&self, id: &str) {
        let start = self.timers.borrow_mut().remove(id);
        match start {
            Some(start) => {
                let elapsed = self.clock.now() - start;
                tracing::info!(target: CONSOLE_TARGET, "{}", format_timer(id, elapsed));
            }
            None => {
                tracing::warn!(target: CONSOLE_TARGET, "Timer '{}' does not exist", id);
            }
        }
    }

    fn log(&self, message: &str) {
        tracing::info!(target: CONSOLE_TARGET, "{}", message);
    }
}

/// A single call made against a [`RecordingConsole`]
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleEvent {
    Time(String),
    /// `elapsed_ms` is `None` when no timer with that id was running
    TimeEnd { id: String, elapsed_ms: Option<f64> },
    Log(String),
}

/// Console that stores events in memory
///
/// Clones share the same buffer, so a caller can keep a handle while the
/// tracker or interceptor owns another.
#[derive(Clone)]
pub struct RecordingConsole {
    clock: Rc<dyn Clock>,
    timers: Rc<RefCell<HashMap<String, f64>>>,
    events: Rc<RefCell<Vec<ConsoleEvent>>>,
}

impl RecordingConsole {
    pub fn new() -> Self {
        Self::with_clock(default_clock())
    }

    pub fn with_clock(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            timers: Rc::new(RefCell::new(HashMap::new())),
            events: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Every event recorded so far, oldest first
    pub fn events(&self) -> Vec<ConsoleEvent> {
        self.events.borrow().clone()
    }

    /// Printable output: finished timers and messages, in order
    pub fn lines(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                ConsoleEvent::Time(_) => None,
                ConsoleEvent::TimeEnd {
                    id,
                    elapsed_ms: Some(ms),
                } => Some(format_timer(id, *ms)),
                ConsoleEvent::TimeEnd {
                    id,
                    elapsed_ms: None,
                } => Some(format!("Timer '{}' does not exist", id)),
                ConsoleEvent::Log(message) => Some(message.clone()),
            })
            .collect()
    }

    /// Only the messages passed to [`Console::log`]
    pub fn messages(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                ConsoleEvent::Log(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl Default for RecordingConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for RecordingConsole {
    fn time(&self, id: &str) {
        self.timers
            .borrow_mut()
            .insert(id.to_string(), self.clock.now());
        self.events
            .borrow_mut()
            .push(ConsoleEvent::Time(id.to_string()));
    }

    fn time_end(&self, id: &str) {
        let start = self.timers.borrow_mut().remove(id);
        let elapsed_ms = start.map(|start| self.clock.now() - start);
        self.events.borrow_mut().push(ConsoleEvent::TimeEnd {
            id: id.to_string(),
            elapsed_ms,
        });
    }

    fn log(&self, message: &str) {
        self.events
            .borrow_mut()
            .push(ConsoleEvent::Log(message.to_string()));
    }
}

/// The console trackers and interceptors use unless told otherwise
pub fn default_console() -> Rc<dyn Console> {
    Rc::new(TracingConsole::new())
}
