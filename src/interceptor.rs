//! Method interception for logging and timing
//!
//! An [`Interceptor`] replaces method slots on [`MethodTable`]s with
//! wrappers that run hooks before and after the original method. `logs`
//! specs print messages around a call; `times` specs stamp the call into the
//! interceptor's own tracker, one iteration per call.
//!
//! Every wrap pushes a restore entry. [`Interceptor::restore`] unwinds them
//! last-wrapped-first, so the same slot wrapped several times ends up back at
//! its pristine original.
//!
//! # Example
//! ```
//! use std::rc::Rc;
//! use vlug::config::RunnerConfig;
//! use vlug::interceptor::{Interceptor, InterceptorConfig, LogSpec, TimeSpec};
//! use vlug::runner::{FunctionSpec, Runner};
//! use vlug::tracker::TimingTracked;
//!
//! let runner = Runner::new(RunnerConfig::new(100).with_log(false))
//!     .unwrap()
//!     .with_function(FunctionSpec::named("noop", || {}));
//! let (_runner, table) = runner.into_method_table("runner");
//!
//! let mut interceptor = Interceptor::new(
//!     InterceptorConfig::default()
//!         .with_log(false)
//!         .log(LogSpec::new(Rc::clone(&table), "run").before("running ..."))
//!         .time(TimeSpec::new(Rc::clone(&table), "run")),
//! );
//!
//! table.call("run", &[]).unwrap();
//! table.call("run", &[]).unwrap();
//! assert_eq!(interceptor.get_report().get("run").unwrap().iterations_run, 2);
//!
//! interceptor.restore();
//! ```

use crate::clock::Clock;
use crate::console::{default_console, Console};
use crate::error::VlugError;
use crate::target::{Method, MethodTable};
use crate::tracker::{IterationMode, TimeTracker, TimingTracked};
use serde_json::Value;
use std::rc::Rc;

type Hook = Rc<dyn Fn(&[Value]) -> anyhow::Result<()>>;

/// Text logged by a `logs` hook
#[derive(Clone)]
pub enum Message {
    /// Logged as is
    Literal(String),
    /// Computed from the intercepted call's arguments
    Computed(Rc<dyn Fn(&[Value]) -> String>),
}

impl Message {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> String + 'static,
    {
        Message::Computed(Rc::new(f))
    }

    pub fn render(&self, args: &[Value]) -> String {
        match self {
            Message::Literal(text) => text.clone(),
            Message::Computed(f) => f(args),
        }
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::Literal(text.to_string())
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::Literal(text)
    }
}

impl std::fmt::Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Message::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            Message::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Log messages around calls to `target.fn_name`
#[derive(Debug, Clone)]
pub struct LogSpec {
    pub target: Rc<MethodTable>,
    pub fn_name: String,
    pub before: Option<Message>,
    pub after: Option<Message>,
    pub log_result: bool,
}

impl LogSpec {
    pub fn new(target: Rc<MethodTable>, fn_name: impl Into<String>) -> Self {
        Self {
            target,
            fn_name: fn_name.into(),
            before: None,
            after: None,
            log_result: false,
        }
    }

    pub fn before(mut self, message: impl Into<Message>) -> Self {
        self.before = Some(message.into());
        self
    }

    pub fn after(mut self, message: impl Into<Message>) -> Self {
        self.after = Some(message.into());
        self
    }

    pub fn log_result(mut self, log_result: bool) -> Self {
        self.log_result = log_result;
        self
    }
}

/// Track the time of every call to `target.fn_name`
#[derive(Debug, Clone)]
pub struct TimeSpec {
    pub target: Rc<MethodTable>,
    pub fn_name: String,
    pub log_result: bool,
}

impl TimeSpec {
    pub fn new(target: Rc<MethodTable>, fn_name: impl Into<String>) -> Self {
        Self {
            target,
            fn_name: fn_name.into(),
            log_result: false,
        }
    }

    pub fn log_result(mut self, log_result: bool) -> Self {
        self.log_result = log_result;
        self
    }
}

/// What an [`Interceptor`] wraps when it is built
pub struct InterceptorConfig {
    pub logs: Vec<LogSpec>,
    pub times: Vec<TimeSpec>,
    /// Console timer output for `times` specs
    pub log: bool,
    pub clock: Option<Rc<dyn Clock>>,
    pub console: Option<Rc<dyn Console>>,
}

impl Default for InterceptorConfig {
    fn default() -> Self {
        Self {
            logs: Vec::new(),
            times: Vec::new(),
            log: true,
            clock: None,
            console: None,
        }
    }
}

impl InterceptorConfig {
    pub fn log(mut self, spec: LogSpec) -> Self {
        self.logs.push(spec);
        self
    }

    pub fn time(mut self, spec: TimeSpec) -> Self {
        self.times.push(spec);
        self
    }

    pub fn with_log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }

    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_console(mut self, console: Rc<dyn Console>) -> Self {
        self.console = Some(console);
        self
    }
}

/// A wrapped slot and the value it held before
struct RestoreEntry {
    target: Rc<MethodTable>,
    fn_name: String,
    original: Option<Method>,
}

impl RestoreEntry {
    fn undo(self) {
        tracing::debug!(
            object = self.target.name(),
            method = %self.fn_name,
            "restoring method"
        );
        self.target.replace(&self.fn_name, self.original);
    }
}

/// Wraps method slots with logging and timing hooks
pub struct Interceptor {
    tracker: TimeTracker,
    console: Rc<dyn Console>,
    restore_stack: Vec<RestoreEntry>,
}

impl Interceptor {
    /// Wrap every `logs` spec, then every `times` spec
    pub fn new(config: InterceptorConfig) -> Self {
        let console = config.console.unwrap_or_else(default_console);
        let mut tracker = TimeTracker::new(IterationMode::SingleCall)
            .with_console(Rc::clone(&console))
            .with_log(config.log);
        if let Some(clock) = config.clock {
            tracker = tracker.with_clock(clock);
        }

        let mut interceptor = Self {
            tracker,
            console,
            restore_stack: Vec::new(),
        };

        for spec in config.logs {
            let before = interceptor.message_hook(spec.before);
            let after = interceptor.message_hook(spec.after);
            interceptor.intercept(&spec.target, &spec.fn_name, before, after, spec.log_result);
        }

        let ids = time_identifiers(&config.times);
        for (spec, id) in config.times.iter().zip(ids) {
            let (before, after) = interceptor.timing_hooks(id);
            interceptor.intercept(&spec.target, &spec.fn_name, before, after, spec.log_result);
        }

        interceptor
    }

    fn message_hook(&self, message: Option<Message>) -> Hook {
        match message {
            Some(message) => {
                let console = Rc::clone(&self.console);
                Rc::new(move |args: &[Value]| -> anyhow::Result<()> {
                    console.log(&message.render(args));
                    Ok(())
                })
            }
            None => Rc::new(|_: &[Value]| -> anyhow::Result<()> { Ok(()) }),
        }
    }

    fn timing_hooks(&self, id: String) -> (Hook, Hook) {
        let start_tracker = self.tracker.clone();
        let start_id = id.clone();
        let before: Hook = Rc::new(move |_: &[Value]| -> anyhow::Result<()> {
            start_tracker.stamp_start(&start_id);
            Ok(())
        });

        let end_tracker = self.tracker.clone();
        let after: Hook = Rc::new(move |_: &[Value]| -> anyhow::Result<()> {
            end_tracker.stamp_end(&id)?;
            Ok(())
        });

        (before, after)
    }

    fn intercept(
        &mut self,
        target: &Rc<MethodTable>,
        fn_name: &str,
        before: Hook,
        after: Hook,
        log_result: bool,
    ) {
        let original = target.method(fn_name);
        let old = original.clone();
        let console = Rc::clone(&self.console);
        let object = target.name().to_string();
        let method = fn_name.to_string();

        let wrapper: Method = Rc::new(move |args: &[Value]| -> anyhow::Result<Value> {
            before(args)?;

            let old = old.as_ref().ok_or_else(|| VlugError::NotCallable {
                object: object.clone(),
                method: method.clone(),
            })?;
            let result = old(args)?;

            if log_result {
                console.log(&display_value(&result));
            }

            after(args)?;
            Ok(result)
        });

        tracing::debug!(
            object = target.name(),
            method = fn_name,
            existed = original.is_some(),
            "intercepting method"
        );
        target.replace(fn_name, Some(wrapper));
        self.restore_stack.push(RestoreEntry {
            target: Rc::clone(target),
            fn_name: fn_name.to_string(),
            original,
        });
    }

    /// Put every wrapped slot back, most recent wrap first
    ///
    /// The restore stack is drained, so calling this again does nothing.
    pub fn restore(&mut self) {
        while let Some(entry) = self.restore_stack.pop() {
            entry.undo();
        }
    }

    /// Wraps that [`restore`](Self::restore) would still undo
    pub fn wrapped_count(&self) -> usize {
        self.restore_stack.len()
    }

    pub fn is_active(&self) -> bool {
        !self.restore_stack.is_empty()
    }
}

impl TimingTracked for Interceptor {
    fn tracker(&self) -> &TimeTracker {
        &self.tracker
    }
}

impl std::fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interceptor")
            .field("tracker", &self.tracker)
            .field("wrapped", &self.restore_stack.len())
            .finish()
    }
}

/// Identifiers for `times` specs
///
/// A spec whose `fn_name` is shared with another spec in the same list gets
/// its position appended (`run0`, `run1`); otherwise the name is used as is.
pub fn time_identifiers(times: &[TimeSpec]) -> Vec<String> {
    times
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            let duplicate = times
                .iter()
                .enumerate()
                .any(|(other, t)| other != index && t.fn_name == spec.fn_name);
            if duplicate {
                format!("{}{}", spec.fn_name, index)
            } else {
                spec.fn_name.clone()
            }
        })
        .collect()
}

/// Strings print bare; everything else prints as JSON
fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
