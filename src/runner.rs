//! Repeated-execution runner
//!
//! A [`Runner`] calls each configured function `iterations` times in a tight
//! loop and stamps the whole loop under the function's identifier. Calling
//! [`Runner::run`] again keeps adding to the same totals, so the report's
//! average converges over several runs.
//!
//! # Example
//! ```
//! use vlug::config::RunnerConfig;
//! use vlug::runner::{FunctionSpec, Runner};
//! use vlug::tracker::TimingTracked;
//!
//! let data: Vec<u64> = (0..100).collect();
//! let mut runner = Runner::new(RunnerConfig::new(1000).with_log(false))
//!     .unwrap()
//!     .with_function(FunctionSpec::named("sum", move || {
//!         std::hint::black_box(data.iter().sum::<u64>());
//!     }));
//!
//! runner.run().unwrap();
//! runner.run().unwrap();
//! assert_eq!(runner.get_report().get("sum").unwrap().iterations_run, 2000);
//! ```

use crate::clock::Clock;
use crate::config::RunnerConfig;
use crate::console::Console;
use crate::error::VlugError;
use crate::target::MethodTable;
use crate::tracker::{IterationMode, TimeTracker, TimingTracked};
use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

type RunFn = Box<dyn FnMut() -> Result<()>>;

/// A function to run, with an optional identifier
pub struct FunctionSpec {
    name: Option<String>,
    func: RunFn,
}

impl FunctionSpec {
    /// Unnamed function; reported as `index:<position>`
    pub fn new<F>(mut f: F) -> Self
    where
        F: FnMut() + 'static,
    {
        Self {
            name: None,
            func: Box::new(move || {
                f();
                Ok(())
            }),
        }
    }

    pub fn named<F>(name: impl Into<String>, f: F) -> Self
    where
        F: FnMut() + 'static,
    {
        Self::new(f).with_name(name)
    }

    /// Function whose error aborts the run
    pub fn fallible<F>(f: F) -> Self
    where
        F: FnMut() -> Result<()> + 'static,
    {
        Self {
            name: None,
            func: Box::new(f),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Identifier for the function at `index`
    pub fn identifier(&self, index: usize) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("index:{}", index),
        }
    }
}

impl<F> From<F> for FunctionSpec
where
    F: FnMut() + 'static,
{
    fn from(f: F) -> Self {
        FunctionSpec::new(f)
    }
}

impl std::fmt::Debug for FunctionSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionSpec")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Runs a set of functions for a number of iterations and tracks their time
pub struct Runner {
    iterations: u64,
    functions: Vec<FunctionSpec>,
    tracker: TimeTracker,
}

impl Runner {
    pub fn new(config: RunnerConfig) -> std::result::Result<Self, VlugError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: RunnerConfig) -> Self {
        Self {
            iterations: config.iterations,
            functions: Vec::new(),
            tracker: TimeTracker::new(IterationMode::Batch(config.iterations))
                .with_log(config.log),
        }
    }

    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.tracker = self.tracker.with_clock(clock);
        self
    }

    pub fn with_console(mut self, console: Rc<dyn Console>) -> Self {
        self.tracker = self.tracker.with_console(console);
        self
    }

    pub fn with_function(mut self, spec: impl Into<FunctionSpec>) -> Self {
        self.add_function(spec);
        self
    }

    pub fn with_functions<I>(mut self, specs: I) -> Self
    where
        I: IntoIterator<Item = FunctionSpec>,
    {
        self.functions.extend(specs);
        self
    }

    pub fn add_function(&mut self, spec: impl Into<FunctionSpec>) {
        self.functions.push(spec.into());
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn log(&self) -> bool {
        self.tracker.log()
    }

    /// Set the iterations used by later runs; recorded totals are untouched
    pub fn set_iterations(&mut self, iterations: u64) -> std::result::Result<(), VlugError> {
        if iterations == 0 {
            return Err(VlugError::InvalidIterations(iterations));
        }
        self.iterations = iterations;
        self.tracker.set_mode(IterationMode::Batch(iterations));
        Ok(())
    }

    pub fn set_log(&mut self, log: bool) {
        self.tracker.set_log(log);
    }

    /// Run every function, in order, `iterations` times each
    ///
    /// The first error returned by a function stops the run. Functions that
    /// completed before it keep their statistics; the failing function and
    /// the ones after it record nothing for this run. With `log` on, the
    /// failing function's console timer is left open.
    pub fn run(&mut self) -> Result<()> {
        let iterations = self.iterations;
        tracing::debug!(
            functions = self.functions.len(),
            iterations,
            "running functions"
        );

        for (index, spec) in self.functions.iter_mut().enumerate() {
            let id = spec.identifier(index);
            self.tracker.stamp_start(&id);
            for _ in 0..iterations {
                (spec.func)().with_context(|| format!("function '{}' failed", id))?;
            }
            self.tracker.stamp_end(&id)?;
        }

        Ok(())
    }

    /// Publish this runner's operations as method slots
    ///
    /// The returned table has `run`, `set_iterations`, `set_log` and
    /// `get_report` slots, all operating on the shared runner, so an
    /// [`Interceptor`](crate::interceptor::Interceptor) can wrap them.
    pub fn into_method_table(
        self,
        name: impl Into<String>,
    ) -> (Rc<RefCell<Runner>>, Rc<MethodTable>) {
        let runner = Rc::new(RefCell::new(self));
        let table = MethodTable::new(name);

        let this = Rc::clone(&runner);
        table.define("run", move |_args| {
            this.try_borrow_mut()
                .map_err(|_| anyhow!("runner is already running"))?
                .run()?;
            Ok(Value::Null)
        });

        let this = Rc::clone(&runner);
        table.define("set_iterations", move |args| {
            let iterations = args.first().and_then(Value::as_u64).ok_or_else(|| {
                VlugError::InvalidArgument {
                    method: "set_iterations".to_string(),
                    reason: "expected a positive integer".to_string(),
                }
            })?;
            this.try_borrow_mut()
                .map_err(|_| anyhow!("runner is already running"))?
                .set_iterations(iterations)?;
            Ok(Value::Null)
        });

        let this = Rc::clone(&runner);
        table.define("set_log", move |args| {
            let log = args.first().and_then(Value::as_bool).ok_or_else(|| {
                VlugError::InvalidArgument {
                    method: "set_log".to_string(),
                    reason: "expected a boolean".to_string(),
                }
            })?;
            this.try_borrow_mut()
                .map_err(|_| anyhow!("runner is already running"))?
                .set_log(log);
            Ok(Value::Null)
        });

        let this = Rc::clone(&runner);
        table.define("get_report", move |_args| {
            let report = this
                .try_borrow()
                .map_err(|_| anyhow!("runner is already running"))?
                .get_report();
            Ok(serde_json::to_value(report)?)
        });

        (runner, table)
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::from_valid_config(RunnerConfig::default())
    }
}

impl TimingTracked for Runner {
    fn tracker(&self) -> &TimeTracker {
        &self.tracker
    }
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("iterations", &self.iterations)
            .field("functions", &self.functions)
            .field("tracker", &self.tracker)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::console::{ConsoleEvent, RecordingConsole};
    use serde_json::json;
    use std::cell::Cell;

    fn quiet_runner(iterations: u64) -> Runner {
        Runner::new(RunnerConfig::new(iterations).with_log(false)).unwrap()
    }

    #[test]
    fn test_defaults() {
        let runner = Runner::default();
        assert_eq!(runner.iterations(), 10);
        assert!(runner.log());
        assert_eq!(runner.function_count(), 0);
    }

    #[test]
    fn test_zero_iterations_rejected() {
        assert_eq!(
            Runner::new(RunnerConfig::new(0)).unwrap_err(),
            VlugError::InvalidIterations(0)
        );

        let mut runner = quiet_runner(5);
        assert!(runner.set_iterations(0).is_err());
        assert_eq!(runner.iterations(), 5);
    }

    #[test]
    fn test_calls_each_function_iterations_times() {
        let calls = Rc::new(Cell::new(0u64));
        let counter = Rc::clone(&calls);
        let mut runner = quiet_runner(3).with_function(FunctionSpec::named("inc", move || {
            counter.set(counter.get() + 1);
        }));

        runner.run().unwrap();
        runner.run().unwrap();

        assert_eq!(calls.get(), 6);
        let entry = *runner.get_report().get("inc").unwrap();
        assert_eq!(entry.iterations_run, 6);
        assert!(entry.total_time >= 0.0);
        assert_eq!(entry.average, entry.total_time / 6.0);
    }

    #[test]
    fn test_unnamed_functions_get_index_identifiers() {
        let mut runner = quiet_runner(1)
            .with_function(|| {})
            .with_function(FunctionSpec::named("named", || {}))
            .with_function(FunctionSpec::new(|| {}));

        runner.run().unwrap();

        assert_eq!(
            runner.get_report().identifiers(),
            vec!["index:0", "index:2", "named"]
        );
    }

    #[test]
    fn test_set_iterations_affects_later_runs_only() {
        let mut runner = quiet_runner(2).with_function(FunctionSpec::named("f", || {}));
        runner.run().unwrap();
        runner.set_iterations(5).unwrap();
        runner.run().unwrap();

        assert_eq!(runner.get_report().get("f").unwrap().iterations_run, 7);
    }

    #[test]
    fn test_stamps_cover_whole_loop() {
        let clock = ManualClock::new();
        let tick = clock.clone();
        let mut runner = quiet_runner(4)
            .with_clock(Rc::new(clock.clone()))
            .with_function(FunctionSpec::named("tick", move || tick.advance(0.5)));

        runner.run().unwrap();

        let entry = *runner.get_report().get("tick").unwrap();
        assert_eq!(entry.total_time, 2.0);
        assert_eq!(entry.average, 0.5);
    }

    #[test]
    fn test_error_aborts_remaining_functions() {
        let mut attempts = 0;
        let mut runner = quiet_runner(3)
            .with_function(FunctionSpec::named("ok", || {}))
            .with_function(
                FunctionSpec::fallible(move || {
                    attempts += 1;
                    if attempts == 2 {
                        anyhow::bail!("boom");
                    }
                    Ok(())
                })
                .with_name("flaky"),
            )
            .with_function(FunctionSpec::named("never", || {}));

        let err = runner.run().unwrap_err();
        assert!(format!("{:#}", err).contains("boom"));
        assert!(err.to_string().contains("flaky"));

        let report = runner.get_report();
        assert_eq!(report.identifiers(), vec!["ok"]);
    }

    #[test]
    fn test_log_flag_controls_console_output() {
        let console = RecordingConsole::new();
        let mut runner = Runner::default()
            .with_console(Rc::new(console.clone()))
            .with_function(FunctionSpec::named("a", || {}));

        runner.run().unwrap();
        assert_eq!(console.events().len(), 2);
        assert_eq!(console.events()[0], ConsoleEvent::Time("a".to_string()));

        console.clear();
        runner.set_log(false);
        runner.run().unwrap();
        assert!(console.events().is_empty());
        assert_eq!(runner.get_report().get("a").unwrap().iterations_run, 20);
    }

    #[test]
    fn test_method_table_exposes_runner() {
        let (runner, table) = quiet_runner(2)
            .with_function(FunctionSpec::named("f", || {}))
            .into_method_table("runner");

        assert_eq!(
            table.method_names(),
            vec!["get_report", "run", "set_iterations", "set_log"]
        );

        table.call("run", &[]).unwrap();
        table.call("set_iterations", &[json!(3)]).unwrap();
        table.call("run", &[]).unwrap();
        table.call("set_log", &[json!(true)]).unwrap();

        assert!(runner.borrow().log());
        let report = table.call("get_report", &[]).unwrap();
        assert_eq!(report["f"]["iterationsRun"], 5);
    }

    #[test]
    fn test_method_table_rejects_bad_arguments() {
        let (_runner, table) = quiet_runner(2).into_method_table("runner");

        let err = table.call("set_iterations", &[json!("many")]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<VlugError>(),
            Some(VlugError::InvalidArgument { .. })
        ));

        let err = table.call("set_iterations", &[json!(0)]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<VlugError>(),
            Some(&VlugError::InvalidIterations(0))
        );
    }

    #[test]
    fn test_failed_function_leaves_timer_open() {
        let console = RecordingConsole::new();
        let mut runner = Runner::new(RunnerConfig::new(2))
            .unwrap()
            .with_console(Rc::new(console.clone()))
            .with_function(FunctionSpec::fallible(|| Err(anyhow!("nope"))).with_name("bad"));

        assert!(runner.run().is_err());
        assert_eq!(console.events(), vec![ConsoleEvent::Time("bad".to_string())]);
    }

    #[test]
    fn test_get_report_slot_during_run_fails_without_panic() {
        let slot: Rc<RefCell<Option<std::rc::Weak<MethodTable>>>> = Rc::new(RefCell::new(None));
        let inner = Rc::clone(&slot);
        let runner = quiet_runner(1).with_function(FunctionSpec::fallible(move || {
            let table = inner
                .borrow()
                .as_ref()
                .and_then(std::rc::Weak::upgrade)
                .ok_or_else(|| anyhow!("table not installed"))?;
            table.call("get_report", &[])?;
            Ok(())
        })
        .with_name("peek"));
        let (runner, table) = runner.into_method_table("runner");
        *slot.borrow_mut() = Some(Rc::downgrade(&table));

        let err = table.call("run", &[]).unwrap_err();
        assert!(format!("{:#}", err).contains("runner is already running"));

        // the runner is released once the failed run returns
        assert!(runner.try_borrow_mut().is_ok());
        assert!(table.call("get_report", &[]).unwrap().get("peek").is_none());
    }
}
