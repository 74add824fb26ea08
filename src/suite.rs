//! Built-in benchmark suite for the `vlug` binary
//!
//! Compares three ways of walking a vector, each run through a [`Runner`]
//! whose `run` slot is timed by an [`Interceptor`].

use crate::config::VlugConfig;
use crate::interceptor::{Interceptor, InterceptorConfig, TimeSpec};
use crate::report::Report;
use crate::runner::{FunctionSpec, Runner};
use crate::tracker::TimingTracked;
use anyhow::Result;
use serde::Serialize;
use std::hint::black_box;
use std::rc::Rc;

/// Reports produced by one invocation of the suite
#[derive(Debug, Clone, Serialize)]
pub struct SuiteOutput {
    /// Per-workload totals from the runner
    pub functions: Report,
    /// Whole-suite `run` calls timed by the interceptor
    pub runs: Report,
}

/// The iteration-style workloads over `0..size`
#[allow(clippy::needless_for_each, clippy::needless_range_loop)]
pub fn iteration_styles(size: usize) -> Vec<FunctionSpec> {
    let data: Rc<Vec<u64>> = Rc::new((0..size as u64).collect());

    let for_each_data = Rc::clone(&data);
    let index_data = Rc::clone(&data);
    let fold_data = data;

    vec![
        FunctionSpec::named("iter_for_each", move || {
            let mut acc = 0u64;
            for_each_data.iter().enumerate().for_each(|(i, v)| {
                acc = black_box(v + i as u64);
            });
            black_box(acc);
        }),
        FunctionSpec::named("index_loop", move || {
            let mut acc = 0u64;
            for i in 0..index_data.len() {
                acc = black_box(index_data[i] + i as u64);
            }
            black_box(acc);
        }),
        FunctionSpec::named("fold", move || {
            let acc = fold_data
                .iter()
                .enumerate()
                .fold(0u64, |_, (i, v)| black_box(v + i as u64));
            black_box(acc);
        }),
    ]
}

/// Run the suite `config.cli.runs` times
pub fn run_suite(config: &VlugConfig) -> Result<SuiteOutput> {
    config.validate()?;

    let runner = Runner::new(config.runner.clone())?
        .with_functions(iteration_styles(config.cli.size));
    let (runner, table) = runner.into_method_table("suite");

    let mut interceptor = Interceptor::new(
        InterceptorConfig::default()
            .with_log(config.runner.log)
            .time(TimeSpec::new(Rc::clone(&table), "run")),
    );

    for run in 0..config.cli.runs {
        tracing::debug!(run, "suite run");
        table.call("run", &[])?;
    }
    interceptor.restore();

    let functions = runner.borrow().get_report();
    Ok(SuiteOutput {
        functions,
        runs: interceptor.get_report(),
    })
}
