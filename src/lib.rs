//! Vlug - function timing and method interception toolkit
//!
//! This library measures how long functions take and keeps cumulative,
//! averaged statistics per identifier. It provides:
//!
//! - [`tracker`]: the per-identifier time tracker and the `TimingTracked` trait
//! - [`runner`]: repeated execution of a set of functions
//! - [`target`] and [`interceptor`]: replaceable method slots and the
//!   interceptor that wraps them with logging and timing hooks
//! - [`report`]: report snapshots with table and JSON output

pub mod cli;
pub mod clock;
pub mod config;
pub mod console;
pub mod error;
pub mod interceptor;
pub mod report;
pub mod runner;
pub mod suite;
pub mod target;
pub mod tracker;

pub use error::VlugError;
pub use interceptor::{Interceptor, InterceptorConfig, LogSpec, Message, TimeSpec};
pub use report::{Report, ReportEntry};
pub use runner::{FunctionSpec, Runner};
pub use target::{Method, MethodTable};
pub use tracker::{IterationMode, TimeTracker, TimingTracked};
