//! CLI argument parsing for vlug

use crate::config::VlugConfig;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable table on stderr (default)
    #[default]
    Text,
    /// JSON on stdout for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "vlug")]
#[command(version)]
#[command(about = "Time iteration styles with the vlug runner and interceptor", long_about = None)]
pub struct Cli {
    /// Iterations per workload per run (overrides the config file)
    #[arg(short = 'n', long = "iterations", value_name = "N")]
    pub iterations: Option<u64>,

    /// Number of times the suite is run (overrides the config file)
    #[arg(short = 'r', long = "runs", value_name = "RUNS")]
    pub runs: Option<u32>,

    /// Length of the workload input vector
    #[arg(short = 's', long = "size", value_name = "LEN")]
    pub size: Option<usize>,

    /// Load settings from a vlug.toml file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long = "format", value_enum)]
    pub format: Option<OutputFormat>,

    /// Suppress console timer output
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Enable trace-level debug logging
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Merge the config file (if any) with command-line overrides
    pub fn resolve(&self) -> Result<VlugConfig> {
        let mut config = match &self.config {
            Some(path) => VlugConfig::from_file(path)?,
            None => VlugConfig::default(),
        };

        if let Some(iterations) = self.iterations {
            config.runner.iterations = iterations;
        }
        if let Some(runs) = self.runs {
            config.cli.runs = runs;
        }
        if let Some(size) = self.size {
            config.cli.size = size;
        }
        if let Some(format) = self.format {
            config.cli.format = format;
        }
        if self.quiet {
            config.runner.log = false;
        }

        config.validate()?;
        Ok(config)
    }
}
