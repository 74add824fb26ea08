//! Configuration for the runner and the `vlug` binary
//!
//! Configuration can be built in code or loaded from a `vlug.toml` file.
//!
//! # Example vlug.toml
//!
//! ```toml
//! [runner]
//! iterations = 10000
//! log = false
//!
//! [cli]
//! runs = 3
//! size = 4096
//! format = "json"
//! ```

use crate::cli::OutputFormat;
use crate::error::VlugError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Iterations used when none are configured
pub const DEFAULT_ITERATIONS: u64 = 10;

/// Settings for a [`Runner`](crate::runner::Runner)
///
/// # Example
/// ```
/// use vlug::config::RunnerConfig;
///
/// let config = RunnerConfig::default();
/// assert_eq!(config.iterations, 10);
/// assert!(config.log);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Times each function is called per `run()`; must be positive
    pub iterations: u64,
    /// Emit console timer output around each function
    pub log: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            log: true,
        }
    }
}

impl RunnerConfig {
    pub fn new(iterations: u64) -> Self {
        Self {
            iterations,
            ..Default::default()
        }
    }

    pub fn with_log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }

    pub fn validate(&self) -> std::result::Result<(), VlugError> {
        if self.iterations == 0 {
            return Err(VlugError::InvalidIterations(self.iterations));
        }
        Ok(())
    }
}

/// Settings for the built-in benchmark suite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// How many times the whole suite is run
    pub runs: u32,
    /// Length of the workload input vector
    pub size: usize,
    pub format: OutputFormat,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            runs: 1,
            size: 1000,
            format: OutputFormat::Text,
        }
    }
}

/// Root of a `vlug.toml` file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlugConfig {
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub cli: CliConfig,
}

impl VlugConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.runner.validate()?;
        if self.cli.runs == 0 {
            anyhow::bail!("cli.runs must be >= 1, got 0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_runner_config_defaults() {
        let config = RunnerConfig::default();
        assert_eq!(config.iterations, DEFAULT_ITERATIONS);
        assert!(config.log);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_runner_config_rejects_zero_iterations() {
        assert_eq!(
            RunnerConfig::new(0).validate(),
            Err(VlugError::InvalidIterations(0))
        );
    }

    #[test]
    fn test_explicit_log_false_survives_defaults() {
        let config: VlugConfig = VlugConfig::from_toml_str(
            r#"
            [runner]
            log = false
        "#,
        )
        .unwrap();
        assert!(!config.runner.log);
        assert_eq!(config.runner.iterations, DEFAULT_ITERATIONS);
    }

    #[test]
    fn test_parse_full_file() {
        let config = VlugConfig::from_toml_str(
            r#"
            [runner]
            iterations = 10000

            [cli]
            runs = 3
            size = 64
            format = "json"
        "#,
        )
        .unwrap();

        assert_eq!(config.runner.iterations, 10_000);
        assert_eq!(config.cli.runs, 3);
        assert_eq!(config.cli.size, 64);
        assert_eq!(config.cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(VlugConfig::from_toml_str("").unwrap(), VlugConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(VlugConfig::from_toml_str("[runner]\niterations = 0\n").is_err());
        assert!(VlugConfig::from_toml_str("[cli]\nruns = 0\n").is_err());
        assert!(VlugConfig::from_toml_str("[runner]\niterations = \"ten\"\n").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[runner]\niterations = 42").unwrap();

        let config = VlugConfig::from_file(file.path()).unwrap();
        assert_eq!(config.runner.iterations, 42);
    }

    #[test]
    fn test_from_missing_file() {
        let err = VlugConfig::from_file("/nonexistent/vlug.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
