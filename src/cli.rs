//! Command-line interface parsing for f1cast
//!
//! This module handles parsing of CLI arguments using clap and turns them
//! into the fetch configuration and strategy choice used at startup.

use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::FetchConfig;
use crate::scoring::{StrategyKind, DEFAULT_MODEL_PATH};

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified strategy name is not recognized
    #[error("Invalid strategy: '{0}'. Valid strategies: weighted, classifier")]
    InvalidStrategy(String),
}

/// f1cast - Predict the winner of the next Formula 1 race
#[derive(Parser, Debug)]
#[command(name = "f1cast")]
#[command(about = "Formula 1 race winner predictions from Jolpica F1 data")]
#[command(version)]
pub struct Cli {
    /// Number of drivers to list
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..=20))]
    pub top: u8,

    /// Show progress and data-loading details on stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Always query the API; never read or write the cache
    #[arg(long)]
    pub no_cache: bool,

    /// Directory for cached API responses
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Delete all cached responses before running
    #[arg(long)]
    pub clear_cache: bool,

    /// Scoring strategy
    ///
    /// Valid strategies: weighted, classifier
    #[arg(long, value_name = "STRATEGY", default_value = "weighted")]
    pub strategy: String,

    /// Model file for the classifier strategy
    #[arg(long, value_name = "FILE")]
    pub model_path: Option<PathBuf>,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub fetch: FetchConfig,
    pub top_n: usize,
    pub verbose: bool,
    pub clear_cache: bool,
    pub strategy: StrategyKind,
    pub model_path: PathBuf,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            top_n: 3,
            verbose: false,
            clear_cache: false,
            strategy: StrategyKind::default(),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
        }
    }
}

/// Parses a strategy string argument into a StrategyKind.
///
/// # Arguments
/// * `s` - The strategy string from CLI
///
/// # Returns
/// * `Ok(StrategyKind)` if the string matches a valid strategy
/// * `Err(CliError::InvalidStrategy)` if the string doesn't match
pub fn parse_strategy_arg(s: &str) -> Result<StrategyKind, CliError> {
    StrategyKind::from_str(s).ok_or_else(|| CliError::InvalidStrategy(s.to_string()))
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with appropriate settings
    /// * `Err(CliError)` if an invalid strategy was specified
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let strategy = parse_strategy_arg(&cli.strategy)?;
        let defaults = StartupConfig::default();

        let mut fetch = defaults.fetch;
        fetch.cache_enabled = !cli.no_cache;
        if let Some(ref dir) = cli.cache_dir {
            fetch.cache_dir = dir.clone();
        }

        Ok(StartupConfig {
            fetch,
            top_n: usize::from(cli.top),
            verbose: cli.verbose,
            clear_cache: cli.clear_cache,
            strategy,
            model_path: cli.model_path.clone().unwrap_or(defaults.model_path),
        })
    }

    /// Default log filter directive for the chosen verbosity
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "info"
        } else {
            "warn"
        }
    }
}
