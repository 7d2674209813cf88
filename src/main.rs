//! f1cast - Predict the winner of the next Formula 1 race
//!
//! Fetches the upcoming race, standings, results, qualifying and circuit
//! history from the Jolpica F1 API (cached on disk) and prints a ranked list.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use f1cast::cli::{Cli, StartupConfig};
use f1cast::data::F1DataFetcher;
use f1cast::engine::PredictionEngine;
use f1cast::report;
use f1cast::scoring::build_strategy;

/// Installs the stderr log subscriber; `RUST_LOG` overrides the default level
fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(config.log_level());

    let fetcher = F1DataFetcher::new(config.fetch.clone());
    if config.clear_cache {
        fetcher.clear_cache();
    }

    let strategy = build_strategy(config.strategy, &config.model_path);
    let engine = PredictionEngine::new(fetcher, strategy);

    match engine.predict_next_race(config.top_n).await {
        Ok(result) => {
            print!("{}", report::render(&result, config.verbose));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprint!("{}", report::render_error(&e));
            ExitCode::FAILURE
        }
    }
}
