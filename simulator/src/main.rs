//! Simulator - concurrent load generator for the Memory Scramble board
//!
//! A short-lived process that:
//! 1. Loads a board description (`boards/ab.txt` by default)
//! 2. Runs N players making random flips on the shared board, plus watchers
//! 3. Writes `./data/simulation_stats.json` and `./data/metrics.prom`
//!
//! With `--repl` it instead reads board commands from stdin.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::signal;
use tracing::{error, info, warn};

mod config;
mod metrics;
mod repl;
mod simulation;
mod stats;

use crate::config::Config;
use crate::simulation::Simulation;
use board_core::Board;

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    config.validate()?;

    init_tracing(&config.log_level)?;
    info!(log_level = %config.log_level, "Tracing initialized");

    let board = Board::parse_from_file(&config.board)
        .await
        .with_context(|| format!("Failed to load board from {}", config.board))?;
    info!("Loaded {} from {}", board.describe(), config.board);
    let board = Arc::new(board);

    if config.repl {
        info!("Reading commands from stdin (quit or end of input to stop)");
        return repl::serve(
            board,
            BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
            repl::DRAIN_TIMEOUT,
        )
        .await;
    }

    metrics::init_metrics();
    let simulation = Arc::new(Simulation::new(config, board));

    // Setup graceful shutdown
    let shutdown_sim = Arc::clone(&simulation);
    let shutdown_handle = tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received, stopping players...");
                shutdown_sim.shutdown();
            }
            Err(e) => warn!("Failed to listen for ctrl+c: {}", e),
        }
    });

    let run_result = simulation.run().await;
    shutdown_handle.abort();

    match run_result {
        Ok(_) => {
            info!("Simulation completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Simulation failed: {}", e);
            Err(e)
        }
    }
}
