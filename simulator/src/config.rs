//! Configuration for the simulator
//!
//! Configuration is loaded from config.toml with environment variable overrides.
//! CLI arguments take highest priority, followed by env vars, then config.toml.

use anyhow::{anyhow, Result};
use board_config::{load_config, CentralConfig};
use board_core::commands::is_valid_player_id;
use clap::Parser;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::level_filters::LevelFilter;

// Load central config once at startup
static CENTRAL_CONFIG: Lazy<CentralConfig> = Lazy::new(load_config);

fn default_board() -> String {
    CENTRAL_CONFIG.board.path.clone()
}

fn default_data_dir() -> String {
    CENTRAL_CONFIG.common.data_dir.clone()
}

fn default_log_level() -> String {
    CENTRAL_CONFIG.common.log_level.clone()
}

fn default_players() -> u32 {
    CENTRAL_CONFIG.simulation.players
}

fn default_player_prefix() -> String {
    CENTRAL_CONFIG.simulation.player_prefix.clone()
}

fn default_flips() -> u32 {
    CENTRAL_CONFIG.simulation.flips_per_player
}

fn default_min_delay() -> f64 {
    CENTRAL_CONFIG.simulation.min_delay_ms
}

fn default_max_delay() -> f64 {
    CENTRAL_CONFIG.simulation.max_delay_ms
}

fn default_flip_timeout() -> u64 {
    CENTRAL_CONFIG.simulation.flip_timeout_ms
}

fn default_watchers() -> u32 {
    CENTRAL_CONFIG.simulation.watchers
}

fn default_log_interval() -> u32 {
    CENTRAL_CONFIG.simulation.log_interval
}

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(name = "simulator")]
#[command(about = "Memory Scramble simulator - concurrent players on one shared board")]
#[command(
    long_about = "Loads a board description and either drives it with concurrent synthetic
players (the default) or reads board commands from stdin (--repl).

Configuration is loaded from config.toml with environment variable overrides.
CLI arguments take highest priority."
)]
pub struct Config {
    /// Board description file (first line ROWSxCOLS, then one card per line)
    #[arg(long, default_value_t = default_board())]
    pub board: String,

    /// Directory for the stats and metrics files
    #[arg(long, default_value_t = default_data_dir())]
    pub data_dir: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value_t = default_log_level())]
    pub log_level: String,

    /// Number of concurrent players
    #[arg(long, default_value_t = default_players())]
    pub players: u32,

    /// Player ids are <prefix><index>
    #[arg(long, default_value_t = default_player_prefix())]
    pub player_prefix: String,

    /// Flip attempts made by each player
    #[arg(long, default_value_t = default_flips())]
    pub flips_per_player: u32,

    /// Minimum pause before each flip, in milliseconds
    #[arg(long, default_value_t = default_min_delay())]
    pub min_delay_ms: f64,

    /// Maximum pause before each flip, in milliseconds
    #[arg(long, default_value_t = default_max_delay())]
    pub max_delay_ms: f64,

    /// Give up on a single flip (including waiting for the card) after this long
    #[arg(long, default_value_t = default_flip_timeout())]
    pub flip_timeout_ms: u64,

    /// Number of tasks watching the board for changes
    #[arg(long, default_value_t = default_watchers())]
    pub watchers: u32,

    /// RNG seed for reproducible runs (defaults to config.toml, then the clock)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log each player's progress every N flips (0 to disable)
    #[arg(long, default_value_t = default_log_interval())]
    pub log_interval: u32,

    /// Read board commands from stdin instead of running the simulation
    #[arg(long)]
    pub repl: bool,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.board.is_empty() {
            return Err(anyhow!("board path cannot be empty"));
        }

        if self.players == 0 {
            return Err(anyhow!("players must be greater than 0"));
        }

        if self.flips_per_player == 0 {
            return Err(anyhow!("flips_per_player must be greater than 0"));
        }

        // Every generated id must itself be a valid player id
        if !is_valid_player_id(&self.player_id(0)) {
            return Err(anyhow!(
                "invalid player_prefix '{}', expected letters, digits or underscores",
                self.player_prefix
            ));
        }

        if !self.min_delay_ms.is_finite() || self.min_delay_ms < 0.0 {
            return Err(anyhow!("min_delay_ms must be a non-negative number"));
        }

        if !self.max_delay_ms.is_finite() || self.max_delay_ms < self.min_delay_ms {
            return Err(anyhow!(
                "max_delay_ms ({}) must be at least min_delay_ms ({})",
                self.max_delay_ms,
                self.min_delay_ms
            ));
        }

        if self.flip_timeout_ms == 0 {
            return Err(anyhow!("flip_timeout_ms must be greater than 0"));
        }

        if self.log_level.parse::<LevelFilter>().is_err() {
            return Err(anyhow!(
                "invalid log level '{}', expected one of trace, debug, info, warn, error",
                self.log_level
            ));
        }

        Ok(())
    }

    pub fn player_id(&self, index: u32) -> String {
        format!("{}{}", self.player_prefix, index)
    }

    pub fn flip_timeout(&self) -> Duration {
        Duration::from_millis(self.flip_timeout_ms)
    }

    /// Seed shared by all players; each player offsets it by its index.
    pub fn base_seed(&self) -> u64 {
        self.seed
            .or(CENTRAL_CONFIG.simulation.seed)
            .unwrap_or_else(|| {
                SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_nanos() as u64)
                    .unwrap_or(0)
            })
    }

    pub fn metrics_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("metrics.prom")
    }
}
