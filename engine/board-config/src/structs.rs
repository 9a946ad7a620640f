//! Configuration struct definitions.
//!
//! All config structs with serde deserialization support and default values.

use crate::defaults;
use serde::Deserialize;

// ============================================================================
// Serde default functions (required for #[serde(default = "...")])
// These call the accessor functions from defaults module
// ============================================================================

fn d_data_dir() -> String {
    defaults::data_dir().into()
}
fn d_log_level() -> String {
    defaults::log_level().into()
}
fn d_board_path() -> String {
    defaults::board_path().into()
}
fn d_players() -> u32 {
    defaults::players()
}
fn d_player_prefix() -> String {
    defaults::player_prefix().into()
}
fn d_flips() -> u32 {
    defaults::flips_per_player()
}
fn d_min_delay() -> f64 {
    defaults::min_delay_ms()
}
fn d_max_delay() -> f64 {
    defaults::max_delay_ms()
}
fn d_flip_timeout() -> u64 {
    defaults::flip_timeout_ms()
}
fn d_watchers() -> u32 {
    defaults::watchers()
}
fn d_log_interval() -> u32 {
    defaults::log_interval()
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Root configuration structure matching config.toml
#[derive(Debug, Deserialize, Default, Clone)]
pub struct CentralConfig {
    #[serde(default)]
    pub common: CommonConfig,
    #[serde(default)]
    pub board: BoardConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Common configuration shared by all components
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CommonConfig {
    #[serde(default = "d_data_dir")]
    pub data_dir: String,
    #[serde(default = "d_log_level")]
    pub log_level: String,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            data_dir: defaults::data_dir().into(),
            log_level: defaults::log_level().into(),
        }
    }
}

/// Which board description to load
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BoardConfig {
    #[serde(default = "d_board_path")]
    pub path: String,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            path: defaults::board_path().into(),
        }
    }
}

/// Synthetic load generated by the simulator
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimulationConfig {
    #[serde(default = "d_players")]
    pub players: u32,
    /// Player ids are `<player_prefix><index>`
    #[serde(default = "d_player_prefix")]
    pub player_prefix: String,
    #[serde(default = "d_flips")]
    pub flips_per_player: u32,
    #[serde(default = "d_min_delay")]
    pub min_delay_ms: f64,
    #[serde(default = "d_max_delay")]
    pub max_delay_ms: f64,
    /// Upper bound on a single flip, including time spent waiting for a card
    #[serde(default = "d_flip_timeout")]
    pub flip_timeout_ms: u64,
    #[serde(default = "d_watchers")]
    pub watchers: u32,
    /// RNG seed (None = derive from the clock)
    #[serde(default)]
    pub seed: Option<u64>,
    /// Log progress every N flips per player (0 = never)
    #[serde(default = "d_log_interval")]
    pub log_interval: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            players: defaults::players(),
            player_prefix: defaults::player_prefix().into(),
            flips_per_player: defaults::flips_per_player(),
            min_delay_ms: defaults::min_delay_ms(),
            max_delay_ms: defaults::max_delay_ms(),
            flip_timeout_ms: defaults::flip_timeout_ms(),
            watchers: defaults::watchers(),
            seed: None,
            log_interval: defaults::log_interval(),
        }
    }
}
