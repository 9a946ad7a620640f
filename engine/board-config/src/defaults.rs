//! Default configuration values loaded from config.defaults.toml.
//!
//! The defaults file is embedded at compile time so a binary started without
//! any config.toml still behaves exactly like the documented defaults.

use once_cell::sync::Lazy;
use serde::Deserialize;

/// The embedded defaults TOML file (loaded at compile time)
const DEFAULTS_TOML: &str = include_str!("../../../config.defaults.toml");

/// Parsed defaults structure (parsed once at first use)
static DEFAULTS: Lazy<DefaultsConfig> = Lazy::new(|| {
    toml::from_str(DEFAULTS_TOML).expect("config.defaults.toml should be valid TOML")
});

// ============================================================================
// Internal structs for parsing config.defaults.toml
// ============================================================================

#[derive(Debug, Deserialize)]
struct DefaultsConfig {
    common: CommonDefaults,
    board: BoardDefaults,
    simulation: SimulationDefaults,
}

#[derive(Debug, Deserialize)]
struct CommonDefaults {
    data_dir: String,
    log_level: String,
}

#[derive(Debug, Deserialize)]
struct BoardDefaults {
    path: String,
}

#[derive(Debug, Deserialize)]
struct SimulationDefaults {
    players: u32,
    player_prefix: String,
    flips_per_player: u32,
    min_delay_ms: f64,
    max_delay_ms: f64,
    flip_timeout_ms: u64,
    watchers: u32,
    log_interval: u32,
}

// ============================================================================
// Public accessor functions
// ============================================================================

// Common
pub fn data_dir() -> &'static str {
    &DEFAULTS.common.data_dir
}
pub fn log_level() -> &'static str {
    &DEFAULTS.common.log_level
}

// Board
pub fn board_path() -> &'static str {
    &DEFAULTS.board.path
}

// Simulation
pub fn players() -> u32 {
    DEFAULTS.simulation.players
}
pub fn player_prefix() -> &'static str {
    &DEFAULTS.simulation.player_prefix
}
pub fn flips_per_player() -> u32 {
    DEFAULTS.simulation.flips_per_player
}
pub fn min_delay_ms() -> f64 {
    DEFAULTS.simulation.min_delay_ms
}
pub fn max_delay_ms() -> f64 {
    DEFAULTS.simulation.max_delay_ms
}
pub fn flip_timeout_ms() -> u64 {
    DEFAULTS.simulation.flip_timeout_ms
}
pub fn watchers() -> u32 {
    DEFAULTS.simulation.watchers
}
pub fn log_interval() -> u32 {
    DEFAULTS.simulation.log_interval
}
