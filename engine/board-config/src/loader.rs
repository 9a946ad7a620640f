//! Configuration loading logic.
//!
//! Handles loading config from files and applying environment variable overrides.

use crate::CentralConfig;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Standard locations to search for config.toml
pub const CONFIG_SEARCH_PATHS: &[&str] = &[
    "config.toml",      // Current directory
    "../config.toml",   // Parent directory (when running from a crate directory)
    "/app/config.toml", // Docker container
];

/// Load the central configuration from config.toml.
///
/// Searches for config.toml in the following order:
/// 1. Path specified by SCRAMBLE_CONFIG environment variable
/// 2. Current directory (config.toml)
/// 3. Parent directory (../config.toml)
/// 4. Docker container path (/app/config.toml)
///
/// After loading, environment variable overrides are applied.
pub fn load_config() -> CentralConfig {
    if let Ok(path) = std::env::var("SCRAMBLE_CONFIG") {
        let path = PathBuf::from(&path);
        if path.exists() {
            info!("Loading config from SCRAMBLE_CONFIG: {}", path.display());
            return load_from_path(&path);
        }
        warn!(
            "SCRAMBLE_CONFIG={} not found, searching defaults",
            path.display()
        );
    }

    for path_str in CONFIG_SEARCH_PATHS {
        let path = Path::new(path_str);
        if path.exists() {
            info!("Loading config from {}", path.display());
            return load_from_path(path);
        }
    }

    debug!("No config.toml found, using built-in defaults");
    apply_env_overrides(CentralConfig::default())
}

/// Load configuration from a specific path.
///
/// A missing or malformed file is not fatal: a warning is logged and the
/// built-in defaults are used instead.
pub fn load_from_path(path: &Path) -> CentralConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => apply_env_overrides(config),
            Err(e) => {
                warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                apply_env_overrides(CentralConfig::default())
            }
        },
        Err(e) => {
            warn!("Failed to read {}: {}, using defaults", path.display(), e);
            apply_env_overrides(CentralConfig::default())
        }
    }
}

/// Macro to reduce env override boilerplate
macro_rules! env_override {
    // String field
    ($config:expr, $section:ident . $field:ident, $key:expr) => {
        if let Ok(v) = std::env::var($key) {
            $config.$section.$field = v;
        }
    };
    // Parseable field (u32, u64, f64, etc.)
    ($config:expr, $section:ident . $field:ident, $key:expr, parse) => {
        if let Ok(v) =
            std::env::var($key).and_then(|s| s.parse().map_err(|_| std::env::VarError::NotPresent))
        {
            $config.$section.$field = v;
        }
    };
    // Optional parseable field (Option<u64>, etc.)
    ($config:expr, $section:ident . $field:ident, $key:expr, optional_parse) => {
        if let Ok(v) =
            std::env::var($key).and_then(|s| s.parse().map_err(|_| std::env::VarError::NotPresent))
        {
            $config.$section.$field = Some(v);
        }
    };
}

/// Apply environment variable overrides to a configuration.
///
/// Environment variables follow the pattern: SCRAMBLE_<SECTION>_<KEY>.
/// Values that fail to parse are ignored.
pub fn apply_env_overrides(mut config: CentralConfig) -> CentralConfig {
    // Common
    env_override!(config, common.data_dir, "SCRAMBLE_COMMON_DATA_DIR");
    env_override!(config, common.log_level, "SCRAMBLE_COMMON_LOG_LEVEL");

    // Board
    env_override!(config, board.path, "SCRAMBLE_BOARD_PATH");

    // Simulation
    env_override!(
        config,
        simulation.players,
        "SCRAMBLE_SIMULATION_PLAYERS",
        parse
    );
    env_override!(
        config,
        simulation.player_prefix,
        "SCRAMBLE_SIMULATION_PLAYER_PREFIX"
    );
    env_override!(
        config,
        simulation.flips_per_player,
        "SCRAMBLE_SIMULATION_FLIPS_PER_PLAYER",
        parse
    );
    env_override!(
        config,
        simulation.min_delay_ms,
        "SCRAMBLE_SIMULATION_MIN_DELAY_MS",
        parse
    );
    env_override!(
        config,
        simulation.max_delay_ms,
        "SCRAMBLE_SIMULATION_MAX_DELAY_MS",
        parse
    );
    env_override!(
        config,
        simulation.flip_timeout_ms,
        "SCRAMBLE_SIMULATION_FLIP_TIMEOUT_MS",
        parse
    );
    env_override!(
        config,
        simulation.watchers,
        "SCRAMBLE_SIMULATION_WATCHERS",
        parse
    );
    env_override!(
        config,
        simulation.seed,
        "SCRAMBLE_SIMULATION_SEED",
        optional_parse
    );
    env_override!(
        config,
        simulation.log_interval,
        "SCRAMBLE_SIMULATION_LOG_INTERVAL",
        parse
    );

    config
}
