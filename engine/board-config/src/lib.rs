//! Centralized configuration loading from config.toml.
//!
//! This crate provides the configuration structs and loading logic shared by
//! every binary in the workspace.
//!
//! # Configuration Priority
//!
//! Settings are loaded with the following priority (highest to lowest):
//! 1. Environment variables (`SCRAMBLE_<SECTION>_<KEY>`)
//! 2. config.toml file
//! 3. Built-in defaults (config.defaults.toml)
//!
//! # Environment Variable Override Pattern
//!
//! ```text
//! SCRAMBLE_<SECTION>_<KEY>=value
//!
//! Examples:
//!     SCRAMBLE_COMMON_DATA_DIR=/data
//!     SCRAMBLE_BOARD_PATH=boards/perfect.txt
//!     SCRAMBLE_SIMULATION_PLAYERS=8
//!     SCRAMBLE_SIMULATION_SEED=42
//! ```

mod defaults;
mod loader;
mod structs;

pub use defaults::*;
pub use loader::{apply_env_overrides, load_config, load_from_path, CONFIG_SEARCH_PATHS};
pub use structs::*;

#[cfg(test)]
mod tests;
