//! Tests for the configuration module.

use super::*;
use std::io::Write;

#[test]
fn test_default_config() {
    let config = CentralConfig::default();
    assert_eq!(config.common.data_dir, "./data");
    assert_eq!(config.common.log_level, "info");
    assert_eq!(config.board.path, "boards/ab.txt");
}

#[test]
fn test_simulation_defaults() {
    let config = CentralConfig::default();
    assert_eq!(config.simulation.players, 4);
    assert_eq!(config.simulation.player_prefix, "player");
    assert_eq!(config.simulation.flips_per_player, 100);
    assert!((config.simulation.min_delay_ms - 0.1).abs() < f64::EPSILON);
    assert!((config.simulation.max_delay_ms - 2.0).abs() < f64::EPSILON);
    assert_eq!(config.simulation.flip_timeout_ms, 5000);
    assert_eq!(config.simulation.watchers, 1);
    assert_eq!(config.simulation.seed, None);
    assert_eq!(config.simulation.log_interval, 25);
}

#[test]
fn test_accessors_match_struct_defaults() {
    let config = SimulationConfig::default();
    assert_eq!(config.players, players());
    assert_eq!(config.flip_timeout_ms, flip_timeout_ms());
    assert_eq!(board_path(), BoardConfig::default().path);
}

#[test]
fn test_scramble_env_overrides() {
    std::env::set_var("SCRAMBLE_COMMON_DATA_DIR", "/tmp/scramble");
    std::env::set_var("SCRAMBLE_BOARD_PATH", "boards/perfect.txt");
    std::env::set_var("SCRAMBLE_SIMULATION_SEED", "42");
    std::env::set_var("SCRAMBLE_SIMULATION_WATCHERS", "not-a-number");

    let config = apply_env_overrides(CentralConfig::default());
    assert_eq!(config.common.data_dir, "/tmp/scramble");
    assert_eq!(config.board.path, "boards/perfect.txt");
    assert_eq!(config.simulation.seed, Some(42));
    // Unparseable values are ignored
    assert_eq!(config.simulation.watchers, 1);

    std::env::remove_var("SCRAMBLE_COMMON_DATA_DIR");
    std::env::remove_var("SCRAMBLE_BOARD_PATH");
    std::env::remove_var("SCRAMBLE_SIMULATION_SEED");
    std::env::remove_var("SCRAMBLE_SIMULATION_WATCHERS");
}

#[test]
fn test_parse_config_toml() {
    let toml_content = r#"
[common]
log_level = "debug"

[board]
path = "boards/perfect.txt"

[simulation]
players = 8
flips_per_player = 10
min_delay_ms = 0.0
max_delay_ms = 5.5
seed = 7
"#;
    let config: CentralConfig = toml::from_str(toml_content).unwrap();
    assert_eq!(config.common.log_level, "debug");
    assert_eq!(config.board.path, "boards/perfect.txt");
    assert_eq!(config.simulation.players, 8);
    assert_eq!(config.simulation.flips_per_player, 10);
    assert!((config.simulation.max_delay_ms - 5.5).abs() < f64::EPSILON);
    assert_eq!(config.simulation.seed, Some(7));
}

#[test]
fn test_partial_config() {
    let toml_content = r#"
[simulation]
players = 2
"#;
    let config: CentralConfig = toml::from_str(toml_content).unwrap();
    assert_eq!(config.simulation.players, 2);
    assert_eq!(config.simulation.flips_per_player, 100); // Default
    assert_eq!(config.common.data_dir, "./data"); // Default
    assert_eq!(config.board.path, "boards/ab.txt"); // Default
}

#[test]
fn test_load_from_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[simulation]\nplayers = 16\nflips_per_player = 3").unwrap();

    let config = load_from_path(file.path());
    assert_eq!(config.simulation.players, 16);
    assert_eq!(config.simulation.flips_per_player, 3);
}

#[test]
fn test_invalid_file_falls_back_to_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[simulation\nplayers = ").unwrap();

    let config = load_from_path(file.path());
    assert_eq!(config.simulation.players, 4);
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_from_path(&dir.path().join("config.toml"));
    assert_eq!(config.simulation.flips_per_player, 100);
}

#[test]
fn test_config_clone() {
    let config = CentralConfig::default();
    let cloned = config.clone();
    assert_eq!(config.board.path, cloned.board.path);
    assert_eq!(config.simulation.players, cloned.simulation.players);
}
