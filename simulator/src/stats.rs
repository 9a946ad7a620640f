//! Simulation statistics tracking and persistence.
//!
//! This module tracks, per player and in total:
//! - Flip attempts and how each one ended
//! - Matches found
//! - Time spent inside `flip` (including waiting for contested cards)
//!
//! Stats are written to a JSON file at the end of a run.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How a single flip attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipOutcome {
    /// The card was flipped
    Success,
    /// The flip completed a matching pair
    Match,
    /// There was no card at the position
    NoCard,
    /// The card was held by a player (possibly the flipper)
    AlreadyControlled,
    /// Any other rejection, such as an out-of-range position
    Rejected,
    /// The flip did not finish within the flip timeout
    Timeout,
}

impl FlipOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, FlipOutcome::Success | FlipOutcome::Match)
    }

    /// Label used for the outcome in metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            FlipOutcome::Success => "success",
            FlipOutcome::Match => "match",
            FlipOutcome::NoCard => "no_card",
            FlipOutcome::AlreadyControlled => "already_controlled",
            FlipOutcome::Rejected => "rejected",
            FlipOutcome::Timeout => "timeout",
        }
    }
}

/// Lock-free counters for one player.
#[derive(Debug)]
pub struct PlayerStats {
    player_id: String,
    flip_attempts: AtomicU32,
    successful_flips: AtomicU32,
    matches_found: AtomicU32,
    no_card: AtomicU32,
    already_controlled: AtomicU32,
    rejected: AtomicU32,
    timeouts: AtomicU32,
    /// Sum of flip latencies (microseconds)
    total_latency_us: AtomicU64,
    /// Time from start until the last attempt (milliseconds)
    duration_ms: AtomicU64,
}

/// Serializable per-player stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerStatsSnapshot {
    pub player_id: String,
    pub flip_attempts: u32,
    pub successful_flips: u32,
    pub failed_flips: u32,
    pub matches_found: u32,
    pub no_card: u32,
    pub already_controlled: u32,
    pub rejected: u32,
    pub timeouts: u32,
    pub avg_flip_latency_ms: f64,
    pub duration_seconds: f64,
}

impl PlayerStats {
    fn new(player_id: String) -> Self {
        Self {
            player_id,
            flip_attempts: AtomicU32::new(0),
            successful_flips: AtomicU32::new(0),
            matches_found: AtomicU32::new(0),
            no_card: AtomicU32::new(0),
            already_controlled: AtomicU32::new(0),
            rejected: AtomicU32::new(0),
            timeouts: AtomicU32::new(0),
            total_latency_us: AtomicU64::new(0),
            duration_ms: AtomicU64::new(0),
        }
    }

    fn record(&self, outcome: FlipOutcome, latency: Duration) {
        self.flip_attempts.fetch_add(1, Ordering::Relaxed);
        self.total_latency_us
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);

        if outcome.is_success() {
            self.successful_flips.fetch_add(1, Ordering::Relaxed);
        }

        let counter = match outcome {
            FlipOutcome::Success => return,
            FlipOutcome::Match => &self.matches_found,
            FlipOutcome::NoCard => &self.no_card,
            FlipOutcome::AlreadyControlled => &self.already_controlled,
            FlipOutcome::Rejected => &self.rejected,
            FlipOutcome::Timeout => &self.timeouts,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> PlayerStatsSnapshot {
        let attempts = self.flip_attempts.load(Ordering::Relaxed);
        let successful = self.successful_flips.load(Ordering::Relaxed);
        let latency_us = self.total_latency_us.load(Ordering::Relaxed);

        let avg_flip_latency_ms = if attempts > 0 {
            latency_us as f64 / attempts as f64 / 1000.0
        } else {
            0.0
        };

        PlayerStatsSnapshot {
            player_id: self.player_id.clone(),
            flip_attempts: attempts,
            successful_flips: successful,
            failed_flips: attempts.saturating_sub(successful),
            matches_found: self.matches_found.load(Ordering::Relaxed),
            no_card: self.no_card.load(Ordering::Relaxed),
            already_controlled: self.already_controlled.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            avg_flip_latency_ms,
            duration_seconds: self.duration_ms.load(Ordering::Relaxed) as f64 / 1000.0,
        }
    }
}

/// Aggregated simulation statistics, designed for lock-free updates.
#[derive(Debug)]
pub struct SimulationStats {
    /// Board summary, e.g. `Board(5x5, 25 cards)`
    board: String,
    players: Vec<PlayerStats>,
    /// Change notifications received by watchers
    watch_events: AtomicU64,
    /// Start time for rate calculations
    start_time: Instant,
    /// Path to write stats file
    stats_path: PathBuf,
}

/// Serializable stats for JSON output.
#[derive(Debug, Serialize, Deserialize)]
pub struct SimulationStatsSnapshot {
    pub board: String,
    pub total_flip_attempts: u32,
    pub successful_flips: u32,
    pub failed_flips: u32,
    pub matches_found: u32,
    pub timeouts: u32,
    pub watch_events: u64,
    pub flips_per_second: f64,
    pub runtime_seconds: f64,
    pub timestamp: u64,
    pub players: Vec<PlayerStatsSnapshot>,
}

impl SimulationStats {
    /// Create a stats tracker with one slot per player id.
    pub fn new(data_dir: &Path, board: String, player_ids: Vec<String>) -> Self {
        let stats_path = data_dir.join("simulation_stats.json");

        // Ensure data directory exists
        if let Err(e) = fs::create_dir_all(data_dir) {
            warn!("Failed to create data directory: {}", e);
        }

        Self {
            board,
            players: player_ids.into_iter().map(PlayerStats::new).collect(),
            watch_events: AtomicU64::new(0),
            start_time: Instant::now(),
            stats_path,
        }
    }

    /// Record one flip attempt by the player at `index`.
    pub fn record_flip(&self, index: usize, outcome: FlipOutcome, latency: Duration) {
        if let Some(player) = self.players.get(index) {
            player.record(outcome, latency);
        }
    }

    /// Mark the player at `index` as finished.
    pub fn finish_player(&self, index: usize) {
        if let Some(player) = self.players.get(index) {
            let elapsed = self.start_time.elapsed().as_millis() as u64;
            player.duration_ms.store(elapsed, Ordering::Relaxed);
        }
    }

    pub fn record_watch_event(&self) {
        self.watch_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current stats.
    pub fn snapshot(&self) -> SimulationStatsSnapshot {
        let players: Vec<PlayerStatsSnapshot> =
            self.players.iter().map(PlayerStats::snapshot).collect();
        let runtime = self.start_time.elapsed().as_secs_f64();

        let total_flip_attempts: u32 = players.iter().map(|p| p.flip_attempts).sum();
        let successful_flips: u32 = players.iter().map(|p| p.successful_flips).sum();

        let flips_per_second = if runtime > 0.0 {
            total_flip_attempts as f64 / runtime
        } else {
            0.0
        };

        SimulationStatsSnapshot {
            board: self.board.clone(),
            total_flip_attempts,
            successful_flips,
            failed_flips: total_flip_attempts - successful_flips,
            matches_found: players.iter().map(|p| p.matches_found).sum(),
            timeouts: players.iter().map(|p| p.timeouts).sum(),
            watch_events: self.watch_events.load(Ordering::Relaxed),
            flips_per_second,
            runtime_seconds: runtime,
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            players,
        }
    }

    /// Write stats to JSON file (atomic write-then-rename).
    pub fn write_stats(&self) {
        let snapshot = self.snapshot();

        let json = match serde_json::to_string_pretty(&snapshot) {
            Ok(j) => j,
            Err(e) => {
                warn!("Failed to serialize simulation stats: {}", e);
                return;
            }
        };

        // Write to temp file then rename (atomic on most filesystems)
        let temp_path = self.stats_path.with_extension("json.tmp");
        match fs::File::create(&temp_path) {
            Ok(mut file) => {
                if let Err(e) = file.write_all(json.as_bytes()) {
                    warn!("Failed to write simulation stats: {}", e);
                    return;
                }
            }
            Err(e) => {
                warn!("Failed to create temp stats file: {}", e);
                return;
            }
        }

        if let Err(e) = fs::rename(&temp_path, &self.stats_path) {
            warn!("Failed to rename stats file: {}", e);
            let _ = fs::remove_file(&temp_path);
            return;
        }

        debug!("Wrote simulation stats to {}", self.stats_path.display());
    }

    pub fn stats_path(&self) -> &Path {
        &self.stats_path
    }
}
