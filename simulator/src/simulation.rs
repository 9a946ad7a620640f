//! Concurrent players and watchers driving one shared board

use anyhow::Result;
use board_core::{Board, BoardError, Snapshot};
use indicatif::{ProgressBar, ProgressStyle};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio::time::error::Elapsed;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::metrics;
use crate::stats::{FlipOutcome, SimulationStats, SimulationStatsSnapshot};

/// Player id used for the final look at the board.
const OBSERVER: &str = "observer";

/// Classify the result of one timed flip.
pub fn classify(result: Result<Result<String, BoardError>, Elapsed>) -> FlipOutcome {
    match result {
        Err(_) => FlipOutcome::Timeout,
        Ok(Ok(state)) => {
            // Two cards of our own showing means the second flip matched
            let matched = state
                .parse::<Snapshot>()
                .map(|snap| snap.count_mine() == 2)
                .unwrap_or(false);
            if matched {
                FlipOutcome::Match
            } else {
                FlipOutcome::Success
            }
        }
        Ok(Err(BoardError::NoCardHere)) => FlipOutcome::NoCard,
        Ok(Err(BoardError::AlreadyControlled)) => FlipOutcome::AlreadyControlled,
        Ok(Err(_)) => FlipOutcome::Rejected,
    }
}

pub struct Simulation {
    config: Config,
    board: Arc<Board>,
    stats: SimulationStats,
    shutdown_signal: AtomicBool,
}

impl Simulation {
    pub fn new(config: Config, board: Arc<Board>) -> Self {
        let player_ids = (0..config.players).map(|i| config.player_id(i)).collect();
        let stats = SimulationStats::new(
            std::path::Path::new(&config.data_dir),
            board.describe(),
            player_ids,
        );

        Self {
            config,
            board,
            stats,
            shutdown_signal: AtomicBool::new(false),
        }
    }

    /// Run every player to completion, then write stats and metrics.
    pub async fn run(self: &Arc<Self>) -> Result<SimulationStatsSnapshot> {
        let seed = self.config.base_seed();
        info!(
            board = %self.board.describe(),
            players = self.config.players,
            flips_per_player = self.config.flips_per_player,
            min_delay_ms = self.config.min_delay_ms,
            max_delay_ms = self.config.max_delay_ms,
            watchers = self.config.watchers,
            seed,
            "Starting simulation"
        );

        // Progress bar only when stderr is a TTY
        let total_flips =
            u64::from(self.config.players) * u64::from(self.config.flips_per_player);
        let progress = if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
            let pb = ProgressBar::new(total_flips);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} flips ({eta})")?
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        let mut watchers = JoinSet::new();
        for index in 0..self.config.watchers {
            let sim = Arc::clone(self);
            watchers.spawn(async move { sim.watch_loop(format!("watcher{}", index)).await });
        }

        metrics::PLAYERS_ACTIVE.set(i64::from(self.config.players));
        let mut players = JoinSet::new();
        for index in 0..self.config.players {
            let sim = Arc::clone(self);
            let progress = progress.clone();
            let rng = ChaCha20Rng::seed_from_u64(seed.wrapping_add(u64::from(index)));
            players.spawn(async move { sim.play(index, rng, progress).await });
        }

        while let Some(joined) = players.join_next().await {
            if let Err(e) = joined {
                warn!("Player task failed: {}", e);
            }
        }
        watchers.shutdown().await;

        if let Some(pb) = progress {
            pb.finish_with_message("done");
        }

        self.report().await
    }

    pub fn shutdown(&self) {
        self.shutdown_signal.store(true, Ordering::Relaxed);
        info!("Shutdown signal set");
    }

    fn is_shutting_down(&self) -> bool {
        self.shutdown_signal.load(Ordering::Relaxed)
    }

    async fn play(&self, index: u32, mut rng: ChaCha20Rng, progress: Option<ProgressBar>) {
        let player = self.config.player_id(index);
        let slot = index as usize;
        let (rows, cols) = (self.board.rows(), self.board.cols());
        debug!(%player, "Player starting");

        for attempt in 1..=self.config.flips_per_player {
            if self.is_shutting_down() {
                info!(%player, attempt, "Player stopping early");
                break;
            }

            let delay_ms = rng.gen_range(self.config.min_delay_ms..=self.config.max_delay_ms);
            sleep(Duration::from_secs_f64(delay_ms / 1000.0)).await;

            let row = rng.gen_range(0..rows);
            let col = rng.gen_range(0..cols);

            let started = Instant::now();
            let result = timeout(
                self.config.flip_timeout(),
                self.board.flip(&player, row, col),
            )
            .await;
            let latency = started.elapsed();
            let outcome = classify(result);

            debug!(%player, attempt, row, col, outcome = outcome.as_str(), "Flip attempt");
            self.stats.record_flip(slot, outcome, latency);
            metrics::record_flip(outcome, latency);

            if let Some(ref pb) = progress {
                pb.inc(1);
            }

            if self.config.log_interval > 0 && attempt % self.config.log_interval == 0 {
                let message = || {
                    info!(
                        %player,
                        "Completed {}/{} flip attempts",
                        attempt,
                        self.config.flips_per_player
                    )
                };
                // Suspend progress bar while logging to avoid visual glitches
                match progress {
                    Some(ref pb) => pb.suspend(message),
                    None => message(),
                }
            }
        }

        self.stats.finish_player(slot);
        metrics::PLAYERS_ACTIVE.dec();
        debug!(%player, "Player finished");
    }

    /// Count change notifications until aborted.
    async fn watch_loop(&self, watcher: String) {
        loop {
            self.board.watch(&watcher).await;
            self.stats.record_watch_event();
            metrics::WATCH_EVENTS_TOTAL.inc();
            debug!(%watcher, version = self.board.version(), "Board changed");
        }
    }

    /// Log the summary, the final board, and persist stats and metrics.
    async fn report(&self) -> Result<SimulationStatsSnapshot> {
        let snapshot = self.stats.snapshot();

        info!(
            total_flip_attempts = snapshot.total_flip_attempts,
            successful_flips = snapshot.successful_flips,
            failed_flips = snapshot.failed_flips,
            matches_found = snapshot.matches_found,
            timeouts = snapshot.timeouts,
            watch_events = snapshot.watch_events,
            runtime_seconds = format!("{:.3}", snapshot.runtime_seconds),
            flips_per_second = format!("{:.1}", snapshot.flips_per_second),
            "Simulation complete"
        );
        for player in &snapshot.players {
            info!(
                player = %player.player_id,
                attempts = player.flip_attempts,
                successful = player.successful_flips,
                failed = player.failed_flips,
                matches = player.matches_found,
                avg_latency_ms = format!("{:.3}", player.avg_flip_latency_ms),
                duration_seconds = format!("{:.3}", player.duration_seconds),
                "Player summary"
            );
        }

        let final_state = self.board.look(OBSERVER).await;
        info!("Final board {}:\n{}", self.board.describe(), final_state);

        if let Ok(snap) = final_state.parse::<Snapshot>() {
            metrics::CARDS_REMAINING.set(snap.count_cards() as i64);
        }
        metrics::BOARD_VERSION.set(self.board.version() as i64);

        self.stats.write_stats();
        metrics::write_metrics(&self.config.metrics_path())?;
        info!(
            stats = %self.stats.stats_path().display(),
            metrics = %self.config.metrics_path().display(),
            "Wrote simulation outputs"
        );

        Ok(snapshot)
    }
}
