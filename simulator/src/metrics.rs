//! Prometheus metrics for the simulator.
//!
//! Flip outcomes, flip latency, watch events and board progress. The registry
//! is encoded in text format and written to `<data_dir>/metrics.prom` when a
//! run ends.

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::fs;
use std::path::Path;
use std::sync::Once;
use std::time::Duration;

use crate::stats::FlipOutcome;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ========== Flip Metrics ==========

    /// Flip attempts by outcome
    pub static ref FLIPS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("scramble_flips_total", "Flip attempts by outcome"),
        &["outcome"]
    ).unwrap();

    /// Time spent in one flip, including waiting for a contested card
    pub static ref FLIP_LATENCY_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new("scramble_flip_latency_seconds", "Time spent in one flip call")
            .buckets(vec![0.00001, 0.0001, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0])
    ).unwrap();

    // ========== Watch Metrics ==========

    /// Change notifications delivered to watchers
    pub static ref WATCH_EVENTS_TOTAL: IntCounter = IntCounter::with_opts(
        Opts::new("scramble_watch_events_total", "Change notifications delivered to watchers")
    ).unwrap();

    // ========== Board Gauges ==========

    /// Players that have not yet finished their flips
    pub static ref PLAYERS_ACTIVE: IntGauge = IntGauge::with_opts(
        Opts::new("scramble_players_active", "Players still making flip attempts")
    ).unwrap();

    /// Cards left on the board at the end of the run
    pub static ref CARDS_REMAINING: IntGauge = IntGauge::with_opts(
        Opts::new("scramble_cards_remaining", "Cards left on the board")
    ).unwrap();

    /// Board version (number of observable changes)
    pub static ref BOARD_VERSION: IntGauge = IntGauge::with_opts(
        Opts::new("scramble_board_version", "Number of observable board changes")
    ).unwrap();
}

static INIT: Once = Once::new();

/// Initialize and register all metrics with the registry.
/// Safe to call multiple times - only initializes once.
pub fn init_metrics() {
    INIT.call_once(|| {
        REGISTRY.register(Box::new(FLIPS_TOTAL.clone())).unwrap();
        REGISTRY
            .register(Box::new(FLIP_LATENCY_SECONDS.clone()))
            .unwrap();
        REGISTRY
            .register(Box::new(WATCH_EVENTS_TOTAL.clone()))
            .unwrap();
        REGISTRY.register(Box::new(PLAYERS_ACTIVE.clone())).unwrap();
        REGISTRY.register(Box::new(CARDS_REMAINING.clone())).unwrap();
        REGISTRY.register(Box::new(BOARD_VERSION.clone())).unwrap();
    });
}

/// Record one flip attempt.
pub fn record_flip(outcome: FlipOutcome, latency: Duration) {
    FLIPS_TOTAL.with_label_values(&[outcome.as_str()]).inc();
    FLIP_LATENCY_SECONDS.observe(latency.as_secs_f64());
}

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .context("Failed to encode metrics")?;
    String::from_utf8(buffer).context("Metrics text is not UTF-8")
}

/// Write the encoded metrics to `path` (write-then-rename).
pub fn write_metrics(path: &Path) -> Result<()> {
    let text = encode_metrics()?;
    let temp_path = path.with_extension("prom.tmp");
    fs::write(&temp_path, text)
        .with_context(|| format!("Failed to write {}", temp_path.display()))?;
    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename metrics file to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_init() {
        init_metrics();
        init_metrics();
    }

    #[test]
    fn test_record_flip() {
        init_metrics();
        let before = FLIPS_TOTAL.with_label_values(&["no_card"]).get();

        record_flip(FlipOutcome::NoCard, Duration::from_millis(3));

        assert!(FLIPS_TOTAL.with_label_values(&["no_card"]).get() > before);
    }

    #[test]
    fn test_encode_metrics() {
        init_metrics();
        record_flip(FlipOutcome::Success, Duration::from_micros(50));
        WATCH_EVENTS_TOTAL.inc();

        let output = encode_metrics().unwrap();
        assert!(output.contains("scramble_flips_total"));
        assert!(output.contains("outcome=\"success\""));
        assert!(output.contains("scramble_flip_latency_seconds"));
        assert!(output.contains("scramble_watch_events_total"));
    }

    #[test]
    fn test_write_metrics() {
        init_metrics();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.prom");

        write_metrics(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("scramble_players_active"));
        assert!(!dir.path().join("metrics.prom.tmp").exists());
    }
}
