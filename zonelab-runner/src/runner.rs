//! Backtest runner: wires together the monitor, the simulator and the
//! statistics.
//!
//! Entry points:
//! - `run_backtest()`: bars + watch requests + config → `BacktestResult`,
//!   sessions classified with [`UsFuturesSessions`].
//! - `run_backtest_with_classifier()`: same, with a caller-supplied session
//!   classifier.
//! - `simulate_batch()`: replay many setups against one bar series in
//!   parallel. Used by the pipeline and by callers that confirm entries
//!   themselves.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use zonelab_core::confirm::{ExpiryReason, LevelState};
use zonelab_core::journal::{Tee, TracingSink, VecSink};
use zonelab_core::{
    Bar, ConfigError, ConfirmationEvent, MonitorEvent, Signal, SimulatedTrade,
    TradeLifecycleSimulator, TradeSetup, Zone, ZoneConfirmationMonitor,
};

use crate::config::{BacktestConfig, ConfigHash};
use crate::metrics::TradeStatistics;
use crate::session::{SessionClassifier, UsFuturesSessions};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("bars out of order at index {index}")]
    UnsortedBars { index: usize },
    #[error("result serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Current schema version for persisted results.
pub const SCHEMA_VERSION: u32 = 1;

/// A zone to watch on behalf of a signal. The watch starts with the first
/// bar stamped at or after the signal's origin time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchRequest {
    pub zone: Zone,
    pub signal: Signal,
}

impl WatchRequest {
    pub fn new(zone: Zone, signal: Signal) -> Self {
        Self { zone, signal }
    }
}

/// How the watches that never confirmed ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryCounts {
    pub timeout: usize,
    pub risk_too_high: usize,
    /// Still monitoring when the bars ran out, or never started.
    pub unresolved: usize,
}

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub config_hash: ConfigHash,
    pub bar_count: usize,
    pub watch_count: usize,
    pub confirmations: Vec<ConfirmationEvent>,
    pub expiries: ExpiryCounts,
    /// Confirmations whose entry plan produced an impossible setup.
    pub rejected_setups: usize,
    /// One trade per accepted setup, in confirmation order.
    pub trades: Vec<SimulatedTrade>,
    pub statistics: TradeStatistics,
    pub journal: Vec<MonitorEvent>,
}

impl BacktestResult {
    /// Content hash of the whole result. Identical inputs produce identical
    /// fingerprints.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_vec(self)?;
        Ok(blake3::hash(&json).to_hex().to_string())
    }
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Run a backtest with the default US futures session breakdown.
pub fn run_backtest(
    bars: &[Bar],
    watches: &[WatchRequest],
    config: &BacktestConfig,
) -> Result<BacktestResult, RunError> {
    run_backtest_with_classifier(bars, watches, config, &UsFuturesSessions::default())
}

/// Run a backtest: Bar Feed → Monitor → Simulator → Statistics.
///
/// Each watch is registered when the feed reaches its origin time. Every
/// confirmation becomes a setup through the configured entry plan and is
/// replayed over the bars after the confirming bar.
pub fn run_backtest_with_classifier<C>(
    bars: &[Bar],
    watches: &[WatchRequest],
    config: &BacktestConfig,
    classifier: &C,
) -> Result<BacktestResult, RunError>
where
    C: SessionClassifier + ?Sized,
{
    config.validate()?;
    check_sorted(bars)?;

    let mut monitor = ZoneConfirmationMonitor::new(config.monitor.clone())?;
    let simulator = TradeLifecycleSimulator::new(config.simulator.clone())?;

    // Registration order: by origin time, ties in request order.
    let mut pending: Vec<&WatchRequest> = watches.iter().collect();
    pending.sort_by_key(|w| w.signal.origin_time);
    let mut pending = pending.into_iter().peekable();

    let mut sink = Tee(VecSink::new(), TracingSink);
    let mut confirmations = Vec::new();
    let mut jobs = Vec::new();
    let mut expiries = ExpiryCounts::default();
    let mut rejected_setups = 0;

    for (index, bar) in bars.iter().enumerate() {
        while let Some(watch) = pending.next_if(|w| w.signal.origin_time <= bar.timestamp) {
            monitor.monitor_level_with(watch.zone.clone(), watch.signal.clone(), &mut sink);
        }

        for event in monitor.process_candle_with(bar, &mut sink) {
            match config.entry.build(&event) {
                Ok(setup) => jobs.push((setup, index + 1)),
                Err(err) => {
                    debug!(handle = ?event.handle, error = %err, "setup rejected");
                    rejected_setups += 1;
                }
            }
            confirmations.push(event);
        }

        for watch in monitor.drain_terminal() {
            match watch.state {
                LevelState::Expired(ExpiryReason::Timeout) => expiries.timeout += 1,
                LevelState::Expired(ExpiryReason::RiskTooHigh) => expiries.risk_too_high += 1,
                LevelState::Confirmed | LevelState::Monitoring => {}
            }
        }
    }
    expiries.unresolved = monitor.active_count() + pending.count();

    let trades = simulate_batch(&simulator, &jobs, bars);
    let statistics = TradeStatistics::compute(&trades, classifier);

    info!(
        bars = bars.len(),
        watches = watches.len(),
        confirmations = confirmations.len(),
        trades = trades.len(),
        win_rate = statistics.overall.win_rate,
        total_pnl = statistics.overall.total_pnl,
        "backtest complete"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        config_hash: config.fingerprint()?,
        bar_count: bars.len(),
        watch_count: watches.len(),
        confirmations,
        expiries,
        rejected_setups,
        trades,
        statistics,
        journal: sink.0.into_events(),
    })
}

/// Replay every `(setup, first_bar)` job against `bars[first_bar..]` in
/// parallel. Results come back in job order.
pub fn simulate_batch(
    simulator: &TradeLifecycleSimulator,
    jobs: &[(TradeSetup, usize)],
    bars: &[Bar],
) -> Vec<SimulatedTrade> {
    use rayon::prelude::*;

    jobs.par_iter()
        .map(|(setup, first_bar)| {
            let from = (*first_bar).min(bars.len());
            simulator.simulate(setup, &bars[from..])
        })
        .collect()
}

fn check_sorted(bars: &[Bar]) -> Result<(), RunError> {
    match bars
        .windows(2)
        .position(|pair| pair[1].timestamp < pair[0].timestamp)
    {
        Some(i) => Err(RunError::UnsortedBars { index: i + 1 }),
        None => Ok(()),
    }
}
