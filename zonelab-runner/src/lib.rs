//! zonelab runner: backtest pipeline, configuration and statistics.
//!
//! This crate builds on `zonelab-core` to provide:
//! - TOML configuration with validation and content hashing
//! - The forward pipeline: bars → confirmations → trades → statistics
//! - Parallel batch simulation of independent setups
//! - Trade statistics with direction and trading-session breakdowns

pub mod config;
pub mod metrics;
pub mod runner;
pub mod session;

pub use config::{BacktestConfig, ConfigHash, ConfigLoadError};
pub use metrics::{OutcomeCounts, Summary, TradeStatistics};
pub use runner::{
    run_backtest, run_backtest_with_classifier, simulate_batch, BacktestResult, ExpiryCounts,
    RunError, WatchRequest, SCHEMA_VERSION,
};
pub use session::{Session, SessionClassifier, UsFuturesSessions};
