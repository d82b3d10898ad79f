//! zonelab core: level confirmation and trade lifecycle replay.
//!
//! This crate contains the deterministic heart of the backtester:
//! - Domain types (bars, signals, zones, setups, simulated trades)
//! - `ZoneConfirmationMonitor`: raw zone signals → confirmed entries
//! - `TradeLifecycleSimulator`: trade setups → fills, exits, excursions
//! - Setup sizing and the monitor's observability journal
//!
//! Nothing here performs I/O or reads the wall clock. All time comes from
//! bar timestamps.

pub mod confirm;
pub mod domain;
pub mod journal;
pub mod simulate;
pub mod sizing;
pub mod validation;

pub use confirm::{ConfirmationEvent, ConfirmationType, MonitorConfig, ZoneConfirmationMonitor};
pub use domain::{
    Bar, CandidateLevel, Direction, ExitReason, LevelHandle, Outcome, SetupError, Side, Signal,
    SimulatedTrade, TradeSetup, Zone, ZoneError,
};
pub use journal::{EventSink, MonitorEvent, NullSink, TracingSink, VecSink};
pub use simulate::{PathPolicy, SimulatorConfig, TradeLifecycleSimulator};
pub use validation::ConfigError;
