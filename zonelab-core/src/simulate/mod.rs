//! Trade lifecycle simulation: fill, exits, stop management, excursions.

mod config;
mod excursion;
mod path_policy;
mod simulator;
mod stops;

pub use config::{AdjustmentOrder, SimulatorConfig, TrailingRule};
pub use excursion::Excursion;
pub use path_policy::{first_exit, first_exit_refined, ExitTouch, PathPolicy};
pub use simulator::TradeLifecycleSimulator;
pub use stops::{ProtectiveStop, StopSource};
