//! Domain types shared by the monitor, the simulator and the runner.

pub mod bar;
pub mod ids;
pub mod setup;
pub mod side;
pub mod signal;
pub mod trade;

pub use bar::Bar;
pub use ids::LevelHandle;
pub use setup::{SetupError, TradeSetup};
pub use side::{Direction, Side};
pub use signal::{CandidateLevel, Signal, Zone, ZoneError};
pub use trade::{ExitReason, Outcome, SimulatedTrade};
