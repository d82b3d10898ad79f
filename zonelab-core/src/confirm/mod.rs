//! Level confirmation: watched zones, patterns, stops, and the monitor that
//! drives them.

mod config;
mod event;
mod level;
mod monitor;
mod pattern;
mod stop;
mod strength;

pub use config::MonitorConfig;
pub use event::ConfirmationEvent;
pub use level::{ExpiryReason, LevelInteraction, LevelState, SubLevel, WatchedLevel};
pub use monitor::ZoneConfirmationMonitor;
pub use pattern::ConfirmationType;
pub use stop::StopMode;
