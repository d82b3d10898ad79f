//! ConfirmationEvent: what the monitor hands downstream when a level holds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ConfirmationType;
use crate::domain::{Direction, LevelHandle, SetupError, Side, TradeSetup};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationEvent {
    pub handle: LevelHandle,
    pub side: Side,
    pub confirmation_type: ConfirmationType,
    /// Close of the confirming bar.
    pub entry_price: f64,
    pub stop_loss: f64,
    pub risk: f64,
    pub tested_level: f64,
    pub level_label: Option<String>,
    /// Adverse extreme the stop was placed from.
    pub test_extreme: f64,
    /// 0–100.
    pub strength: f64,
    pub source: Option<String>,
    pub signal_time: DateTime<Utc>,
    pub test_time: Option<DateTime<Utc>>,
    pub lost_time: Option<DateTime<Utc>>,
    pub confirmation_time: DateTime<Utc>,
}

impl ConfirmationEvent {
    pub fn direction(&self) -> Direction {
        self.side.direction()
    }

    /// Setup entering at the confirming close with the event's stop.
    pub fn to_setup(&self, take_profit: Option<f64>) -> Result<TradeSetup, SetupError> {
        TradeSetup::new(
            self.direction(),
            self.confirmation_time,
            self.entry_price,
            self.stop_loss,
            take_profit,
        )
        .map(|setup| setup.with_tag(self.confirmation_type.as_str()))
    }
}
