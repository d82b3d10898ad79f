//! Setup sizing: turning confirmations and signal bars into trade setups.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::confirm::ConfirmationEvent;
use crate::domain::{Bar, Direction, SetupError, TradeSetup};
use crate::validation::{non_negative, positive, ConfigError};

/// Where the limit entry sits relative to the confirmed level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryMode {
    /// At the confirming bar's close.
    #[default]
    ConfirmationClose,
    /// At the tested level itself.
    Level,
    /// At the level, shifted by `entry_offset` toward the defended side.
    LevelOffset,
}

/// Converts a [`ConfirmationEvent`] into a [`TradeSetup`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryPlan {
    pub entry_mode: EntryMode,
    pub entry_offset: f64,
    /// Target distance from entry. `None` leaves the setup target-less
    /// (pure trailing).
    pub target_points: Option<f64>,
}

impl Default for EntryPlan {
    fn default() -> Self {
        Self {
            entry_mode: EntryMode::default(),
            entry_offset: 0.0,
            target_points: Some(25.0),
        }
    }
}

impl EntryPlan {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("entry_offset", self.entry_offset)?;
        if let Some(points) = self.target_points {
            positive("target_points", points)?;
        }
        Ok(())
    }

    pub fn entry_price(&self, event: &ConfirmationEvent) -> f64 {
        match self.entry_mode {
            EntryMode::ConfirmationClose => event.entry_price,
            EntryMode::Level => event.tested_level,
            EntryMode::LevelOffset => event
                .direction()
                .offset_with(event.tested_level, self.entry_offset),
        }
    }

    pub fn build(&self, event: &ConfirmationEvent) -> Result<TradeSetup, SetupError> {
        let direction = event.direction();
        let entry = self.entry_price(event);
        let target = self
            .target_points
            .map(|points| direction.offset_with(entry, points));

        TradeSetup::new(direction, event.confirmation_time, entry, event.stop_loss, target)
            .map(|setup| setup.with_tag(event.confirmation_type.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SizingRejection {
    #[error("risk {risk:.2} exceeds max risk {max_risk:.2}")]
    RiskTooHigh { risk: f64, max_risk: f64 },
    #[error("risk {0:.2} is not positive")]
    NonPositiveRisk(f64),
    #[error(transparent)]
    Setup(#[from] SetupError),
}

/// Fixed-target sizing from a single signal bar: stop beyond the bar's
/// extreme, target a fixed distance from its close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedTargetSizing {
    pub target_points: f64,
    pub stop_buffer: f64,
    pub max_risk: f64,
}

impl Default for FixedTargetSizing {
    fn default() -> Self {
        Self {
            target_points: 25.0,
            stop_buffer: 10.0,
            max_risk: 30.0,
        }
    }
}

impl FixedTargetSizing {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("target_points", self.target_points)?;
        non_negative("stop_buffer", self.stop_buffer)?;
        positive("max_risk", self.max_risk)
    }

    pub fn size(&self, direction: Direction, bar: &Bar) -> Result<TradeSetup, SizingRejection> {
        let entry = bar.close;
        let stop = direction.offset_against(direction.adverse_extreme(bar), self.stop_buffer);
        let risk = direction.penetration(entry, stop);

        if risk <= 0.0 {
            return Err(SizingRejection::NonPositiveRisk(risk));
        }
        if risk > self.max_risk {
            return Err(SizingRejection::RiskTooHigh {
                risk,
                max_risk: self.max_risk,
            });
        }

        let target = direction.offset_with(entry, self.target_points);
        Ok(TradeSetup::new(direction, bar.timestamp, entry, stop, Some(target))?)
    }
}
