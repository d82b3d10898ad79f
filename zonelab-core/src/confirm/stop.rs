//! Stop placement for confirmed levels.

use serde::{Deserialize, Serialize};

use crate::domain::Direction;
use crate::validation::{non_negative, positive, ConfigError};

/// How a confirmation's protective stop is placed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StopMode {
    /// Beyond the extreme of the bar that most recently tested the level.
    Structural { stop_buffer: f64 },
    /// A fixed distance from the entry price.
    Fixed { stop_loss_points: f64 },
}

impl Default for StopMode {
    fn default() -> Self {
        StopMode::Structural { stop_buffer: 2.0 }
    }
}

impl StopMode {
    /// Stop price for an entry, given the adverse extreme of the test bar.
    pub fn place(&self, direction: Direction, entry: f64, test_extreme: f64) -> f64 {
        match *self {
            StopMode::Structural { stop_buffer } => {
                direction.offset_against(test_extreme, stop_buffer)
            }
            StopMode::Fixed { stop_loss_points } => {
                direction.offset_against(entry, stop_loss_points)
            }
        }
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, StopMode::Structural { .. })
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            StopMode::Structural { stop_buffer } => non_negative("stop_buffer", stop_buffer),
            StopMode::Fixed { stop_loss_points } => positive("stop_loss_points", stop_loss_points),
        }
    }
}
