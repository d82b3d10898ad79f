//! Confirmation patterns, evaluated in a fixed priority order.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{Bar, Direction};

/// Which price-action pattern confirmed a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationType {
    /// Single bar trades through the level and closes back on the defended side.
    WickRejection,
    /// A close beyond the level followed, within the recovery window, by a
    /// close back on the defended side.
    LevelRecovery,
}

impl ConfirmationType {
    /// Evaluation order within one bar and one sub-level.
    pub const PRIORITY: [ConfirmationType; 2] =
        [ConfirmationType::WickRejection, ConfirmationType::LevelRecovery];

    pub fn as_str(self) -> &'static str {
        match self {
            ConfirmationType::WickRejection => "wick_rejection",
            ConfirmationType::LevelRecovery => "level_recovery",
        }
    }
}

impl fmt::Display for ConfirmationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Excursion of the bar's adverse extreme beyond `level`; negative when the
/// bar never reached it.
pub(crate) fn wick_size(direction: Direction, level: f64, bar: &Bar) -> f64 {
    direction.penetration(level, direction.adverse_extreme(bar))
}

pub(crate) fn closes_defended(direction: Direction, level: f64, bar: &Bar) -> bool {
    direction.penetration(level, bar.close) < 0.0
}

pub(crate) fn closes_beyond(direction: Direction, level: f64, bar: &Bar, breach: f64) -> bool {
    direction.penetration(level, bar.close) > breach
}

pub(crate) fn is_wick_rejection(
    direction: Direction,
    level: f64,
    bar: &Bar,
    min_wick: f64,
) -> bool {
    let wick = wick_size(direction, level, bar);
    wick >= 0.0
        && wick >= min_wick
        && closes_defended(direction, level, bar)
        && direction.bar_agrees(bar)
}

pub(crate) fn is_recovery(direction: Direction, level: f64, bar: &Bar) -> bool {
    closes_defended(direction, level, bar) && direction.bar_agrees(bar)
}
