//! Protective stop with the ratchet invariant.
//!
//! **Core rule:** stops may tighten, never loosen. Long stops only rise,
//! short stops only fall.

use serde::{Deserialize, Serialize};

use super::{AdjustmentOrder, SimulatorConfig};
use crate::domain::{Direction, ExitReason};

/// Which rule produced the current stop level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopSource {
    Initial,
    Breakeven,
    Trailing,
}

impl StopSource {
    pub fn exit_reason(self) -> ExitReason {
        match self {
            StopSource::Initial => ExitReason::StopLoss,
            StopSource::Breakeven => ExitReason::BreakevenStop,
            StopSource::Trailing => ExitReason::TrailingStop,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProtectiveStop {
    direction: Direction,
    level: f64,
    source: StopSource,
}

impl ProtectiveStop {
    pub fn new(direction: Direction, level: f64) -> Self {
        Self {
            direction,
            level,
            source: StopSource::Initial,
        }
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn source(&self) -> StopSource {
        self.source
    }

    /// Move the stop to `proposed` if that is strictly tighter. Returns
    /// whether the stop moved.
    pub fn tighten(&mut self, proposed: f64, source: StopSource) -> bool {
        if self.direction.is_tighter(proposed, self.level) {
            self.level = proposed;
            self.source = source;
            true
        } else {
            false
        }
    }

    /// Apply the configured breakeven and trailing rules given the fill
    /// price and the best price seen since the fill.
    pub fn adjust(&mut self, config: &SimulatorConfig, fill_price: f64, best_price: f64) {
        let excursion = self.direction.pnl(fill_price, best_price);
        let rules = match config.adjustment_order {
            AdjustmentOrder::BreakevenFirst => [StopSource::Breakeven, StopSource::Trailing],
            AdjustmentOrder::TrailingFirst => [StopSource::Trailing, StopSource::Breakeven],
        };

        for rule in rules {
            match rule {
                StopSource::Breakeven => {
                    if config.breakeven_at.is_some_and(|at| excursion >= at) {
                        self.tighten(fill_price, StopSource::Breakeven);
                    }
                }
                StopSource::Trailing => {
                    if let Some(trail) = config.trailing.filter(|t| excursion >= t.trigger) {
                        let level = self.direction.offset_against(best_price, trail.offset);
                        self.tighten(level, StopSource::Trailing);
                    }
                }
                StopSource::Initial => {}
            }
        }
    }
}
