//! MAE/MFE tracking for an open position.

use crate::domain::{Bar, Direction};

/// Running adverse/favorable excursion from the fill price, in price units
/// (both non-negative).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Excursion {
    direction: Direction,
    fill_price: f64,
    mae: f64,
    mfe: f64,
}

impl Excursion {
    pub fn new(direction: Direction, fill_price: f64) -> Self {
        Self {
            direction,
            fill_price,
            mae: 0.0,
            mfe: 0.0,
        }
    }

    /// Absorb one bar. Price can't travel past a level that would have
    /// closed the position, so the bar's extremes are clamped to the active
    /// stop and target.
    pub fn absorb(&mut self, bar: &Bar, stop: f64, target: Option<f64>) {
        let d = self.direction;

        let mut adverse = d.adverse_extreme(bar);
        if d.is_tighter(stop, adverse) {
            adverse = stop;
        }
        let mut favorable = d.favorable_extreme(bar);
        if let Some(t) = target {
            if d.pnl(t, favorable) > 0.0 {
                favorable = t;
            }
        }

        self.mae = self.mae.max(d.pnl(adverse, self.fill_price));
        self.mfe = self.mfe.max(d.pnl(self.fill_price, favorable));
    }

    pub fn mae(&self) -> f64 {
        self.mae
    }

    pub fn mfe(&self) -> f64 {
        self.mfe
    }
}
