//! Signal side and trade direction, plus the price geometry both share.
//!
//! Every "beyond the level" / "toward the stop" computation in the crate goes
//! through [`Direction`] so long and short paths stay mirror images.

use serde::{Deserialize, Serialize};

use super::Bar;

/// Which side a signal wants to trade. A buy signal defends support, a sell
/// signal defends resistance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn direction(self) -> Direction {
        match self {
            Side::Buy => Direction::Long,
            Side::Sell => Direction::Short,
        }
    }
}

/// Direction of a trade setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Long,
    Short,
}

impl From<Side> for Direction {
    fn from(side: Side) -> Self {
        side.direction()
    }
}

impl Direction {
    /// +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }

    pub fn side(self) -> Side {
        match self {
            Direction::Long => Side::Buy,
            Direction::Short => Side::Sell,
        }
    }

    /// Price-unit P&L of a round trip.
    pub fn pnl(self, entry: f64, exit: f64) -> f64 {
        (exit - entry) * self.sign()
    }

    /// The bar extreme that moves in the trade's favor (high for long).
    pub fn favorable_extreme(self, bar: &Bar) -> f64 {
        match self {
            Direction::Long => bar.high,
            Direction::Short => bar.low,
        }
    }

    /// The bar extreme that moves against the trade (low for long).
    pub fn adverse_extreme(self, bar: &Bar) -> f64 {
        match self {
            Direction::Long => bar.low,
            Direction::Short => bar.high,
        }
    }

    /// How far `price` sits beyond `level` on the adverse side.
    ///
    /// Positive when the price is through the level (below support for long,
    /// above resistance for short), zero on the level, negative on the
    /// defended side.
    pub fn penetration(self, level: f64, price: f64) -> f64 {
        (level - price) * self.sign()
    }

    /// Move `price` by `distance` against the trade (stop placement).
    pub fn offset_against(self, price: f64, distance: f64) -> f64 {
        price - distance * self.sign()
    }

    /// Move `price` by `distance` with the trade (targets, entry slippage).
    pub fn offset_with(self, price: f64, distance: f64) -> f64 {
        price + distance * self.sign()
    }

    /// True when `candidate` is a tighter stop than `current`.
    pub fn is_tighter(self, candidate: f64, current: f64) -> bool {
        match self {
            Direction::Long => candidate > current,
            Direction::Short => candidate < current,
        }
    }

    /// True when the bar's body is colored in this direction.
    pub fn bar_agrees(self, bar: &Bar) -> bool {
        match self {
            Direction::Long => bar.is_bullish(),
            Direction::Short => bar.is_bearish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn bar(open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar::new(
            Utc.with_ymd_and_hms(2024, 3, 4, 14, 30, 0).unwrap(),
            open,
            high,
            low,
            close,
            100.0,
        )
    }

    #[test]
    fn side_maps_to_direction() {
        assert_eq!(Direction::from(Side::Buy), Direction::Long);
        assert_eq!(Direction::from(Side::Sell), Direction::Short);
        assert_eq!(Direction::Short.side(), Side::Sell);
    }

    #[test]
    fn pnl_is_signed_by_direction() {
        assert_eq!(Direction::Long.pnl(100.0, 95.0), -5.0);
        assert_eq!(Direction::Short.pnl(100.0, 95.0), 5.0);
    }

    #[test]
    fn penetration_mirrors() {
        // Support at 4500: a low of 4495 is 5 through it.
        assert_eq!(Direction::Long.penetration(4500.0, 4495.0), 5.0);
        // Resistance at 4500: a high of 4505 is 5 through it.
        assert_eq!(Direction::Short.penetration(4500.0, 4505.0), 5.0);
        assert!(Direction::Long.penetration(4500.0, 4502.0) < 0.0);
    }

    #[test]
    fn offsets_mirror() {
        assert_eq!(Direction::Long.offset_against(100.0, 5.0), 95.0);
        assert_eq!(Direction::Short.offset_against(100.0, 5.0), 105.0);
        assert_eq!(Direction::Long.offset_with(100.0, 10.0), 110.0);
        assert_eq!(Direction::Short.offset_with(100.0, 10.0), 90.0);
    }

    #[test]
    fn tighter_stop_by_direction() {
        assert!(Direction::Long.is_tighter(101.0, 100.0));
        assert!(!Direction::Long.is_tighter(99.0, 100.0));
        assert!(Direction::Short.is_tighter(99.0, 100.0));
    }

    #[test]
    fn extremes_and_color() {
        let b = bar(100.0, 104.0, 98.0, 103.0);
        assert_eq!(Direction::Long.favorable_extreme(&b), 104.0);
        assert_eq!(Direction::Long.adverse_extreme(&b), 98.0);
        assert_eq!(Direction::Short.favorable_extreme(&b), 98.0);
        assert!(Direction::Long.bar_agrees(&b));
        assert!(!Direction::Short.bar_agrees(&b));
    }

    #[test]
    fn serde_uses_snake_case() {
        assert_eq!(serde_json::to_string(&Side::Buy).unwrap(), "\"buy\"");
        assert_eq!(serde_json::to_string(&Direction::Short).unwrap(), "\"short\"");
    }
}
