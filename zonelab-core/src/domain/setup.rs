//! TradeSetup: a limit entry with its protective stop and optional target.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Direction;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SetupError {
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },
    #[error("stop {stop} is not on the adverse side of entry {entry} for a {direction:?} setup")]
    StopOnWrongSide {
        direction: Direction,
        entry: f64,
        stop: f64,
    },
    #[error(
        "target {target} is not on the favorable side of entry {entry} for a {direction:?} setup"
    )]
    TargetOnWrongSide {
        direction: Direction,
        entry: f64,
        target: f64,
    },
}

/// An actionable trade plan. Immutable once built; deserialization goes
/// through the same checks as [`TradeSetup::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TradeSetupRepr")]
pub struct TradeSetup {
    direction: Direction,
    origin_time: DateTime<Utc>,
    entry_price: f64,
    stop_loss: f64,
    take_profit: Option<f64>,
    tag: Option<String>,
}

#[derive(Deserialize)]
struct TradeSetupRepr {
    direction: Direction,
    origin_time: DateTime<Utc>,
    entry_price: f64,
    stop_loss: f64,
    #[serde(default)]
    take_profit: Option<f64>,
    #[serde(default)]
    tag: Option<String>,
}

impl TryFrom<TradeSetupRepr> for TradeSetup {
    type Error = SetupError;

    fn try_from(repr: TradeSetupRepr) -> Result<Self, Self::Error> {
        let mut setup = TradeSetup::new(
            repr.direction,
            repr.origin_time,
            repr.entry_price,
            repr.stop_loss,
            repr.take_profit,
        )?;
        setup.tag = repr.tag;
        Ok(setup)
    }
}

impl TradeSetup {
    /// Build a setup, checking that the stop sits on the adverse side of the
    /// entry and the target (if any) on the favorable side.
    pub fn new(
        direction: Direction,
        origin_time: DateTime<Utc>,
        entry_price: f64,
        stop_loss: f64,
        take_profit: Option<f64>,
    ) -> Result<Self, SetupError> {
        finite("entry_price", entry_price)?;
        finite("stop_loss", stop_loss)?;
        if let Some(target) = take_profit {
            finite("take_profit", target)?;
        }

        if direction.penetration(entry_price, stop_loss) <= 0.0 {
            return Err(SetupError::StopOnWrongSide {
                direction,
                entry: entry_price,
                stop: stop_loss,
            });
        }
        if let Some(target) = take_profit {
            if direction.pnl(entry_price, target) <= 0.0 {
                return Err(SetupError::TargetOnWrongSide {
                    direction,
                    entry: entry_price,
                    target,
                });
            }
        }

        Ok(Self {
            direction,
            origin_time,
            entry_price,
            stop_loss,
            take_profit,
            tag: None,
        })
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn origin_time(&self) -> DateTime<Utc> {
        self.origin_time
    }

    pub fn entry_price(&self) -> f64 {
        self.entry_price
    }

    pub fn stop_loss(&self) -> f64 {
        self.stop_loss
    }

    pub fn take_profit(&self) -> Option<f64> {
        self.take_profit
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Absolute price distance from entry to stop.
    pub fn risk(&self) -> f64 {
        (self.entry_price - self.stop_loss).abs()
    }

    /// Absolute price distance from entry to target.
    pub fn reward(&self) -> Option<f64> {
        self.take_profit.map(|t| (t - self.entry_price).abs())
    }

    /// Reward divided by risk.
    pub fn risk_reward(&self) -> Option<f64> {
        self.reward().map(|reward| reward / self.risk())
    }
}

fn finite(field: &'static str, value: f64) -> Result<(), SetupError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SetupError::NonFinite { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 14, 30, 0).unwrap()
    }

    #[test]
    fn long_setup_derives_risk_and_reward() {
        let setup = TradeSetup::new(Direction::Long, t0(), 100.0, 95.0, Some(110.0)).unwrap();
        assert_eq!(setup.risk(), 5.0);
        assert_eq!(setup.reward(), Some(10.0));
        assert_eq!(setup.risk_reward(), Some(2.0));
    }

    #[test]
    fn short_setup_derives_risk_and_reward() {
        let setup = TradeSetup::new(Direction::Short, t0(), 100.0, 104.0, Some(88.0)).unwrap();
        assert_eq!(setup.risk(), 4.0);
        assert_eq!(setup.reward(), Some(12.0));
        assert_eq!(setup.risk_reward(), Some(3.0));
    }

    #[test]
    fn pure_trailing_setup_has_no_reward() {
        let setup = TradeSetup::new(Direction::Long, t0(), 100.0, 80.0, None).unwrap();
        assert_eq!(setup.reward(), None);
        assert_eq!(setup.risk_reward(), None);
    }

    #[test]
    fn stop_on_wrong_side_is_rejected() {
        let err = TradeSetup::new(Direction::Long, t0(), 100.0, 101.0, None).unwrap_err();
        assert!(matches!(err, SetupError::StopOnWrongSide { .. }));
        let err = TradeSetup::new(Direction::Short, t0(), 100.0, 100.0, None).unwrap_err();
        assert!(matches!(err, SetupError::StopOnWrongSide { .. }));
    }

    #[test]
    fn target_on_wrong_side_is_rejected() {
        let err = TradeSetup::new(Direction::Long, t0(), 100.0, 95.0, Some(99.0)).unwrap_err();
        assert!(matches!(err, SetupError::TargetOnWrongSide { .. }));
    }

    #[test]
    fn non_finite_prices_are_rejected() {
        let err = TradeSetup::new(Direction::Long, t0(), f64::NAN, 95.0, None).unwrap_err();
        assert!(matches!(
            err,
            SetupError::NonFinite {
                field: "entry_price",
                ..
            }
        ));
    }

    #[test]
    fn tag_is_carried() {
        let setup = TradeSetup::new(Direction::Long, t0(), 100.0, 95.0, None)
            .unwrap()
            .with_tag("wick_rejection");
        assert_eq!(setup.tag(), Some("wick_rejection"));
    }

    #[test]
    fn deserialization_validates_geometry() {
        let err = serde_json::from_str::<TradeSetup>(
            r#"{"direction":"long","origin_time":"2024-03-04T14:30:00Z",
                "entry_price":100.0,"stop_loss":110.0,"take_profit":90.0}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("adverse side"));

        let setup: TradeSetup = serde_json::from_str(
            r#"{"direction":"short","origin_time":"2024-03-04T14:30:00Z",
                "entry_price":100.0,"stop_loss":104.0,"tag":"level_recovery"}"#,
        )
        .unwrap();
        assert_eq!(setup.risk(), 4.0);
        assert_eq!(setup.take_profit(), None);
        assert_eq!(setup.tag(), Some("level_recovery"));
    }

    #[test]
    fn serialized_setup_reads_back() {
        let setup = TradeSetup::new(Direction::Long, t0(), 100.0, 95.0, Some(110.0))
            .unwrap()
            .with_tag("wick_rejection");
        let json = serde_json::to_string(&setup).unwrap();
        assert_eq!(serde_json::from_str::<TradeSetup>(&json).unwrap(), setup);
    }
}
