//! Path policy: resolve ambiguous bars where both the stop and the target
//! trade inside the same OHLC range.
//!
//! OHLC data cannot say which level printed first. The policy makes that
//! assumption explicit. When finer bars are available the ambiguity is
//! resolved by walking them in order instead.

use serde::{Deserialize, Serialize};

use crate::domain::{Bar, Direction};

/// Intrabar ambiguity resolution policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathPolicy {
    /// Stop before target (conservative).
    #[default]
    WorstCase,
    /// Target before stop (optimistic).
    BestCase,
    /// Infer the path from the bar's shape.
    ///
    /// If |open - high| <= |open - low| the price went to the high first
    /// (Open → High → Low → Close), otherwise Open → Low → High → Close.
    OhlcPath,
}

/// Which exit level a bar reached first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitTouch {
    Stop,
    Target,
}

pub(crate) fn stop_touched(direction: Direction, bar: &Bar, stop: f64) -> bool {
    direction.penetration(stop, direction.adverse_extreme(bar)) >= 0.0
}

pub(crate) fn target_touched(direction: Direction, bar: &Bar, target: Option<f64>) -> bool {
    target.is_some_and(|t| direction.pnl(t, direction.favorable_extreme(bar)) >= 0.0)
}

/// First exit reached on `bar`, if any.
pub fn first_exit(
    policy: PathPolicy,
    direction: Direction,
    bar: &Bar,
    stop: f64,
    target: Option<f64>,
) -> Option<ExitTouch> {
    match (stop_touched(direction, bar, stop), target_touched(direction, bar, target)) {
        (false, false) => None,
        (true, false) => Some(ExitTouch::Stop),
        (false, true) => Some(ExitTouch::Target),
        (true, true) => Some(resolve_ambiguous(policy, direction, bar)),
    }
}

/// Like [`first_exit`], but an ambiguous bar is replayed through `sub_bars`
/// (finer bars covering the same interval, in order). Only a sub-bar that
/// itself straddles both levels falls back to the policy.
pub fn first_exit_refined(
    policy: PathPolicy,
    direction: Direction,
    bar: &Bar,
    sub_bars: &[Bar],
    stop: f64,
    target: Option<f64>,
) -> Option<ExitTouch> {
    let coarse = first_exit(policy, direction, bar, stop, target)?;
    let ambiguous = stop_touched(direction, bar, stop) && target_touched(direction, bar, target);
    if !ambiguous {
        return Some(coarse);
    }

    sub_bars
        .iter()
        .find_map(|sub| first_exit(policy, direction, sub, stop, target))
        .or(Some(coarse))
}

fn resolve_ambiguous(policy: PathPolicy, direction: Direction, bar: &Bar) -> ExitTouch {
    match policy {
        PathPolicy::WorstCase => ExitTouch::Stop,
        PathPolicy::BestCase => ExitTouch::Target,
        PathPolicy::OhlcPath => {
            let high_first = (bar.open - bar.high).abs() <= (bar.open - bar.low).abs();
            let favorable_first = match direction {
                Direction::Long => high_first,
                Direction::Short => !high_first,
            };
            if favorable_first {
                ExitTouch::Target
            } else {
                ExitTouch::Stop
            }
        }
    }
}
