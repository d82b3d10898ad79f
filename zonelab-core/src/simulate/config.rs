//! Simulator configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::PathPolicy;
use crate::validation::{non_negative, positive, span_ms, ConfigError};

/// Trailing stop: once best favorable excursion reaches `trigger`, the stop
/// follows the best price at `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailingRule {
    pub trigger: f64,
    pub offset: f64,
}

/// Which stop rule is applied first when breakeven and trailing both fire
/// on the same bar. The later rule only replaces the stop when strictly
/// tighter, so this decides attribution of equal levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentOrder {
    #[default]
    BreakevenFirst,
    TrailingFirst,
}

/// Tunables for [`TradeLifecycleSimulator`](super::TradeLifecycleSimulator).
///
/// Distances are in price units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Unfilled orders expire after this long. `None` waits indefinitely.
    pub order_timeout_ms: Option<i64>,
    /// Pull the order if the target trades before the limit fills.
    pub cancel_if_target_hit_first: bool,
    /// Adverse adjustment applied to the limit price on fill.
    pub slippage: f64,
    pub trailing: Option<TrailingRule>,
    /// Move the stop to the fill price once this much profit has been seen.
    pub breakeven_at: Option<f64>,
    pub max_hold_bars: Option<usize>,
    pub path_policy: PathPolicy,
    pub adjustment_order: AdjustmentOrder,
    /// Evaluate exits on the bar that filled the order.
    pub exit_on_fill_bar: bool,
    /// Close at the last close when bars run out; otherwise report `open`.
    pub close_at_end_of_data: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            order_timeout_ms: Some(30 * 60 * 1000),
            cancel_if_target_hit_first: true,
            slippage: 0.0,
            trailing: None,
            breakeven_at: None,
            max_hold_bars: None,
            path_policy: PathPolicy::default(),
            adjustment_order: AdjustmentOrder::default(),
            exit_on_fill_bar: true,
            close_at_end_of_data: true,
        }
    }
}

impl SimulatorConfig {
    /// Exits purely on first touch of the setup's stop or target.
    pub fn fixed_target() -> Self {
        Self {
            trailing: None,
            breakeven_at: None,
            ..Self::default()
        }
    }

    pub fn with_trailing(mut self, trigger: f64, offset: f64) -> Self {
        self.trailing = Some(TrailingRule { trigger, offset });
        self
    }

    pub fn with_breakeven(mut self, at: f64) -> Self {
        self.breakeven_at = Some(at);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ms) = self.order_timeout_ms {
            span_ms("order_timeout_ms", ms)?;
        }
        non_negative("slippage", self.slippage)?;
        if let Some(rule) = self.trailing {
            positive("trailing.trigger", rule.trigger)?;
            positive("trailing.offset", rule.offset)?;
            if rule.offset >= rule.trigger {
                return Err(ConfigError::Inconsistent(format!(
                    "trailing offset ({}) must be smaller than trailing trigger ({})",
                    rule.offset, rule.trigger
                )));
            }
        }
        if let Some(at) = self.breakeven_at {
            positive("breakeven_at", at)?;
        }
        if self.max_hold_bars == Some(0) {
            return Err(ConfigError::NotPositive {
                field: "max_hold_bars",
                value: 0.0,
            });
        }
        Ok(())
    }

    pub fn order_timeout(&self) -> Option<Duration> {
        self.order_timeout_ms.map(Duration::milliseconds)
    }
}
