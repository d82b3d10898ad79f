//! SimulatedTrade: the replay result for one trade setup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Direction, TradeSetup};

/// Terminal outcome of a simulated trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Win,
    Loss,
    /// Limit order expired before filling.
    Timeout,
    /// Target traded before the limit filled; the order was pulled.
    CanceledTargetFirst,
    /// Bars ran out before the limit filled.
    NoFill,
    /// Filled and still open when bars ran out (not closed at end of data).
    Open,
    MaxHold,
    EndOfData,
}

impl Outcome {
    /// Whether this outcome can only happen after a fill.
    pub fn implies_fill(self) -> bool {
        matches!(
            self,
            Outcome::Win | Outcome::Loss | Outcome::Open | Outcome::MaxHold | Outcome::EndOfData
        )
    }

    /// Filled and closed with a realized P&L.
    pub fn is_realized(self) -> bool {
        matches!(
            self,
            Outcome::Win | Outcome::Loss | Outcome::MaxHold | Outcome::EndOfData
        )
    }
}

/// Which price level closed the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    BreakevenStop,
    TrailingStop,
    TakeProfit,
    MaxHold,
    EndOfData,
}

/// Replay result for one trade setup.
///
/// Excursions are positive price distances from the fill price. P&L is in
/// price units; currency conversion happens downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedTrade {
    // ── Plan ──
    pub direction: Direction,
    pub origin_time: DateTime<Utc>,
    pub entry_price: f64,
    pub planned_stop: f64,
    pub planned_target: Option<f64>,
    pub planned_risk_reward: Option<f64>,
    pub tag: Option<String>,

    // ── Fill ──
    pub filled: bool,
    pub fill_time: Option<DateTime<Utc>>,
    pub fill_price: Option<f64>,
    pub time_to_fill_ms: Option<i64>,

    // ── Exit ──
    pub outcome: Outcome,
    pub exit_reason: Option<ExitReason>,
    pub exit_time: Option<DateTime<Utc>>,
    pub exit_price: Option<f64>,
    /// Stop level in force when the replay ended.
    pub final_stop: Option<f64>,

    // ── Result ──
    pub pnl: f64,
    pub mae: f64,
    pub mfe: f64,
    pub hold_time_ms: Option<i64>,
    pub bars_held: usize,
}

impl SimulatedTrade {
    /// An unfilled record for `setup` with the given terminal outcome.
    pub fn unfilled(
        setup: &TradeSetup,
        outcome: Outcome,
        decided_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            direction: setup.direction(),
            origin_time: setup.origin_time(),
            entry_price: setup.entry_price(),
            planned_stop: setup.stop_loss(),
            planned_target: setup.take_profit(),
            planned_risk_reward: setup.risk_reward(),
            tag: setup.tag().map(str::to_owned),
            filled: false,
            fill_time: None,
            fill_price: None,
            time_to_fill_ms: None,
            outcome,
            exit_reason: None,
            exit_time: decided_at,
            exit_price: None,
            final_stop: None,
            pnl: 0.0,
            mae: 0.0,
            mfe: 0.0,
            hold_time_ms: None,
            bars_held: 0,
        }
    }

    pub fn is_winner(&self) -> bool {
        self.outcome == Outcome::Win
    }

    /// P&L as a multiple of planned risk (R-multiple).
    pub fn r_multiple(&self) -> f64 {
        let risk = (self.entry_price - self.planned_stop).abs();
        if risk == 0.0 {
            return 0.0;
        }
        self.pnl / risk
    }
}
