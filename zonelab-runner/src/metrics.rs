//! Trade statistics: pure reductions over simulated trades.
//!
//! Every metric is a pure function: trade list in, scalar out. No
//! dependencies on the monitor, the simulator, or the pipeline.
//!
//! P&L metrics use realized trades only (filled and closed); fill rate and
//! the outcome counts see every setup.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use zonelab_core::{Direction, Outcome, SimulatedTrade};

use crate::session::{Session, SessionClassifier};

/// How many setups ended in each outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub win: usize,
    pub loss: usize,
    pub timeout: usize,
    pub canceled_target_first: usize,
    pub no_fill: usize,
    pub open: usize,
    pub max_hold: usize,
    pub end_of_data: usize,
}

impl OutcomeCounts {
    pub fn record(&mut self, outcome: Outcome) {
        let slot = match outcome {
            Outcome::Win => &mut self.win,
            Outcome::Loss => &mut self.loss,
            Outcome::Timeout => &mut self.timeout,
            Outcome::CanceledTargetFirst => &mut self.canceled_target_first,
            Outcome::NoFill => &mut self.no_fill,
            Outcome::Open => &mut self.open,
            Outcome::MaxHold => &mut self.max_hold,
            Outcome::EndOfData => &mut self.end_of_data,
        };
        *slot += 1;
    }

    pub fn filled(&self) -> usize {
        self.win + self.loss + self.open + self.max_hold + self.end_of_data
    }

    pub fn total(&self) -> usize {
        self.filled() + self.timeout + self.canceled_target_first + self.no_fill
    }
}

/// Aggregate metrics for one group of trades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub trade_count: usize,
    pub outcomes: OutcomeCounts,
    pub fill_rate: f64,
    pub win_rate: f64,
    pub total_pnl: f64,
    pub average_pnl: f64,
    pub average_win: f64,
    pub average_loss: f64,
    pub expectancy: f64,
    /// `+inf` when nothing lost money; serialized as `"inf"`.
    #[serde(with = "infinite_as_string")]
    pub profit_factor: f64,
    pub average_risk_reward: f64,
    pub average_r_multiple: f64,
    pub average_mae: f64,
    pub average_mfe: f64,
    pub average_hold_ms: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
}

impl Summary {
    /// Compute all metrics from a trade list (in chronological order).
    pub fn compute<'a>(trades: impl IntoIterator<Item = &'a SimulatedTrade>) -> Self {
        let trades: Vec<&SimulatedTrade> = trades.into_iter().collect();

        let mut outcomes = OutcomeCounts::default();
        for t in &trades {
            outcomes.record(t.outcome);
        }

        let realized: Vec<&SimulatedTrade> = trades
            .iter()
            .copied()
            .filter(|t| t.outcome.is_realized())
            .collect();
        let filled: Vec<&SimulatedTrade> = trades.iter().copied().filter(|t| t.filled).collect();

        let wr = win_rate(&outcomes);
        let avg_win = average_pnl_for(&trades, Outcome::Win);
        let avg_loss = average_pnl_for(&trades, Outcome::Loss);

        Self {
            trade_count: trades.len(),
            outcomes,
            fill_rate: ratio(outcomes.filled(), outcomes.total()),
            win_rate: wr,
            total_pnl: realized.iter().map(|t| t.pnl).sum(),
            average_pnl: mean(realized.iter().map(|t| t.pnl)),
            average_win: avg_win,
            average_loss: avg_loss,
            expectancy: wr * avg_win + (1.0 - wr) * avg_loss,
            profit_factor: profit_factor(&realized),
            average_risk_reward: mean(trades.iter().filter_map(|t| t.planned_risk_reward)),
            average_r_multiple: mean(realized.iter().map(|t| t.r_multiple())),
            average_mae: mean(filled.iter().map(|t| t.mae)),
            average_mfe: mean(filled.iter().map(|t| t.mfe)),
            average_hold_ms: mean(
                filled
                    .iter()
                    .filter_map(|t| t.hold_time_ms)
                    .map(|ms| ms as f64),
            ),
            max_consecutive_wins: max_streak(&realized, |t| t.outcome == Outcome::Win),
            max_consecutive_losses: max_streak(&realized, |t| t.outcome == Outcome::Loss),
        }
    }
}

/// Overall metrics plus breakdowns by direction and by session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeStatistics {
    pub overall: Summary,
    pub by_direction: BTreeMap<Direction, Summary>,
    /// Keyed by the session of each trade's origin time. Empty when computed
    /// without a classifier.
    pub by_session: BTreeMap<Session, Summary>,
}

impl TradeStatistics {
    pub fn compute<C>(trades: &[SimulatedTrade], classifier: &C) -> Self
    where
        C: SessionClassifier + ?Sized,
    {
        let mut sessions: BTreeMap<Session, Vec<&SimulatedTrade>> = BTreeMap::new();
        for t in trades {
            sessions
                .entry(classifier.classify(t.origin_time))
                .or_default()
                .push(t);
        }

        Self {
            by_session: sessions
                .into_iter()
                .map(|(session, group)| (session, Summary::compute(group)))
                .collect(),
            ..Self::compute_unsegmented(trades)
        }
    }

    pub fn compute_unsegmented(trades: &[SimulatedTrade]) -> Self {
        let by_direction = [Direction::Long, Direction::Short]
            .into_iter()
            .filter_map(|d| {
                let group: Vec<&SimulatedTrade> =
                    trades.iter().filter(|t| t.direction == d).collect();
                (!group.is_empty()).then(|| (d, Summary::compute(group)))
            })
            .collect();

        Self {
            overall: Summary::compute(trades),
            by_direction,
            by_session: BTreeMap::new(),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Wins / (wins + losses). Outcomes that never resolved to a win or a loss
/// do not count.
pub fn win_rate(outcomes: &OutcomeCounts) -> f64 {
    ratio(outcomes.win, outcomes.win + outcomes.loss)
}

/// Gross profit / gross loss over realized P&L.
///
/// `+inf` when there is profit but no loss, 0.0 when there is neither.
pub fn profit_factor(trades: &[&SimulatedTrade]) -> f64 {
    let gross_profit: f64 = trades.iter().filter(|t| t.pnl > 0.0).map(|t| t.pnl).sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.pnl < 0.0)
        .map(|t| t.pnl.abs())
        .sum();

    if gross_loss == 0.0 {
        return if gross_profit > 0.0 { f64::INFINITY } else { 0.0 };
    }
    gross_profit / gross_loss
}

/// Longest run of consecutive trades satisfying `pred`.
pub fn max_streak(trades: &[&SimulatedTrade], pred: impl Fn(&SimulatedTrade) -> bool) -> usize {
    let mut best = 0;
    let mut current = 0;
    for &t in trades {
        if pred(t) {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}

fn average_pnl_for(trades: &[&SimulatedTrade], outcome: Outcome) -> f64 {
    mean(trades.iter().filter(|t| t.outcome == outcome).map(|t| t.pnl))
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        return 0.0;
    }
    sum / n as f64
}

/// Serde adapter writing `+inf` as the string `"inf"`, since JSON has no
/// infinity literal.
mod infinite_as_string {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if *value == f64::INFINITY {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_f64(*value)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(v),
            Repr::Text(s) if s == "inf" => Ok(f64::INFINITY),
            Repr::Text(s) => Err(D::Error::custom(format!(
                "expected a number or \"inf\", got {s:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use zonelab_core::TradeSetup;

    fn t(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, hour, 0, 0).unwrap()
    }

    fn trade(
        direction: Direction,
        at: DateTime<Utc>,
        outcome: Outcome,
        pnl: f64,
    ) -> SimulatedTrade {
        let (stop, target) = match direction {
            Direction::Long => (95.0, 110.0),
            Direction::Short => (105.0, 90.0),
        };
        let setup = TradeSetup::new(direction, at, 100.0, stop, Some(target)).unwrap();
        let mut trade = SimulatedTrade::unfilled(&setup, outcome, Some(at));
        if outcome.implies_fill() {
            trade.filled = true;
            trade.fill_time = Some(at);
            trade.fill_price = Some(100.0);
            trade.pnl = pnl;
            trade.mae = 2.0;
            trade.mfe = 6.0;
            trade.hold_time_ms = Some(Duration::minutes(10).num_milliseconds());
        }
        trade
    }

    fn sample() -> Vec<SimulatedTrade> {
        vec![
            trade(Direction::Long, t(15), Outcome::Win, 10.0),
            trade(Direction::Long, t(15), Outcome::Loss, -5.0),
            trade(Direction::Short, t(22), Outcome::Win, 10.0),
            trade(Direction::Short, t(3), Outcome::NoFill, 0.0),
        ]
    }

    #[test]
    fn overall_metrics() {
        let stats = TradeStatistics::compute_unsegmented(&sample());
        let s = &stats.overall;

        assert_eq!(s.trade_count, 4);
        assert_eq!(s.outcomes.filled(), 3);
        assert_eq!(s.fill_rate, 0.75);
        assert!((s.win_rate - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(s.total_pnl, 15.0);
        assert_eq!(s.average_pnl, 5.0);
        assert_eq!(s.average_win, 10.0);
        assert_eq!(s.average_loss, -5.0);
        assert!((s.expectancy - 5.0).abs() < 1e-12);
        assert_eq!(s.profit_factor, 4.0);
        assert_eq!(s.average_risk_reward, 2.0);
        assert_eq!(s.average_mae, 2.0);
        assert_eq!(s.average_mfe, 6.0);
        assert_eq!(s.max_consecutive_wins, 1);
        assert!(stats.by_session.is_empty());
    }

    #[test]
    fn breakdowns_by_direction_and_session() {
        let classifier = crate::session::UsFuturesSessions::default();
        let stats = TradeStatistics::compute(&sample(), &classifier);

        assert_eq!(stats.by_direction[&Direction::Long].trade_count, 2);
        assert_eq!(stats.by_direction[&Direction::Short].outcomes.no_fill, 1);

        // 15:00 UTC = 10:00 ET, 22:00 UTC = 17:00 ET, 03:00 UTC = 22:00 ET.
        assert_eq!(stats.by_session[&Session::Rth].trade_count, 2);
        assert_eq!(stats.by_session[&Session::AfterHours].total_pnl, 10.0);
        assert_eq!(stats.by_session[&Session::Overnight].fill_rate, 0.0);
    }

    #[test]
    fn no_losses_is_infinite_profit_factor() {
        let trades = vec![trade(Direction::Long, t(15), Outcome::Win, 10.0)];
        let stats = TradeStatistics::compute_unsegmented(&trades);
        assert_eq!(stats.overall.profit_factor, f64::INFINITY);

        let json = serde_json::to_value(&stats.overall).unwrap();
        assert_eq!(json["profit_factor"], "inf");
        let back: Summary = serde_json::from_value(json).unwrap();
        assert_eq!(back.profit_factor, f64::INFINITY);
    }

    #[test]
    fn empty_input_is_all_zero() {
        let stats = TradeStatistics::compute_unsegmented(&[]);
        assert_eq!(stats.overall.trade_count, 0);
        assert_eq!(stats.overall.win_rate, 0.0);
        assert_eq!(stats.overall.profit_factor, 0.0);
        assert!(stats.by_direction.is_empty());
    }

    #[test]
    fn streaks() {
        let trades = vec![
            trade(Direction::Long, t(15), Outcome::Loss, -5.0),
            trade(Direction::Long, t(15), Outcome::Loss, -5.0),
            trade(Direction::Long, t(15), Outcome::Win, 10.0),
            trade(Direction::Long, t(15), Outcome::Loss, -5.0),
        ];
        let refs: Vec<&SimulatedTrade> = trades.iter().collect();
        assert_eq!(max_streak(&refs, |t| t.outcome == Outcome::Loss), 2);
    }
}
