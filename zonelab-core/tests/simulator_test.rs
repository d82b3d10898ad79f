//! Integration tests for the trade lifecycle simulator.
//!
//! Tests:
//! 1. Fill → stop and fill → target on the reference long setup.
//! 2. Breakeven and trailing stop management.
//! 3. Unfilled outcomes: timeout, canceled-target-first, no fill.
//! 4. Max hold, end of data, open positions.
//! 5. Same-bar ambiguity under each path policy and with finer bars.

use chrono::{DateTime, Duration, TimeZone, Utc};
use zonelab_core::simulate::AdjustmentOrder;
use zonelab_core::{
    Bar, Direction, ExitReason, Outcome, PathPolicy, SimulatedTrade, SimulatorConfig,
    TradeLifecycleSimulator, TradeSetup,
};

// ──────────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────────

fn t(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 14, 30, 0).unwrap() + Duration::minutes(minute)
}

fn ohlc(minute: i64, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar::new(t(minute), open, high, low, close, 500.0)
}

/// Bar spanning `low..high`, opening and closing mid-range.
fn span(minute: i64, low: f64, high: f64) -> Bar {
    let mid = (low + high) / 2.0;
    ohlc(minute, mid, high, low, mid)
}

fn long_setup() -> TradeSetup {
    TradeSetup::new(Direction::Long, t(0), 100.0, 95.0, Some(110.0)).unwrap()
}

fn run(config: SimulatorConfig, setup: &TradeSetup, bars: &[Bar]) -> SimulatedTrade {
    TradeLifecycleSimulator::new(config)
        .unwrap()
        .simulate(setup, bars)
}

fn assert_fill_consistent(trade: &SimulatedTrade) {
    assert_eq!(trade.filled, trade.outcome.implies_fill(), "{:?}", trade.outcome);
    assert_eq!(trade.filled, trade.fill_time.is_some());
    if !trade.filled {
        assert_eq!(trade.pnl, 0.0);
        assert_eq!(trade.bars_held, 0);
    }
}

// ──────────────────────────────────────────────
// Fill → exit
// ──────────────────────────────────────────────

#[test]
fn fill_then_stop() {
    let bars = vec![span(1, 102.0, 103.0), span(2, 99.0, 100.5), span(3, 94.0, 101.0)];
    let trade = run(SimulatorConfig::default(), &long_setup(), &bars);

    assert_eq!(trade.outcome, Outcome::Loss);
    assert_eq!(trade.exit_reason, Some(ExitReason::StopLoss));
    assert_eq!(trade.fill_time, Some(t(2)));
    assert_eq!(trade.fill_price, Some(100.0));
    assert_eq!(trade.time_to_fill_ms, Some(120_000));
    assert_eq!(trade.exit_price, Some(95.0));
    assert_eq!(trade.pnl, -5.0);
    // The stop caps the adverse excursion.
    assert_eq!(trade.mae, 5.0);
    assert_eq!(trade.mfe, 1.0);
    assert_eq!(trade.bars_held, 2);
    assert_eq!(trade.hold_time_ms, Some(60_000));
    assert_eq!(trade.r_multiple(), -1.0);
}

#[test]
fn fill_then_target() {
    let bars = vec![span(1, 102.0, 103.0), span(2, 99.0, 100.5), span(3, 100.2, 111.0)];
    let trade = run(SimulatorConfig::default(), &long_setup(), &bars);

    assert_eq!(trade.outcome, Outcome::Win);
    assert_eq!(trade.exit_reason, Some(ExitReason::TakeProfit));
    assert_eq!(trade.exit_price, Some(110.0));
    assert_eq!(trade.pnl, 10.0);
    assert_eq!(trade.mfe, 10.0);
    assert_eq!(trade.mae, 1.0);
    assert_eq!(trade.final_stop, Some(95.0));
}

#[test]
fn short_mirrors_long() {
    let setup = TradeSetup::new(Direction::Short, t(0), 100.0, 105.0, Some(90.0)).unwrap();

    let stopped = vec![span(1, 97.0, 98.0), span(2, 99.5, 101.0), span(3, 99.0, 106.0)];
    let trade = run(SimulatorConfig::default(), &setup, &stopped);
    assert_eq!(trade.outcome, Outcome::Loss);
    assert_eq!(trade.fill_time, Some(t(2)));
    assert_eq!(trade.pnl, -5.0);
    assert_eq!(trade.mae, 5.0);

    let won = vec![span(1, 97.0, 98.0), span(2, 99.5, 101.0), span(3, 89.0, 99.8)];
    let trade = run(SimulatorConfig::default(), &setup, &won);
    assert_eq!(trade.outcome, Outcome::Win);
    assert_eq!(trade.pnl, 10.0);
}

// ──────────────────────────────────────────────
// Stop management
// ──────────────────────────────────────────────

fn managed_setup() -> TradeSetup {
    TradeSetup::new(Direction::Long, t(0), 100.0, 80.0, None).unwrap()
}

fn managed_config() -> SimulatorConfig {
    SimulatorConfig::default()
        .with_breakeven(5.0)
        .with_trailing(10.0, 5.0)
}

#[test]
fn breakeven_then_trailing() {
    let bars = vec![
        span(1, 99.0, 100.5),
        span(2, 101.0, 105.0),
        span(3, 103.0, 115.0),
        span(4, 108.0, 112.0),
    ];

    // Up to 105: stop at breakeven.
    let trade = run(managed_config(), &managed_setup(), &bars[..2]);
    assert_eq!(trade.outcome, Outcome::EndOfData);
    assert_eq!(trade.final_stop, Some(100.0));

    // Up to 115: trailing at 110, then hit.
    let trade = run(managed_config(), &managed_setup(), &bars);
    assert_eq!(trade.outcome, Outcome::Win);
    assert_eq!(trade.exit_reason, Some(ExitReason::TrailingStop));
    assert_eq!(trade.exit_price, Some(110.0));
    assert_eq!(trade.pnl, 10.0);
    assert_eq!(trade.mfe, 15.0);
}

#[test]
fn trailing_only_waits_for_trigger() {
    let config = SimulatorConfig::default().with_trailing(10.0, 5.0);
    let bars = vec![span(1, 99.0, 100.5), span(2, 101.0, 105.0)];
    let trade = run(config.clone(), &managed_setup(), &bars);
    assert_eq!(trade.final_stop, Some(80.0));

    let bars = vec![span(1, 99.0, 100.5), span(2, 101.0, 105.0), span(3, 111.0, 115.0)];
    let trade = run(config, &managed_setup(), &bars);
    assert_eq!(trade.final_stop, Some(110.0));
}

#[test]
fn breakeven_stop_is_a_scratch_loss() {
    let bars = vec![span(1, 99.0, 100.5), span(2, 101.0, 106.0), span(3, 99.0, 104.0)];
    let trade = run(managed_config(), &managed_setup(), &bars);

    assert_eq!(trade.outcome, Outcome::Loss);
    assert_eq!(trade.exit_reason, Some(ExitReason::BreakevenStop));
    assert_eq!(trade.pnl, 0.0);
}

#[test]
fn trailing_stop_never_loosens() {
    let bars = vec![
        span(1, 99.0, 100.5),
        span(2, 103.0, 115.0),
        // Pullback that stays above the trail: stop must hold at 110.
        span(3, 110.5, 113.0),
        span(4, 111.0, 112.0),
    ];
    let trade = run(managed_config(), &managed_setup(), &bars);
    assert_eq!(trade.outcome, Outcome::EndOfData);
    assert_eq!(trade.final_stop, Some(110.0));
}

#[test]
fn adjustment_order_does_not_move_the_stop() {
    let bars = vec![span(1, 99.0, 100.5), span(2, 101.0, 115.0), span(3, 111.0, 113.0)];
    let trailing_first = SimulatorConfig {
        adjustment_order: AdjustmentOrder::TrailingFirst,
        ..managed_config()
    };
    let a = run(managed_config(), &managed_setup(), &bars);
    let b = run(trailing_first, &managed_setup(), &bars);
    assert_eq!(a.final_stop, b.final_stop);
    assert_eq!(a.final_stop, Some(110.0));
}

#[test]
fn fill_bar_extremes_do_not_move_the_stop() {
    // The fill bar spikes to 120 but may have done so before the fill.
    let bars = vec![ohlc(1, 115.0, 120.0, 99.0, 101.0), span(2, 100.5, 102.0)];
    let trade = run(managed_config(), &managed_setup(), &bars);
    assert_eq!(trade.final_stop, Some(80.0));
    assert_eq!(trade.mfe, 20.0);
}

// ──────────────────────────────────────────────
// Unfilled outcomes
// ──────────────────────────────────────────────

#[test]
fn order_times_out() {
    let bars = vec![span(1, 102.0, 103.0), span(31, 99.0, 100.5)];
    let trade = run(SimulatorConfig::default(), &long_setup(), &bars);
    assert_eq!(trade.outcome, Outcome::Timeout);
    assert_eq!(trade.exit_time, Some(t(31)));
    assert_fill_consistent(&trade);

    // Exactly at the timeout the order is still working.
    let bars = vec![span(1, 102.0, 103.0), span(30, 99.0, 100.5)];
    let trade = run(SimulatorConfig::default(), &long_setup(), &bars);
    assert!(trade.filled);
}

#[test]
fn no_timeout_waits_indefinitely() {
    let config = SimulatorConfig {
        order_timeout_ms: None,
        ..Default::default()
    };
    let bars = vec![span(1, 102.0, 103.0), span(600, 99.0, 100.5)];
    let trade = run(config, &long_setup(), &bars);
    assert!(trade.filled);
    assert_eq!(trade.fill_time, Some(t(600)));
}

#[test]
fn target_before_fill_cancels() {
    let bars = vec![span(1, 104.0, 111.0), span(2, 99.0, 100.5)];
    let trade = run(SimulatorConfig::default(), &long_setup(), &bars);
    assert_eq!(trade.outcome, Outcome::CanceledTargetFirst);
    assert_eq!(trade.exit_time, Some(t(1)));
    assert_fill_consistent(&trade);

    let config = SimulatorConfig {
        cancel_if_target_hit_first: false,
        ..Default::default()
    };
    let trade = run(config, &long_setup(), &bars);
    assert_eq!(trade.fill_time, Some(t(2)));
}

#[test]
fn target_and_fill_on_same_bar_cancels() {
    let bars = vec![span(1, 99.0, 111.0)];
    let trade = run(SimulatorConfig::default(), &long_setup(), &bars);
    assert_eq!(trade.outcome, Outcome::CanceledTargetFirst);
}

#[test]
fn never_reaching_limit_is_no_fill() {
    let bars: Vec<Bar> = (1..20).map(|m| span(m, 101.0, 104.0)).collect();
    let trade = run(SimulatorConfig::default(), &long_setup(), &bars);
    assert_eq!(trade.outcome, Outcome::NoFill);
    assert_eq!(trade.exit_time, None);
    assert_fill_consistent(&trade);
}

// ──────────────────────────────────────────────
// Max hold, end of data, open
// ──────────────────────────────────────────────

#[test]
fn max_hold_closes_at_bar_close() {
    let config = SimulatorConfig {
        max_hold_bars: Some(2),
        ..Default::default()
    };
    let bars = vec![
        span(1, 99.0, 100.5),
        ohlc(2, 101.0, 104.0, 100.5, 103.0),
        span(3, 100.5, 109.0),
    ];
    let trade = run(config, &long_setup(), &bars);
    assert_eq!(trade.outcome, Outcome::MaxHold);
    assert_eq!(trade.exit_reason, Some(ExitReason::MaxHold));
    assert_eq!(trade.exit_time, Some(t(2)));
    assert_eq!(trade.exit_price, Some(103.0));
    assert_eq!(trade.pnl, 3.0);
    assert_eq!(trade.bars_held, 2);
}

#[test]
fn end_of_data_closes_at_last_close() {
    let bars = vec![span(1, 99.0, 100.5), ohlc(2, 101.0, 104.0, 100.5, 102.5)];
    let trade = run(SimulatorConfig::default(), &long_setup(), &bars);
    assert_eq!(trade.outcome, Outcome::EndOfData);
    assert_eq!(trade.exit_reason, Some(ExitReason::EndOfData));
    assert_eq!(trade.exit_price, Some(102.5));
    assert_eq!(trade.pnl, 2.5);
}

#[test]
fn open_position_is_marked_to_last_close() {
    let config = SimulatorConfig {
        close_at_end_of_data: false,
        ..Default::default()
    };
    let bars = vec![span(1, 99.0, 100.5), ohlc(3, 101.0, 104.0, 100.5, 102.5)];
    let trade = run(config, &long_setup(), &bars);
    assert_eq!(trade.outcome, Outcome::Open);
    assert_eq!(trade.exit_reason, None);
    assert_eq!(trade.exit_time, None);
    assert_eq!(trade.exit_price, None);
    assert_eq!(trade.pnl, 2.5);
    assert_eq!(trade.hold_time_ms, Some(120_000));
    assert_fill_consistent(&trade);
}

// ──────────────────────────────────────────────
// Same-bar ambiguity
// ──────────────────────────────────────────────

fn ambiguous(open: f64) -> Vec<Bar> {
    vec![span(1, 99.0, 100.5), ohlc(2, open, 111.0, 94.0, 102.0)]
}

fn with_policy(path_policy: PathPolicy) -> SimulatorConfig {
    SimulatorConfig {
        path_policy,
        ..Default::default()
    }
}

#[test]
fn worst_case_takes_the_stop() {
    let trade = run(with_policy(PathPolicy::WorstCase), &long_setup(), &ambiguous(102.0));
    assert_eq!(trade.outcome, Outcome::Loss);
    assert_eq!(trade.pnl, -5.0);
}

#[test]
fn best_case_takes_the_target() {
    let trade = run(with_policy(PathPolicy::BestCase), &long_setup(), &ambiguous(102.0));
    assert_eq!(trade.outcome, Outcome::Win);
    assert_eq!(trade.pnl, 10.0);
}

#[test]
fn ohlc_path_follows_the_open() {
    // Opens near the high: high first.
    let trade = run(with_policy(PathPolicy::OhlcPath), &long_setup(), &ambiguous(110.0));
    assert_eq!(trade.outcome, Outcome::Win);

    // Opens near the low: low first.
    let trade = run(with_policy(PathPolicy::OhlcPath), &long_setup(), &ambiguous(95.0));
    assert_eq!(trade.outcome, Outcome::Loss);
}

#[test]
fn finer_bars_resolve_ambiguity() {
    let bars = ambiguous(102.0);
    let target_first = vec![
        span(2, 100.0, 105.0),
        span(3, 104.0, 111.0),
        span(4, 94.0, 106.0),
    ];
    let stop_first = vec![span(2, 96.0, 102.0), span(3, 94.0, 103.0), span(4, 103.0, 111.0)];

    let worst = TradeLifecycleSimulator::new(with_policy(PathPolicy::WorstCase)).unwrap();
    let trade = worst.simulate_refined(&long_setup(), &bars, &target_first);
    assert_eq!(trade.outcome, Outcome::Win);
    assert_eq!(trade.exit_time, Some(t(2)));

    let best = TradeLifecycleSimulator::new(with_policy(PathPolicy::BestCase)).unwrap();
    let trade = best.simulate_refined(&long_setup(), &bars, &stop_first);
    assert_eq!(trade.outcome, Outcome::Loss);
}

#[test]
fn missing_finer_bars_fall_back_to_policy() {
    let sim = TradeLifecycleSimulator::new(with_policy(PathPolicy::WorstCase)).unwrap();
    let trade = sim.simulate_refined(&long_setup(), &ambiguous(102.0), &[]);
    assert_eq!(trade.outcome, Outcome::Loss);
}

// ──────────────────────────────────────────────
// Determinism
// ──────────────────────────────────────────────

#[test]
fn replay_is_pure() {
    let bars = vec![
        span(1, 99.0, 100.5),
        span(2, 101.0, 106.0),
        span(3, 103.0, 115.0),
        span(4, 108.0, 112.0),
    ];
    let sim = TradeLifecycleSimulator::new(managed_config()).unwrap();
    let first = sim.simulate(&managed_setup(), &bars);
    let second = sim.simulate(&managed_setup(), &bars);
    assert_eq!(first, second);
    assert_fill_consistent(&first);
}
