//! TradeLifecycleSimulator: replays bars against a trade setup.
//!
//! Phase 1 waits for the limit to fill (timeout, cancel-on-target, fill).
//! Phase 2 manages the open position: excursions, stop/target under the path
//! policy, max hold, then stop adjustments for the next bar. Everything is a
//! pure function of the setup, the bars and the config.

use chrono::{DateTime, Utc};

use super::path_policy::{first_exit, first_exit_refined, target_touched, ExitTouch};
use super::{Excursion, ProtectiveStop, SimulatorConfig};
use crate::domain::{Bar, ExitReason, Outcome, SimulatedTrade, TradeSetup};
use crate::validation::ConfigError;

#[derive(Debug, Clone)]
pub struct TradeLifecycleSimulator {
    config: SimulatorConfig,
}

struct Fill {
    index: usize,
    time: DateTime<Utc>,
    price: f64,
}

struct Exit {
    outcome: Outcome,
    reason: Option<ExitReason>,
    time: Option<DateTime<Utc>>,
    price: Option<f64>,
    /// Price the P&L is measured against (the last close for open trades).
    mark: f64,
    last_bar: DateTime<Utc>,
}

impl TradeLifecycleSimulator {
    pub fn new(config: SimulatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Replay `bars` (chronological) against `setup`.
    pub fn simulate(&self, setup: &TradeSetup, bars: &[Bar]) -> SimulatedTrade {
        self.replay(setup, bars, None)
    }

    /// Like [`simulate`](Self::simulate), with finer bars used to resolve
    /// bars where both the stop and the target traded.
    pub fn simulate_refined(
        &self,
        setup: &TradeSetup,
        bars: &[Bar],
        sub_bars: &[Bar],
    ) -> SimulatedTrade {
        self.replay(setup, bars, Some(sub_bars))
    }

    fn replay(&self, setup: &TradeSetup, bars: &[Bar], sub_bars: Option<&[Bar]>) -> SimulatedTrade {
        let start = bars.partition_point(|b| b.timestamp < setup.origin_time());
        let bars = &bars[start..];

        let fill = match self.await_fill(setup, bars) {
            Ok(fill) => fill,
            Err(unfilled) => {
                tracing::trace!(outcome = ?unfilled.outcome, "order did not fill");
                return unfilled;
            }
        };

        let trade = self.manage(setup, bars, sub_bars, fill);
        tracing::trace!(
            outcome = ?trade.outcome,
            pnl = trade.pnl,
            bars_held = trade.bars_held,
            "trade closed"
        );
        trade
    }

    // ─── Phase 1: awaiting fill ──────────────────────────────────────────

    fn await_fill(&self, setup: &TradeSetup, bars: &[Bar]) -> Result<Fill, SimulatedTrade> {
        let direction = setup.direction();
        let limit = setup.entry_price();
        let timeout = self.config.order_timeout();

        for (index, bar) in bars.iter().enumerate() {
            if timeout.is_some_and(|t| bar.timestamp - setup.origin_time() > t) {
                return Err(SimulatedTrade::unfilled(
                    setup,
                    Outcome::Timeout,
                    Some(bar.timestamp),
                ));
            }

            if self.config.cancel_if_target_hit_first
                && target_touched(direction, bar, setup.take_profit())
            {
                return Err(SimulatedTrade::unfilled(
                    setup,
                    Outcome::CanceledTargetFirst,
                    Some(bar.timestamp),
                ));
            }

            if direction.penetration(limit, direction.adverse_extreme(bar)) >= 0.0 {
                return Ok(Fill {
                    index,
                    time: bar.timestamp,
                    price: direction.offset_with(limit, self.config.slippage),
                });
            }
        }

        Err(SimulatedTrade::unfilled(setup, Outcome::NoFill, None))
    }

    // ─── Phase 2: position open ──────────────────────────────────────────

    fn manage(
        &self,
        setup: &TradeSetup,
        bars: &[Bar],
        sub_bars: Option<&[Bar]>,
        fill: Fill,
    ) -> SimulatedTrade {
        let direction = setup.direction();
        let target = setup.take_profit();
        let mut stop = ProtectiveStop::new(direction, setup.stop_loss());
        let mut excursion = Excursion::new(direction, fill.price);
        let mut best_price: Option<f64> = None;
        let mut bars_held = 0;

        let mut exit = None;
        for (offset, bar) in bars[fill.index..].iter().enumerate() {
            let index = fill.index + offset;
            let on_fill_bar = offset == 0;
            bars_held += 1;
            excursion.absorb(bar, stop.level(), target);

            if !on_fill_bar || self.config.exit_on_fill_bar {
                let touch = match sub_bars {
                    Some(subs) => first_exit_refined(
                        self.config.path_policy,
                        direction,
                        bar,
                        sub_bars_within(subs, bars, index),
                        stop.level(),
                        target,
                    ),
                    None => first_exit(
                        self.config.path_policy,
                        direction,
                        bar,
                        stop.level(),
                        target,
                    ),
                };

                match touch {
                    Some(ExitTouch::Stop) => {
                        let pnl = direction.pnl(fill.price, stop.level());
                        exit = Some(Exit {
                            outcome: if pnl > 0.0 { Outcome::Win } else { Outcome::Loss },
                            reason: Some(stop.source().exit_reason()),
                            time: Some(bar.timestamp),
                            price: Some(stop.level()),
                            mark: stop.level(),
                            last_bar: bar.timestamp,
                        });
                        break;
                    }
                    Some(ExitTouch::Target) => {
                        let price = target.unwrap_or(bar.close);
                        exit = Some(Exit {
                            outcome: Outcome::Win,
                            reason: Some(ExitReason::TakeProfit),
                            time: Some(bar.timestamp),
                            price: Some(price),
                            mark: price,
                            last_bar: bar.timestamp,
                        });
                        break;
                    }
                    None => {}
                }
            }

            if self.config.max_hold_bars.is_some_and(|max| bars_held >= max) {
                exit = Some(Exit {
                    outcome: Outcome::MaxHold,
                    reason: Some(ExitReason::MaxHold),
                    time: Some(bar.timestamp),
                    price: Some(bar.close),
                    mark: bar.close,
                    last_bar: bar.timestamp,
                });
                break;
            }

            // Stops move on bars after the fill; the fill bar's extremes may
            // predate the fill.
            if !on_fill_bar {
                let favorable = direction.favorable_extreme(bar);
                let best = match best_price {
                    Some(b) if !direction.is_tighter(favorable, b) => b,
                    _ => favorable,
                };
                best_price = Some(best);
                stop.adjust(&self.config, fill.price, best);
            }
        }

        let exit = exit.unwrap_or_else(|| self.end_of_data(bars, fill.time, fill.price));
        let pnl = direction.pnl(fill.price, exit.mark);
        let held_until = exit.time.unwrap_or(exit.last_bar);

        SimulatedTrade {
            filled: true,
            fill_time: Some(fill.time),
            fill_price: Some(fill.price),
            time_to_fill_ms: Some((fill.time - setup.origin_time()).num_milliseconds()),
            outcome: exit.outcome,
            exit_reason: exit.reason,
            exit_time: exit.time,
            exit_price: exit.price,
            final_stop: Some(stop.level()),
            pnl,
            mae: excursion.mae(),
            mfe: excursion.mfe(),
            hold_time_ms: Some((held_until - fill.time).num_milliseconds()),
            bars_held,
            ..SimulatedTrade::unfilled(setup, exit.outcome, exit.time)
        }
    }

    fn end_of_data(&self, bars: &[Bar], fill_time: DateTime<Utc>, fill_price: f64) -> Exit {
        let (last_time, last_close) = bars
            .last()
            .map_or((fill_time, fill_price), |b| (b.timestamp, b.close));

        if self.config.close_at_end_of_data {
            Exit {
                outcome: Outcome::EndOfData,
                reason: Some(ExitReason::EndOfData),
                time: Some(last_time),
                price: Some(last_close),
                mark: last_close,
                last_bar: last_time,
            }
        } else {
            Exit {
                outcome: Outcome::Open,
                reason: None,
                time: None,
                price: None,
                mark: last_close,
                last_bar: last_time,
            }
        }
    }
}

/// Finer bars covering `bars[index]`: stamped at or after it and before the
/// next coarse bar.
fn sub_bars_within<'a>(sub_bars: &'a [Bar], bars: &[Bar], index: usize) -> &'a [Bar] {
    let open = bars[index].timestamp;
    let from = sub_bars.partition_point(|s| s.timestamp < open);
    let to = match bars.get(index + 1) {
        Some(next) => sub_bars.partition_point(|s| s.timestamp < next.timestamp),
        None => sub_bars.len(),
    };
    &sub_bars[from..to.max(from)]
}
