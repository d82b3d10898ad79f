//! ZoneConfirmationMonitor: turns raw zone signals into confirmed entries.
//!
//! Watches live in an arena of slots addressed by [`LevelHandle`]. Each
//! `process_candle` call advances every active watch by one bar, in
//! insertion order. A watch confirms at most once; after `Confirmed` or
//! `Expired` it is never touched again and waits for the caller to release it.
//!
//! Per bar, per watch:
//! 1. Bars stamped before the watch's start are ignored.
//! 2. Timeout check against `max_wait`.
//! 3. Running extremes absorb the bar.
//! 4. Sub-levels in zone order: classify interaction, then evaluate
//!    [`ConfirmationType::PRIORITY`]; the first pattern that fires wins.
//! 5. The candidate's stop is placed and passed through the risk gate.

use chrono::{DateTime, Duration, Utc};

use super::level::{ExpiryReason, LevelInteraction, LevelState, SubLevel, WatchedLevel};
use super::pattern::{self, ConfirmationType};
use super::strength::{confirmation_strength, StrengthInputs};
use super::{ConfirmationEvent, MonitorConfig};
use crate::domain::{Bar, Direction, LevelHandle, Signal, Zone};
use crate::journal::{EventSink, MonitorEvent, NullSink};
use crate::validation::ConfigError;

#[derive(Debug, Clone)]
pub struct ZoneConfirmationMonitor {
    config: MonitorConfig,
    slots: Vec<Option<WatchedLevel>>,
}

/// A pattern that fired on a sub-level, before the risk gate.
struct Candidate {
    sub_index: usize,
    confirmation_type: ConfirmationType,
    entry_price: f64,
}

impl ZoneConfirmationMonitor {
    pub fn new(config: MonitorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            slots: Vec::new(),
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Start watching `zone` on behalf of `signal`.
    pub fn monitor_level(&mut self, zone: Zone, signal: Signal) -> LevelHandle {
        self.monitor_level_with(zone, signal, &mut NullSink)
    }

    pub fn monitor_level_with<S>(&mut self, zone: Zone, signal: Signal, sink: &mut S) -> LevelHandle
    where
        S: EventSink + ?Sized,
    {
        let handle = LevelHandle(self.slots.len());
        let quality = zone.quality();
        let watch = WatchedLevel::new(handle, signal, quality, zone.into_levels());

        sink.record(&MonitorEvent::MonitoringStarted {
            handle,
            side: watch.side(),
            time: watch.monitoring_start,
            levels: watch.sub_levels.iter().map(SubLevel::price).collect(),
        });
        self.slots.push(Some(watch));
        handle
    }

    /// Advance every active watch by one bar.
    pub fn process_candle(&mut self, bar: &Bar) -> Vec<ConfirmationEvent> {
        self.process_candle_with(bar, &mut NullSink)
    }

    pub fn process_candle_with<S>(&mut self, bar: &Bar, sink: &mut S) -> Vec<ConfirmationEvent>
    where
        S: EventSink + ?Sized,
    {
        let config = &self.config;
        self.slots
            .iter_mut()
            .flatten()
            .filter(|watch| watch.is_active())
            .filter_map(|watch| advance(watch, bar, config, sink))
            .collect()
    }

    pub fn get(&self, handle: LevelHandle) -> Option<&WatchedLevel> {
        self.slots.get(handle.0).and_then(Option::as_ref)
    }

    /// Remove a watch from the arena. Its handle is never issued again.
    pub fn release(&mut self, handle: LevelHandle) -> Option<WatchedLevel> {
        self.slots.get_mut(handle.0).and_then(Option::take)
    }

    /// Release every watch that has reached a terminal state.
    pub fn drain_terminal(&mut self) -> Vec<WatchedLevel> {
        self.slots
            .iter_mut()
            .filter(|slot| slot.as_ref().is_some_and(|w| !w.is_active()))
            .filter_map(Option::take)
            .collect()
    }

    /// Watches still in `Monitoring`.
    pub fn active_count(&self) -> usize {
        self.slots.iter().flatten().filter(|w| w.is_active()).count()
    }

    /// Handles of every unreleased watch, in insertion order.
    pub fn handles(&self) -> impl Iterator<Item = LevelHandle> + '_ {
        self.slots.iter().flatten().map(|w| w.handle)
    }
}

fn advance<S>(
    watch: &mut WatchedLevel,
    bar: &Bar,
    config: &MonitorConfig,
    sink: &mut S,
) -> Option<ConfirmationEvent>
where
    S: EventSink + ?Sized,
{
    if bar.timestamp < watch.monitoring_start {
        return None;
    }

    if bar.timestamp - watch.monitoring_start > config.max_wait() {
        expire(watch, bar, ExpiryReason::Timeout, sink);
        return None;
    }

    watch.absorb_extremes(bar);
    let bar_index = watch.bars_seen;
    watch.bars_seen += 1;

    let direction = watch.direction();
    let handle = watch.handle;
    let mut candidate = None;

    for (sub_index, sub) in watch.sub_levels.iter_mut().enumerate() {
        let level = sub.price();

        sub.interaction = LevelInteraction::classify(direction, level, bar, config);
        if sub.interaction.is_test() && sub.test_time.is_none() {
            sub.test_time = Some(bar.timestamp);
            watch.test_time.get_or_insert(bar.timestamp);
        }
        if pattern::wick_size(direction, level, bar) >= 0.0 {
            sub.last_test_extreme = Some(direction.adverse_extreme(bar));
        }

        if sub.is_dead() {
            continue;
        }

        let fired = ConfirmationType::PRIORITY.into_iter().find(|kind| match kind {
            ConfirmationType::WickRejection => {
                !sub.lost && pattern::is_wick_rejection(direction, level, bar, config.min_wick_size)
            }
            ConfirmationType::LevelRecovery => {
                evaluate_recovery(handle, sub, bar_index, direction, bar, config, sink)
            }
        });

        if let Some(confirmation_type) = fired {
            candidate = Some(Candidate {
                sub_index,
                confirmation_type,
                entry_price: bar.close,
            });
            break;
        }
    }

    let candidate = candidate?;
    confirm(watch, candidate, bar, config, sink)
}

/// Loss/recovery bookkeeping for one sub-level. Returns true when this bar
/// recovers a previously lost level inside its window.
fn evaluate_recovery<S>(
    handle: LevelHandle,
    sub: &mut SubLevel,
    bar_index: usize,
    direction: Direction,
    bar: &Bar,
    config: &MonitorConfig,
    sink: &mut S,
) -> bool
where
    S: EventSink + ?Sized,
{
    let level = sub.price();

    if !sub.lost {
        if pattern::closes_beyond(direction, level, bar, config.breach_threshold) {
            // Bar timestamps near the end of chrono's range leave no room
            // for a window; such a level keeps its recovery open.
            let deadline = bar
                .timestamp
                .checked_add_signed(config.recovery_window())
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            sub.lost = true;
            sub.lost_time = Some(bar.timestamp);
            sub.lost_bar = Some(bar_index);
            sub.lost_price = Some(bar.close);
            sub.recovery_deadline = Some(deadline);
            sink.record(&MonitorEvent::LevelLost {
                handle,
                level,
                time: bar.timestamp,
                close: bar.close,
                recovery_deadline: deadline,
            });
        }
        // The bar that loses a level can't also recover it.
        return false;
    }

    if sub.recovery_expired || sub.lost_bar == Some(bar_index) {
        return false;
    }

    match sub.recovery_deadline {
        Some(deadline) if bar.timestamp > deadline => {
            sub.recovery_expired = true;
            sink.record(&MonitorEvent::RecoveryExpired {
                handle,
                level,
                time: bar.timestamp,
            });
            false
        }
        _ => pattern::is_recovery(direction, level, bar),
    }
}

fn confirm<S>(
    watch: &mut WatchedLevel,
    candidate: Candidate,
    bar: &Bar,
    config: &MonitorConfig,
    sink: &mut S,
) -> Option<ConfirmationEvent>
where
    S: EventSink + ?Sized,
{
    let direction = watch.direction();
    let sub = &watch.sub_levels[candidate.sub_index];
    let level = sub.price();

    let test_extreme = sub
        .last_test_extreme
        .or(watch.sweep_extreme())
        .unwrap_or(level);
    let stop_loss = config
        .stop_mode
        .place(direction, candidate.entry_price, test_extreme);
    let risk = direction.penetration(candidate.entry_price, stop_loss);
    let max_risk = config.risk_ceiling();

    if risk <= 0.0 || risk > max_risk {
        sink.record(&MonitorEvent::RiskTooHigh {
            handle: watch.handle,
            level,
            time: bar.timestamp,
            risk,
            max_risk,
        });
        expire(watch, bar, ExpiryReason::RiskTooHigh, sink);
        return None;
    }

    let elapsed = bar.timestamp - watch.monitoring_start;
    let test_depth = watch
        .sweep_extreme()
        .map_or(0.0, |extreme| direction.penetration(level, extreme));
    let strength = confirmation_strength(&StrengthInputs {
        zone_quality: watch.zone_quality,
        level_score: sub.level.score,
        elapsed: elapsed.max(Duration::zero()),
        min_hold: config.min_hold(),
        test_depth,
        test_threshold: config.test_threshold,
        body_ratio: bar.body_ratio(),
    });

    let event = ConfirmationEvent {
        handle: watch.handle,
        side: watch.side(),
        confirmation_type: candidate.confirmation_type,
        entry_price: candidate.entry_price,
        stop_loss,
        risk,
        tested_level: level,
        level_label: sub.level.label.clone(),
        test_extreme,
        strength,
        source: watch.signal.source.clone(),
        signal_time: watch.signal.origin_time,
        test_time: watch.test_time,
        lost_time: sub.lost_time,
        confirmation_time: bar.timestamp,
    };

    watch.state = LevelState::Confirmed;
    watch.confirmation_time = Some(bar.timestamp);
    sink.record(&MonitorEvent::Confirmed {
        handle: watch.handle,
        level,
        time: bar.timestamp,
        confirmation_type: event.confirmation_type,
        entry_price: event.entry_price,
        stop_loss,
        strength,
    });
    Some(event)
}

fn expire<S>(watch: &mut WatchedLevel, bar: &Bar, reason: ExpiryReason, sink: &mut S)
where
    S: EventSink + ?Sized,
{
    watch.state = LevelState::Expired(reason);
    sink.record(&MonitorEvent::Expired {
        handle: watch.handle,
        time: bar.timestamp,
        reason,
    });
}
