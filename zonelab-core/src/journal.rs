//! Monitor journal: structured observability records, decoupled from the
//! state machine.
//!
//! The monitor reports what happened to an [`EventSink`]. Sinks cannot feed
//! anything back, so swapping one for another never changes a replay.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::confirm::{ConfirmationType, ExpiryReason};
use crate::domain::{LevelHandle, Side};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MonitorEvent {
    MonitoringStarted {
        handle: LevelHandle,
        side: Side,
        time: DateTime<Utc>,
        levels: Vec<f64>,
    },
    LevelLost {
        handle: LevelHandle,
        level: f64,
        time: DateTime<Utc>,
        close: f64,
        recovery_deadline: DateTime<Utc>,
    },
    Confirmed {
        handle: LevelHandle,
        level: f64,
        time: DateTime<Utc>,
        confirmation_type: ConfirmationType,
        entry_price: f64,
        stop_loss: f64,
        strength: f64,
    },
    RecoveryExpired {
        handle: LevelHandle,
        level: f64,
        time: DateTime<Utc>,
    },
    RiskTooHigh {
        handle: LevelHandle,
        level: f64,
        time: DateTime<Utc>,
        risk: f64,
        max_risk: f64,
    },
    Expired {
        handle: LevelHandle,
        time: DateTime<Utc>,
        reason: ExpiryReason,
    },
}

impl MonitorEvent {
    pub fn handle(&self) -> LevelHandle {
        match self {
            MonitorEvent::MonitoringStarted { handle, .. }
            | MonitorEvent::LevelLost { handle, .. }
            | MonitorEvent::Confirmed { handle, .. }
            | MonitorEvent::RecoveryExpired { handle, .. }
            | MonitorEvent::RiskTooHigh { handle, .. }
            | MonitorEvent::Expired { handle, .. } => *handle,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MonitorEvent::MonitoringStarted { .. } => "monitoring_started",
            MonitorEvent::LevelLost { .. } => "level_lost",
            MonitorEvent::Confirmed { .. } => "confirmed",
            MonitorEvent::RecoveryExpired { .. } => "recovery_expired",
            MonitorEvent::RiskTooHigh { .. } => "risk_too_high",
            MonitorEvent::Expired { .. } => "expired",
        }
    }
}

/// Receives journal records.
pub trait EventSink {
    fn record(&mut self, event: &MonitorEvent);
}

impl<F> EventSink for F
where
    F: FnMut(&MonitorEvent),
{
    fn record(&mut self, event: &MonitorEvent) {
        self(event)
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&mut self, _event: &MonitorEvent) {}
}

/// Collects records in arrival order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VecSink {
    events: Vec<MonitorEvent>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[MonitorEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<MonitorEvent> {
        self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for VecSink {
    fn record(&mut self, event: &MonitorEvent) {
        self.events.push(event.clone());
    }
}

/// Forwards records to `tracing`. Lifecycle milestones at `info`, the rest
/// at `debug`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&mut self, event: &MonitorEvent) {
        match event {
            MonitorEvent::MonitoringStarted {
                handle,
                side,
                time,
                levels,
            } => tracing::debug!(%handle, ?side, %time, ?levels, "monitoring started"),
            MonitorEvent::LevelLost {
                handle,
                level,
                time,
                close,
                recovery_deadline,
            } => tracing::debug!(
                %handle,
                price = level,
                %time,
                close,
                %recovery_deadline,
                "level lost"
            ),
            MonitorEvent::Confirmed {
                handle,
                level,
                time,
                confirmation_type,
                entry_price,
                stop_loss,
                strength,
            } => tracing::info!(
                %handle,
                price = level,
                %time,
                %confirmation_type,
                entry_price,
                stop_loss,
                strength,
                "level confirmed"
            ),
            MonitorEvent::RecoveryExpired {
                handle,
                level,
                time,
            } => tracing::debug!(%handle, price = level, %time, "recovery window expired"),
            MonitorEvent::RiskTooHigh {
                handle,
                level,
                time,
                risk,
                max_risk,
            } => tracing::info!(
                %handle,
                price = level,
                %time,
                risk,
                max_risk,
                "confirmation rejected, risk too high"
            ),
            MonitorEvent::Expired {
                handle,
                time,
                reason,
            } => tracing::info!(%handle, %time, ?reason, "watch expired"),
        }
    }
}

/// Fans every record out to two sinks.
#[derive(Debug, Clone, Default)]
pub struct Tee<A, B>(pub A, pub B);

impl<A: EventSink, B: EventSink> EventSink for Tee<A, B> {
    fn record(&mut self, event: &MonitorEvent) {
        self.0.record(event);
        self.1.record(event);
    }
}
