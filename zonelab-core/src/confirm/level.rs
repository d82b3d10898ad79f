//! Watched levels: the per-signal records held in the monitor's arena.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::MonitorConfig;
use crate::domain::{Bar, CandidateLevel, Direction, LevelHandle, Side, Signal};

/// Lifecycle of a watch. `Confirmed` and `Expired` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum LevelState {
    Monitoring,
    Confirmed,
    Expired(ExpiryReason),
}

impl LevelState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, LevelState::Monitoring)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryReason {
    Timeout,
    RiskTooHigh,
}

/// How close a bar came to a level, from the defended side's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelInteraction {
    Away,
    Approaching,
    Testing,
    Breached,
}

impl LevelInteraction {
    pub fn classify(direction: Direction, level: f64, bar: &Bar, config: &MonitorConfig) -> Self {
        if direction.penetration(level, bar.close) > config.breach_threshold {
            return LevelInteraction::Breached;
        }
        let reach = direction.penetration(level, direction.adverse_extreme(bar));
        if reach >= -config.test_threshold {
            LevelInteraction::Testing
        } else if reach >= -config.approach_threshold {
            LevelInteraction::Approaching
        } else {
            LevelInteraction::Away
        }
    }

    pub fn is_test(self) -> bool {
        matches!(self, LevelInteraction::Testing | LevelInteraction::Breached)
    }
}

/// Per-candidate status inside a watch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubLevel {
    pub level: CandidateLevel,
    pub interaction: LevelInteraction,
    pub test_time: Option<DateTime<Utc>>,
    /// Adverse extreme of the most recent bar that touched the level.
    pub last_test_extreme: Option<f64>,
    pub lost: bool,
    pub lost_time: Option<DateTime<Utc>>,
    /// Index (within the watch) of the bar that lost the level.
    pub lost_bar: Option<usize>,
    pub lost_price: Option<f64>,
    pub recovery_deadline: Option<DateTime<Utc>>,
    pub recovery_expired: bool,
}

impl SubLevel {
    pub(crate) fn new(level: CandidateLevel) -> Self {
        Self {
            level,
            interaction: LevelInteraction::Away,
            test_time: None,
            last_test_extreme: None,
            lost: false,
            lost_time: None,
            lost_bar: None,
            lost_price: None,
            recovery_deadline: None,
            recovery_expired: false,
        }
    }

    pub fn price(&self) -> f64 {
        self.level.price
    }

    /// Lost with the recovery window closed: nothing can confirm it anymore.
    pub fn is_dead(&self) -> bool {
        self.lost && self.recovery_expired
    }
}

/// One signal under watch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchedLevel {
    pub handle: LevelHandle,
    pub signal: Signal,
    pub zone_quality: f64,
    pub sub_levels: Vec<SubLevel>,
    pub state: LevelState,
    pub test_low: Option<f64>,
    pub test_high: Option<f64>,
    pub monitoring_start: DateTime<Utc>,
    pub test_time: Option<DateTime<Utc>>,
    pub confirmation_time: Option<DateTime<Utc>>,
    /// Bars processed since monitoring started.
    pub bars_seen: usize,
}

impl WatchedLevel {
    pub(crate) fn new(
        handle: LevelHandle,
        signal: Signal,
        zone_quality: f64,
        levels: Vec<CandidateLevel>,
    ) -> Self {
        Self {
            handle,
            monitoring_start: signal.origin_time,
            signal,
            zone_quality,
            sub_levels: levels.into_iter().map(SubLevel::new).collect(),
            state: LevelState::Monitoring,
            test_low: None,
            test_high: None,
            test_time: None,
            confirmation_time: None,
            bars_seen: 0,
        }
    }

    pub fn side(&self) -> Side {
        self.signal.side
    }

    pub fn direction(&self) -> Direction {
        self.signal.direction()
    }

    pub fn is_active(&self) -> bool {
        !self.state.is_terminal()
    }

    /// Running extreme on the adverse side (test low for a buy).
    pub fn sweep_extreme(&self) -> Option<f64> {
        match self.direction() {
            Direction::Long => self.test_low,
            Direction::Short => self.test_high,
        }
    }

    pub(crate) fn absorb_extremes(&mut self, bar: &Bar) {
        self.test_low = Some(self.test_low.map_or(bar.low, |low| low.min(bar.low)));
        self.test_high = Some(self.test_high.map_or(bar.high, |high| high.max(bar.high)));
    }
}
