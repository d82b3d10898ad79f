//! Monitor configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::StopMode;
use crate::validation::{non_negative, positive, span_ms, ConfigError};

/// Tunables for [`ZoneConfirmationMonitor`](super::ZoneConfirmationMonitor).
///
/// Distances are in price units, times in milliseconds of bar time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Adverse extreme within this distance of a level counts as approaching.
    pub approach_threshold: f64,
    /// Adverse extreme within this distance of a level counts as a test.
    pub test_threshold: f64,
    /// A close must be beyond the level by more than this to lose it.
    pub breach_threshold: f64,
    /// Watch timeout measured from the signal's origin time.
    pub max_wait_ms: i64,
    /// Confirming within this long of the start earns a strength bonus.
    pub min_hold_ms: i64,
    pub max_recovery_bars: u32,
    pub candle_interval_ms: i64,
    /// Minimum excursion beyond the level for a wick rejection.
    pub min_wick_size: f64,
    pub stop_mode: StopMode,
    pub max_acceptable_risk: f64,
    /// Structural stops may exceed `max_acceptable_risk` by this factor...
    pub structural_risk_multiplier: f64,
    /// ...but never this absolute distance.
    pub structural_risk_ceiling: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            approach_threshold: 10.0,
            test_threshold: 2.0,
            breach_threshold: 0.0,
            max_wait_ms: 30 * 60 * 1000,
            min_hold_ms: 60 * 1000,
            max_recovery_bars: 3,
            candle_interval_ms: 60 * 1000,
            min_wick_size: 3.0,
            stop_mode: StopMode::default(),
            max_acceptable_risk: 20.0,
            structural_risk_multiplier: 1.5,
            structural_risk_ceiling: 40.0,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("approach_threshold", self.approach_threshold)?;
        non_negative("test_threshold", self.test_threshold)?;
        non_negative("breach_threshold", self.breach_threshold)?;
        if self.test_threshold > self.approach_threshold {
            return Err(ConfigError::Inconsistent(format!(
                "test_threshold ({}) exceeds approach_threshold ({})",
                self.test_threshold, self.approach_threshold
            )));
        }
        span_ms("max_wait_ms", self.max_wait_ms)?;
        non_negative("min_hold_ms", self.min_hold_ms as f64)?;
        if self.min_hold_ms > 0 {
            span_ms("min_hold_ms", self.min_hold_ms)?;
        }
        span_ms("candle_interval_ms", self.candle_interval_ms)?;
        positive("max_recovery_bars", f64::from(self.max_recovery_bars))?;
        let window = self
            .candle_interval_ms
            .checked_mul(i64::from(self.max_recovery_bars))
            .unwrap_or(i64::MAX);
        span_ms("candle_interval_ms * max_recovery_bars", window)?;
        non_negative("min_wick_size", self.min_wick_size)?;
        self.stop_mode.validate()?;
        positive("max_acceptable_risk", self.max_acceptable_risk)?;
        positive("structural_risk_ceiling", self.structural_risk_ceiling)?;
        if self.structural_risk_multiplier.is_nan() || self.structural_risk_multiplier < 1.0 {
            return Err(ConfigError::Inconsistent(format!(
                "structural_risk_multiplier must be >= 1, got {}",
                self.structural_risk_multiplier
            )));
        }
        Ok(())
    }

    pub fn max_wait(&self) -> Duration {
        Duration::milliseconds(self.max_wait_ms)
    }

    pub fn min_hold(&self) -> Duration {
        Duration::milliseconds(self.min_hold_ms)
    }

    /// Time a lost level has to recover, `max_recovery_bars` candles.
    pub fn recovery_window(&self) -> Duration {
        Duration::milliseconds(
            self.candle_interval_ms
                .saturating_mul(i64::from(self.max_recovery_bars)),
        )
    }

    /// Largest stop distance the risk gate lets through.
    pub fn risk_ceiling(&self) -> f64 {
        if self.stop_mode.is_structural() {
            (self.max_acceptable_risk * self.structural_risk_multiplier)
                .min(self.structural_risk_ceiling)
        } else {
            self.max_acceptable_risk
        }
    }
}
