//! Fail-fast configuration checks shared by the monitor and simulator configs.

use thiserror::Error;

/// Inconsistent configuration, raised at construction time, never mid-replay.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be >= 0, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must be > 0, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },
    #[error("{field} must be at most {max} ms, got {value}")]
    TooLong {
        field: &'static str,
        value: i64,
        max: i64,
    },
    #[error("inconsistent configuration: {0}")]
    Inconsistent(String),
}

pub(crate) fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NonFinite { field, value });
    }
    if value < 0.0 {
        return Err(ConfigError::Negative { field, value });
    }
    Ok(())
}

pub(crate) fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NonFinite { field, value });
    }
    if value <= 0.0 {
        return Err(ConfigError::NotPositive { field, value });
    }
    Ok(())
}

/// Longest time span a config may name: one year of bar time.
pub const MAX_SPAN_MS: i64 = 365 * 24 * 60 * 60 * 1000;

/// A millisecond span that is positive and small enough that adding it to
/// any bar timestamp stays representable.
pub(crate) fn span_ms(field: &'static str, value: i64) -> Result<(), ConfigError> {
    if value <= 0 {
        return Err(ConfigError::NotPositive {
            field,
            value: value as f64,
        });
    }
    if value > MAX_SPAN_MS {
        return Err(ConfigError::TooLong {
            field,
            value,
            max: MAX_SPAN_MS,
        });
    }
    Ok(())
}
