//! Raw signals and the price zones they are anchored to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Direction, Side};

/// A raw signal produced by an upstream origination heuristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub side: Side,
    /// Bars stamped at or after this time are evaluated against the zone.
    pub origin_time: DateTime<Utc>,
    /// Free-form origin tag (e.g. "put_wall", "sweep"), carried into events.
    #[serde(default)]
    pub source: Option<String>,
}

impl Signal {
    pub fn new(side: Side, origin_time: DateTime<Utc>) -> Self {
        Self {
            side,
            origin_time,
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn direction(&self) -> Direction {
        self.side.direction()
    }
}

/// One candidate price inside a zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateLevel {
    pub price: f64,
    #[serde(default)]
    pub label: Option<String>,
    /// Level quality in [0, 1], when the producer scores levels individually.
    #[serde(default)]
    pub score: Option<f64>,
}

impl CandidateLevel {
    pub fn new(price: f64) -> Self {
        Self {
            price,
            label: None,
            score: None,
        }
    }

    pub fn labeled(price: f64, label: impl Into<String>) -> Self {
        Self {
            price,
            label: Some(label.into()),
            score: None,
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ZoneError {
    #[error("zone must contain at least one candidate level")]
    Empty,
    #[error("candidate level price must be finite, got {0}")]
    NonFinitePrice(f64),
}

/// A price zone: candidate levels evaluated in priority order, plus an
/// overall quality score in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ZoneRepr")]
pub struct Zone {
    levels: Vec<CandidateLevel>,
    quality: f64,
}

#[derive(Deserialize)]
struct ZoneRepr {
    levels: Vec<CandidateLevel>,
    #[serde(default)]
    quality: f64,
}

impl TryFrom<ZoneRepr> for Zone {
    type Error = ZoneError;

    fn try_from(repr: ZoneRepr) -> Result<Self, Self::Error> {
        Ok(Zone::new(repr.levels)?.with_quality(repr.quality))
    }
}

impl Zone {
    pub fn new(levels: Vec<CandidateLevel>) -> Result<Self, ZoneError> {
        if levels.is_empty() {
            return Err(ZoneError::Empty);
        }
        if let Some(bad) = levels.iter().find(|l| !l.price.is_finite()) {
            return Err(ZoneError::NonFinitePrice(bad.price));
        }
        Ok(Self {
            levels,
            quality: 0.0,
        })
    }

    /// Single-level zone.
    pub fn at(price: f64) -> Result<Self, ZoneError> {
        Self::new(vec![CandidateLevel::new(price)])
    }

    /// Quality is clamped into [0, 1].
    pub fn with_quality(mut self, quality: f64) -> Self {
        self.quality = if quality.is_finite() {
            quality.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }

    pub fn levels(&self) -> &[CandidateLevel] {
        &self.levels
    }

    pub fn quality(&self) -> f64 {
        self.quality
    }

    pub fn into_levels(self) -> Vec<CandidateLevel> {
        self.levels
    }
}
