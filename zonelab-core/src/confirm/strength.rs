//! Confirmation strength, a 0–100 heuristic. Informational only.

use chrono::Duration;

const BASE: f64 = 50.0;
const QUALITY_WEIGHT: f64 = 20.0;
const FAST_BONUS: f64 = 15.0;
const PROMPT_BONUS: f64 = 5.0;
const SHALLOW_BONUS: f64 = 10.0;
const MODERATE_BONUS: f64 = 5.0;
const STRONG_BODY_RATIO: f64 = 0.6;
const STRONG_BODY_BONUS: f64 = 10.0;
const FIRM_BODY_RATIO: f64 = 0.4;
const FIRM_BODY_BONUS: f64 = 5.0;

#[derive(Debug, Clone, Copy)]
pub(crate) struct StrengthInputs {
    /// Zone quality in [0, 1].
    pub zone_quality: f64,
    /// Candidate level score in [0, 1], if the producer scored it.
    pub level_score: Option<f64>,
    pub elapsed: Duration,
    pub min_hold: Duration,
    /// How far price swept beyond the level before confirming.
    pub test_depth: f64,
    pub test_threshold: f64,
    pub body_ratio: f64,
}

pub(crate) fn confirmation_strength(inputs: &StrengthInputs) -> f64 {
    let quality = match inputs.level_score {
        Some(score) => (inputs.zone_quality + unit(score)) / 2.0,
        None => inputs.zone_quality,
    };
    let mut strength = BASE + QUALITY_WEIGHT * unit(quality);

    if inputs.elapsed <= inputs.min_hold {
        strength += FAST_BONUS;
    } else if inputs.elapsed <= inputs.min_hold * 2 {
        strength += PROMPT_BONUS;
    }

    let depth = inputs.test_depth.max(0.0);
    if depth <= inputs.test_threshold {
        strength += SHALLOW_BONUS;
    } else if depth <= 2.0 * inputs.test_threshold {
        strength += MODERATE_BONUS;
    }

    if inputs.body_ratio >= STRONG_BODY_RATIO {
        strength += STRONG_BODY_BONUS;
    } else if inputs.body_ratio >= FIRM_BODY_RATIO {
        strength += FIRM_BODY_BONUS;
    }

    strength.clamp(0.0, 100.0)
}

fn unit(x: f64) -> f64 {
    if x.is_finite() {
        x.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
