use serde::{Deserialize, Serialize};

use crate::math::stats::{mean, std_pop};

const MIN_POINTS: usize = 4;
const STEP_DECLINE: f64 = 0.05;
const DECLINE_SHARE: f64 = 0.6;
const SWING: f64 = 0.1;
const MIN_OSCILLATIONS: usize = 2;
const ACUTE_STEP: f64 = -0.5;
const STABLE_STD: f64 = 0.15;

/// Shape of the composite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TemporalPattern {
    MonotonicDecline { points: usize, decline_ratio: f64 },
    Episodic { oscillations: usize },
    AcuteDrop { at: usize, magnitude: f64 },
    Stable { mean: f64, std: f64 },
    Unclear,
    InsufficientData,
}

impl TemporalPattern {
    pub fn name(&self) -> &'static str {
        match self {
            TemporalPattern::MonotonicDecline { .. } => "monotonic_decline",
            TemporalPattern::Episodic { .. } => "episodic",
            TemporalPattern::AcuteDrop { .. } => "acute_drop",
            TemporalPattern::Stable { .. } => "stable",
            TemporalPattern::Unclear => "unclear",
            TemporalPattern::InsufficientData => "insufficient_data",
        }
    }
}

/// Checks in order: monotonic decline, episodic swings, acute drop, stable.
pub fn detect_pattern(timeline: &[f64]) -> TemporalPattern {
    let n = timeline.len();
    if n < MIN_POINTS {
        return TemporalPattern::InsufficientData;
    }

    let declines = timeline
        .windows(2)
        .filter(|w| w[1] < w[0] - STEP_DECLINE)
        .count();
    if declines as f64 >= n as f64 * DECLINE_SHARE {
        return TemporalPattern::MonotonicDecline {
            points: n,
            decline_ratio: declines as f64 / (n - 1) as f64,
        };
    }

    let oscillations = timeline
        .windows(3)
        .filter(|w| {
            let prev = w[1] - w[0];
            let curr = w[2] - w[1];
            (prev > SWING && curr < -SWING) || (prev < -SWING && curr > SWING)
        })
        .count();
    if oscillations >= MIN_OSCILLATIONS {
        return TemporalPattern::Episodic { oscillations };
    }

    for (idx, w) in timeline.windows(2).enumerate() {
        let step = w[1] - w[0];
        if step < ACUTE_STEP {
            return TemporalPattern::AcuteDrop {
                at: idx + 1,
                magnitude: step,
            };
        }
    }

    let std = std_pop(timeline);
    if std < STABLE_STD {
        return TemporalPattern::Stable {
            mean: mean(timeline),
            std,
        };
    }
    TemporalPattern::Unclear
}
