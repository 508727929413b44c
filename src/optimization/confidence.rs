//! Confidence scoring for optimization results

use serde::Serialize;
use statrs::statistics::Statistics;

use crate::types::{EnvironmentalConditions, Priorities, MAX_PRIORITY};

const BASE_CONFIDENCE: f64 = 0.8;
const EXACT_MATCH_BONUS: f64 = 0.1;
const CLARITY_WEIGHT: f64 = 0.1;
const MILD_TEMPERATURE_BONUS: f64 = 0.05;
const MAX_CONFIDENCE: f64 = 0.95;

/// Confidence assigned to emergency fallback results.
pub const EMERGENCY_CONFIDENCE: f64 = 0.6;

/// Additive confidence factors before capping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceBreakdown {
    pub base: f64,
    /// Bonus when the vehicle matched a known profile
    pub exact_match: f64,
    /// Bonus for a clear (low-variance) priority set
    pub priority_clarity: f64,
    /// Bonus when the temperature sits in the models' calibrated band
    pub temperature: f64,
}

impl ConfidenceBreakdown {
    /// Sum of the factors, capped at 0.95.
    pub fn compute(&self) -> f64 {
        (self.base + self.exact_match + self.priority_clarity + self.temperature).min(MAX_CONFIDENCE)
    }
}

/// Score confidence for one optimization.
///
/// Clarity uses the population variance of the five priorities, normalized
/// by the largest variance possible on [0, 10] (25).
pub fn score_confidence(
    exact_match: bool,
    priorities: &Priorities,
    conditions: &EnvironmentalConditions,
) -> ConfidenceBreakdown {
    ConfidenceBreakdown {
        base: BASE_CONFIDENCE,
        exact_match: if exact_match { EXACT_MATCH_BONUS } else { 0.0 },
        priority_clarity: CLARITY_WEIGHT * (1.0 - normalized_variance(priorities)),
        temperature: if (50.0..=80.0).contains(&conditions.temperature) {
            MILD_TEMPERATURE_BONUS
        } else {
            0.0
        },
    }
}

fn normalized_variance(priorities: &Priorities) -> f64 {
    let max_variance = (MAX_PRIORITY / 2.0).powi(2);
    let variance = priorities.values().population_variance();
    if variance.is_finite() {
        (variance / max_variance).clamp(0.0, 1.0)
    } else {
        1.0
    }
}
