//! Rule-Based Optimization Engine
//!
//! Picks a strategy from the caller's priorities, applies its adjustment
//! table and environmental overrides, corrects the result against the safety
//! constraints, then predicts performance and scores confidence. Entirely
//! deterministic table-driven arithmetic.

mod cache;
mod confidence;
pub mod constraints;
mod optimizer;
pub mod performance;
pub mod recommendations;
pub mod rules;

pub use cache::ResultCache;
pub use confidence::{score_confidence, ConfidenceBreakdown, EMERGENCY_CONFIDENCE};
pub use constraints::{ConstraintError, ConstraintSet, SafetyConstraint, DEFAULT_MAX_PASSES};
pub use optimizer::{emergency_settings, OptimizerError, RuleBasedOptimizer, SOURCE};
pub use performance::{predict_all, PredictionError};
pub use rules::{Adjustment, OptimizationStrategy, RuleSet};
