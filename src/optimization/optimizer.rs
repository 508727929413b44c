//! Core RuleBasedOptimizer: controller settings recommendation engine

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::{AdvisorConfig, ConfigError};
use crate::registry::{ResolvedProfile, VehicleRegistry};
use crate::types::{
    diff_settings, ConditionsInput, ControllerSettings, EnvironmentalConditions, FunctionId,
    OptimizationMethod, OptimizationRequest, OptimizationResult, PerformancePrediction,
    Priorities, PriorityInput, ProfileError, VehicleData, VehicleProfile,
};

use super::cache::ResultCache;
use super::confidence::{score_confidence, EMERGENCY_CONFIDENCE};
use super::constraints::{ConstraintError, ConstraintSet};
use super::performance::predict_all;
use super::recommendations::{
    emergency_recommendations, generate_recommendations, RecommendationContext,
};
use super::rules::RuleSet;

/// Source tag carried on every result.
pub const SOURCE: &str = "rule_based_optimizer";

/// Value for every entry the emergency vector does not name.
const EMERGENCY_DEFAULT_VALUE: f64 = 50.0;

/// Known-safe settings returned when optimization cannot complete.
const EMERGENCY_SETTINGS: [(FunctionId, f64); 5] = [
    (FunctionId::SPEED_SCALING, 20.0),
    (FunctionId::MAX_CURRENT, 200.0),
    (FunctionId::ACCEL_RATE, 50.0),
    (FunctionId::REGEN_CURRENT, 220.0),
    (FunctionId::FIELD_WEAKENING, 40.0),
];

/// Internal failure inside one optimization. Never escapes `optimize`.
#[derive(Debug, Error)]
pub enum OptimizerError {
    #[error("malformed vehicle profile: {0}")]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Constraint(#[from] ConstraintError),
}

/// The conservative settings vector used by the emergency path.
pub fn emergency_settings() -> ControllerSettings {
    let mut settings = ControllerSettings::filled(EMERGENCY_DEFAULT_VALUE);
    for (id, value) in EMERGENCY_SETTINGS {
        settings[id] = value;
    }
    settings
}

/// Stateless optimizer over immutable rule, constraint and profile tables.
///
/// Construct once and share behind an `Arc`; every call is independent.
#[derive(Debug)]
pub struct RuleBasedOptimizer {
    registry: VehicleRegistry,
    rules: RuleSet,
    constraints: ConstraintSet,
    cache: Option<ResultCache>,
}

impl Default for RuleBasedOptimizer {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RuleBasedOptimizer {
    pub fn new(registry: VehicleRegistry, rules: RuleSet, constraints: ConstraintSet) -> Self {
        Self {
            registry,
            rules,
            constraints,
            cache: None,
        }
    }

    /// Built-in profiles, rules and constraints, no cache.
    pub fn builtin() -> Self {
        Self::new(
            VehicleRegistry::builtin(),
            RuleSet::new(),
            ConstraintSet::default(),
        )
    }

    /// Build from a loaded configuration: custom profiles merged into the
    /// registry, configured fallback and pass limit, optional cache.
    pub fn from_config(config: &AdvisorConfig) -> Result<Self, ConfigError> {
        let registry = config.build_registry()?;
        let mut optimizer = Self::new(
            registry,
            RuleSet::new(),
            ConstraintSet::new(config.optimizer.max_validation_passes),
        );
        if config.cache.enabled {
            optimizer = optimizer.with_cache(config.cache.max_entries);
        }
        info!(
            profiles = optimizer.registry.len(),
            fallback = %optimizer.registry.fallback_model(),
            cache = config.cache.enabled,
            "Optimizer initialized"
        );
        Ok(optimizer)
    }

    /// Enable the result cache.
    pub fn with_cache(mut self, max_entries: usize) -> Self {
        self.cache = Some(ResultCache::new(max_entries));
        self
    }

    pub fn registry(&self) -> &VehicleRegistry {
        &self.registry
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    pub fn cache(&self) -> Option<&ResultCache> {
        self.cache.as_ref()
    }

    /// Optimize one request. Never fails: internal errors produce the
    /// emergency fallback result.
    pub fn optimize(&self, request: &OptimizationRequest) -> OptimizationResult {
        match &self.cache {
            Some(cache) => cache.get_or_compute(request, || self.run(request)),
            None => self.run(request),
        }
    }

    /// Same as [`optimize`](Self::optimize) for callers holding the four
    /// inputs separately.
    pub fn optimize_parts(
        &self,
        vehicle: &VehicleData,
        priorities: &PriorityInput,
        current_settings: &[Option<f64>],
        conditions: &ConditionsInput,
    ) -> OptimizationResult {
        let request = OptimizationRequest {
            vehicle_data: vehicle.clone(),
            priorities: priorities.clone(),
            current_settings: current_settings.to_vec(),
            conditions: conditions.clone(),
        };
        self.optimize(&request)
    }

    /// Optimize independent requests in parallel, preserving order.
    pub fn optimize_batch(&self, requests: &[OptimizationRequest]) -> Vec<OptimizationResult> {
        debug!(count = requests.len(), "Optimizing batch");
        requests.par_iter().map(|r| self.optimize(r)).collect()
    }

    fn run(&self, request: &OptimizationRequest) -> OptimizationResult {
        let resolved = self.registry.resolve(&request.vehicle_data.model);
        match self.try_optimize(resolved, request) {
            Ok(result) => result,
            Err(e) => self.emergency_fallback(resolved, &e),
        }
    }

    fn try_optimize(
        &self,
        resolved: ResolvedProfile<'_>,
        request: &OptimizationRequest,
    ) -> Result<OptimizationResult, OptimizerError> {
        // 1. Profile
        let profile = resolved.profile;
        profile.validate()?;

        // 2. Normalize inputs
        let priorities = Priorities::from(&request.priorities);
        let conditions = EnvironmentalConditions::from(&request.conditions);

        // 3. Base vector
        let base = base_settings(&request.current_settings, profile);

        // 4-5. Strategy
        let strategy = self.rules.select_strategy(&priorities, &conditions);
        let (mut settings, environmental_overrides) =
            self.rules
                .apply_strategy(strategy, &base, profile, &conditions);

        // 6. Safety
        let corrections = self.constraints.validate(&mut settings, profile)?;

        // 7. Performance
        let performance = predict_all(&settings, profile, &conditions);
        let baseline_performance = predict_all(&base, profile, &conditions);

        // 8. Recommendations
        let recommendations = generate_recommendations(&RecommendationContext {
            strategy,
            settings: &settings,
            profile,
            conditions: &conditions,
            performance: &performance,
            overrides: &environmental_overrides,
            corrections: &corrections,
        });

        // 9. Confidence
        let confidence = score_confidence(resolved.exact, &priorities, &conditions).compute();

        let tradeoffs = self
            .rules
            .strategy(strategy)
            .map(|s| s.tradeoffs.iter().map(|t| t.to_string()).collect())
            .unwrap_or_default();

        info!(
            model = %profile.model,
            exact = resolved.exact,
            strategy = %strategy,
            corrections = corrections.len(),
            confidence,
            "Optimization complete"
        );

        Ok(OptimizationResult {
            success: true,
            changes: diff_settings(&base, &settings),
            optimized_settings: settings,
            strategy: Some(strategy),
            performance,
            recommendations,
            confidence,
            method: OptimizationMethod::RuleBased,
            source: SOURCE.to_string(),
            vehicle_model: profile.model.clone(),
            exact_match: resolved.exact,
            corrections,
            environmental_overrides,
            tradeoffs,
            baseline_performance: Some(baseline_performance),
        })
    }

    fn emergency_fallback(
        &self,
        resolved: ResolvedProfile<'_>,
        err: &OptimizerError,
    ) -> OptimizationResult {
        error!(
            model = %resolved.profile.model,
            error = %err,
            "Optimization failed, returning emergency settings"
        );
        OptimizationResult {
            success: false,
            optimized_settings: emergency_settings(),
            strategy: None,
            performance: PerformancePrediction::FALLBACK,
            recommendations: emergency_recommendations(&err.to_string()),
            confidence: EMERGENCY_CONFIDENCE,
            method: OptimizationMethod::EmergencyFallback,
            source: SOURCE.to_string(),
            vehicle_model: resolved.profile.model.clone(),
            exact_match: resolved.exact,
            corrections: Vec::new(),
            environmental_overrides: Vec::new(),
            tradeoffs: Vec::new(),
            baseline_performance: None,
            changes: Vec::new(),
        }
    }
}

/// Caller values where present and finite, else the profile default, else 0.
/// Entries past F.25 are ignored.
fn base_settings(current: &[Option<f64>], profile: &VehicleProfile) -> ControllerSettings {
    let mut base = ControllerSettings::default();
    for id in FunctionId::all() {
        let supplied = current
            .get(usize::from(id.number()) - 1)
            .copied()
            .flatten()
            .filter(|v| v.is_finite());
        base[id] = supplied
            .or_else(|| profile.default_for(id))
            .unwrap_or(0.0);
    }
    base
}
