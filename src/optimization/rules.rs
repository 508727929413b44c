//! Optimization Rule Set: strategy tables, strategy selection and
//! environmental overrides

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::types::{
    ConstraintCategory, ControllerSettings, EnvironmentalConditions, EnvironmentalOverride,
    FunctionId, Priorities, Strategy, VehicleProfile,
};

/// Base value for a tuned function with neither a caller value nor a default.
const FALLBACK_BASE_VALUE: f64 = 50.0;

/// Hills is only a candidate above this priority...
const HILLS_PRIORITY_GATE: f64 = 6.0;
/// ...or above this grade (%).
const HILLS_GRADE_GATE: f64 = 8.0;

const COLD_TEMP_F: f64 = 50.0;
const HOT_TEMP_F: f64 = 85.0;
const STEEP_GRADE_PERCENT: f64 = 5.0;
const HEAVY_LOAD_LBS: f64 = 500.0;

/// Multiplicative adjustment for one function, clamped to `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Adjustment {
    pub factor: f64,
    pub min: f64,
    pub max: f64,
}

impl Adjustment {
    const fn new(factor: f64, min: f64, max: f64) -> Self {
        Self { factor, min, max }
    }

    /// `clamp(round(base * factor), min, max)`
    pub fn apply(&self, base: f64) -> f64 {
        (base * self.factor).round().clamp(self.min, self.max)
    }
}

/// A named rule bundle.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationStrategy {
    pub strategy: Strategy,
    pub priority: &'static str,
    pub adjustments: BTreeMap<FunctionId, Adjustment>,
    pub constraints: Vec<ConstraintCategory>,
    /// Descriptive only, never enforced
    pub tradeoffs: Vec<&'static str>,
}

fn table(
    speed: Adjustment,
    current: Adjustment,
    accel: Adjustment,
    regen: Adjustment,
    field: Adjustment,
) -> BTreeMap<FunctionId, Adjustment> {
    BTreeMap::from([
        (FunctionId::SPEED_SCALING, speed),
        (FunctionId::MAX_CURRENT, current),
        (FunctionId::ACCEL_RATE, accel),
        (FunctionId::REGEN_CURRENT, regen),
        (FunctionId::FIELD_WEAKENING, field),
    ])
}

impl OptimizationStrategy {
    fn speed() -> Self {
        Self {
            strategy: Strategy::Speed,
            priority: "maximum speed",
            adjustments: table(
                Adjustment::new(1.10, 20.0, 26.0),
                Adjustment::new(1.05, 200.0, 300.0),
                Adjustment::new(1.10, 50.0, 90.0),
                Adjustment::new(0.90, 180.0, 260.0),
                Adjustment::new(1.15, 40.0, 60.0),
            ),
            constraints: vec![
                ConstraintCategory::ThermalLimits,
                ConstraintCategory::MotorLimits,
                ConstraintCategory::LegalSpeed,
            ],
            tradeoffs: vec![
                "Reduced range from higher current draw",
                "Higher motor temperature under sustained load",
                "Less regenerative braking",
            ],
        }
    }

    fn range() -> Self {
        Self {
            strategy: Strategy::Range,
            priority: "maximum range",
            adjustments: table(
                Adjustment::new(0.90, 18.0, 22.0),
                Adjustment::new(0.90, 180.0, 260.0),
                Adjustment::new(0.85, 40.0, 70.0),
                Adjustment::new(1.15, 220.0, 300.0),
                Adjustment::new(0.90, 30.0, 45.0),
            ),
            constraints: vec![
                ConstraintCategory::BatteryProtection,
                ConstraintCategory::Drivability,
            ],
            tradeoffs: vec![
                "Lower top speed",
                "Softer acceleration",
            ],
        }
    }

    fn balanced() -> Self {
        Self {
            strategy: Strategy::Balanced,
            priority: "balanced performance",
            adjustments: table(
                Adjustment::new(1.00, 20.0, 24.0),
                Adjustment::new(1.00, 200.0, 280.0),
                Adjustment::new(1.00, 45.0, 75.0),
                Adjustment::new(1.00, 200.0, 260.0),
                Adjustment::new(1.00, 38.0, 48.0),
            ),
            constraints: ConstraintCategory::ALL.to_vec(),
            tradeoffs: vec!["No single metric is maximized"],
        }
    }

    fn efficiency() -> Self {
        Self {
            strategy: Strategy::Efficiency,
            priority: "energy efficiency",
            adjustments: table(
                Adjustment::new(0.95, 19.0, 23.0),
                Adjustment::new(0.92, 190.0, 260.0),
                Adjustment::new(0.90, 45.0, 65.0),
                Adjustment::new(1.10, 210.0, 280.0),
                Adjustment::new(0.95, 35.0, 45.0),
            ),
            constraints: vec![
                ConstraintCategory::BatteryProtection,
                ConstraintCategory::Drivability,
            ],
            tradeoffs: vec![
                "Slightly lower top speed",
                "Gentler launch from a stop",
            ],
        }
    }

    fn hills() -> Self {
        Self {
            strategy: Strategy::Hills,
            priority: "hill climbing",
            adjustments: table(
                Adjustment::new(0.95, 19.0, 23.0),
                Adjustment::new(1.15, 240.0, 320.0),
                Adjustment::new(1.05, 50.0, 80.0),
                Adjustment::new(1.05, 210.0, 280.0),
                Adjustment::new(1.00, 35.0, 50.0),
            ),
            constraints: vec![
                ConstraintCategory::ThermalLimits,
                ConstraintCategory::MotorLimits,
                ConstraintCategory::BatteryProtection,
            ],
            tradeoffs: vec![
                "Higher current draw on climbs shortens range",
                "Motor and controller run hotter",
            ],
        }
    }
}

/// All strategy tables, read-only after construction.
#[derive(Debug, Clone)]
pub struct RuleSet {
    strategies: Vec<OptimizationStrategy>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleSet {
    pub fn new() -> Self {
        Self {
            strategies: vec![
                OptimizationStrategy::speed(),
                OptimizationStrategy::range(),
                OptimizationStrategy::balanced(),
                OptimizationStrategy::efficiency(),
                OptimizationStrategy::hills(),
            ],
        }
    }

    /// Table for a strategy. Every `Strategy` variant has one.
    pub fn strategy(&self, strategy: Strategy) -> Option<&OptimizationStrategy> {
        self.strategies.iter().find(|s| s.strategy == strategy)
    }

    pub fn strategies(&self) -> &[OptimizationStrategy] {
        &self.strategies
    }

    /// Pick the strategy with the highest score.
    ///
    /// Candidates are scored in the order speed, range, efficiency, balanced,
    /// then hills when eligible. A tie for the top score goes to balanced if
    /// it is among the tied, else to the earliest candidate.
    pub fn select_strategy(
        &self,
        priorities: &Priorities,
        conditions: &EnvironmentalConditions,
    ) -> Strategy {
        let mut scores = vec![
            (Strategy::Speed, priorities.speed),
            (Strategy::Range, priorities.range),
            (Strategy::Efficiency, priorities.efficiency),
            (
                Strategy::Balanced,
                (priorities.speed + priorities.range + priorities.acceleration) / 3.0,
            ),
        ];
        if priorities.hills > HILLS_PRIORITY_GATE || conditions.grade > HILLS_GRADE_GATE {
            scores.push((Strategy::Hills, priorities.hills + 0.5 * conditions.grade));
        }

        let mut best: Option<(Strategy, f64)> = None;
        for &(strategy, score) in scores.iter().filter(|(_, s)| s.is_finite()) {
            best = match best {
                None => Some((strategy, score)),
                Some((_, top)) if score > top => Some((strategy, score)),
                Some((_, top)) if score == top && strategy == Strategy::Balanced => {
                    Some((strategy, score))
                }
                keep => keep,
            };
        }

        let selected = best.map_or(Strategy::Balanced, |(strategy, _)| strategy);
        debug!(strategy = %selected, ?scores, "Strategy selected");
        selected
    }

    /// Apply a strategy's adjustment table, then the environmental overrides.
    ///
    /// Returns the adjusted vector and the overrides that fired, in the order
    /// they were applied.
    pub fn apply_strategy(
        &self,
        strategy: Strategy,
        base: &ControllerSettings,
        profile: &VehicleProfile,
        conditions: &EnvironmentalConditions,
    ) -> (ControllerSettings, Vec<EnvironmentalOverride>) {
        let mut settings = *base;

        if let Some(rules) = self.strategy(strategy) {
            for (&id, adjustment) in &rules.adjustments {
                let current = base[id];
                let base_value = if current.is_finite() && current > 0.0 {
                    current
                } else {
                    profile.default_for(id).unwrap_or(FALLBACK_BASE_VALUE)
                };
                settings[id] = adjustment.apply(base_value);
            }
        }

        let overrides = apply_environmental_overrides(&mut settings, profile, conditions);
        (settings, overrides)
    }
}

/// Layer condition-driven corrections on top of the strategy adjustments.
fn apply_environmental_overrides(
    settings: &mut ControllerSettings,
    profile: &VehicleProfile,
    conditions: &EnvironmentalConditions,
) -> Vec<EnvironmentalOverride> {
    let motor_max = profile.motor.max_current;
    let mut applied = Vec::new();

    let current = FunctionId::MAX_CURRENT;
    let accel = FunctionId::ACCEL_RATE;
    let field = FunctionId::FIELD_WEAKENING;

    if conditions.temperature < COLD_TEMP_F {
        // Cold packs sag; more current compensates, gentler launches protect them.
        settings[current] = (settings[current] * 1.1).max(settings[current] + 20.0).round();
        settings[accel] = (settings[accel] * 0.9).max(30.0).round();
        applied.push(EnvironmentalOverride::ColdWeather);
    }

    if conditions.temperature > HOT_TEMP_F {
        settings[current] = (settings[current] * 0.95).max(motor_max * 0.9).round();
        applied.push(EnvironmentalOverride::HotWeather);
    }

    if conditions.grade > STEEP_GRADE_PERCENT {
        settings[current] = (settings[current] * 1.15).min(motor_max).round();
        settings[field] = (settings[field] * 1.1).min(60.0).round();
        applied.push(EnvironmentalOverride::SteepGrade);
    }

    if conditions.load > HEAVY_LOAD_LBS {
        settings[current] = (settings[current] * 1.1).min(motor_max).round();
        settings[accel] = (settings[accel] * 0.95).max(40.0).round();
        applied.push(EnvironmentalOverride::HeavyLoad);
    }

    if !applied.is_empty() {
        debug!(?applied, "Environmental overrides applied");
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::VehicleRegistry;
    use crate::types::{ConditionsInput, PriorityInput};

    fn priorities(speed: f64, range: f64, accel: f64, eff: f64, hills: f64) -> Priorities {
        Priorities {
            speed,
            range,
            acceleration: accel,
            efficiency: eff,
            hills,
        }
    }

    fn defaults_for(model: &str) -> (VehicleProfile, ControllerSettings) {
        let registry = VehicleRegistry::builtin();
        let profile = registry.get_profile(model).clone();
        let mut base = ControllerSettings::default();
        for (&id, &v) in &profile.default_settings {
            base[id] = v;
        }
        (profile, base)
    }

    #[test]
    fn every_strategy_has_a_table() {
        let rules = RuleSet::new();
        for strategy in Strategy::ALL {
            let table = rules.strategy(strategy).unwrap();
            for id in FunctionId::REQUIRED {
                assert!(table.adjustments.contains_key(&id), "{strategy} missing {id}");
            }
        }
    }

    #[test]
    fn speed_priority_selects_speed() {
        let rules = RuleSet::new();
        let p = priorities(9.0, 2.0, 5.0, 2.0, 0.0);
        let c = EnvironmentalConditions::default();
        assert_eq!(rules.select_strategy(&p, &c), Strategy::Speed);
    }

    #[test]
    fn neutral_priorities_select_balanced() {
        let rules = RuleSet::new();
        let p = Priorities::from(&PriorityInput::default());
        let c = EnvironmentalConditions::from(&ConditionsInput::default());
        assert_eq!(rules.select_strategy(&p, &c), Strategy::Balanced);
    }

    #[test]
    fn tie_without_balanced_goes_to_first_candidate() {
        let rules = RuleSet::new();
        // speed and range tie at 8, balanced is (8 + 8 + 0) / 3
        let p = priorities(8.0, 8.0, 0.0, 1.0, 0.0);
        let c = EnvironmentalConditions::default();
        assert_eq!(rules.select_strategy(&p, &c), Strategy::Speed);
    }

    #[test]
    fn hills_requires_gate() {
        let rules = RuleSet::new();
        let c = EnvironmentalConditions::default();
        // hills 6 is not above the gate; the neutral tie goes to balanced
        let p = priorities(5.0, 5.0, 5.0, 5.0, 6.0);
        assert_eq!(rules.select_strategy(&p, &c), Strategy::Balanced);

        let p = priorities(5.0, 5.0, 5.0, 5.0, 7.0);
        assert_eq!(rules.select_strategy(&p, &c), Strategy::Hills);
    }

    #[test]
    fn steep_grade_makes_hills_eligible() {
        let rules = RuleSet::new();
        let p = priorities(5.0, 5.0, 5.0, 5.0, 0.0);
        let c = EnvironmentalConditions {
            grade: 12.0,
            ..EnvironmentalConditions::default()
        };
        // hills score = 0 + 6 = 6 > 5
        assert_eq!(rules.select_strategy(&p, &c), Strategy::Hills);
    }

    #[test]
    fn adjustment_rounds_then_clamps() {
        let adj = Adjustment::new(1.1, 20.0, 26.0);
        assert_eq!(adj.apply(22.0), 24.0);
        assert_eq!(adj.apply(30.0), 26.0);
        assert_eq!(adj.apply(5.0), 20.0);
    }

    #[test]
    fn balanced_keeps_e4_defaults() {
        let rules = RuleSet::new();
        let (profile, base) = defaults_for("e4");
        let (settings, overrides) = rules.apply_strategy(
            Strategy::Balanced,
            &base,
            &profile,
            &EnvironmentalConditions::default(),
        );
        assert!(overrides.is_empty());
        assert_eq!(settings, base);
    }

    #[test]
    fn missing_base_uses_profile_default() {
        let rules = RuleSet::new();
        let (profile, _) = defaults_for("e2");
        let empty = ControllerSettings::default();
        let (settings, _) = rules.apply_strategy(
            Strategy::Balanced,
            &empty,
            &profile,
            &EnvironmentalConditions::default(),
        );
        assert_eq!(settings[FunctionId::MAX_CURRENT], 245.0);
        assert_eq!(settings[FunctionId::SPEED_SCALING], 22.0);
        // untuned functions stay as given
        assert_eq!(settings.get(FunctionId::new(2).unwrap()), 0.0);
    }

    #[test]
    fn cold_weather_adds_at_least_twenty_amps() {
        let rules = RuleSet::new();
        let (profile, base) = defaults_for("e2");
        let warm = EnvironmentalConditions::default();
        let cold = EnvironmentalConditions {
            temperature: 30.0,
            ..warm
        };
        let (warm_settings, _) = rules.apply_strategy(Strategy::Range, &base, &profile, &warm);
        let (cold_settings, overrides) =
            rules.apply_strategy(Strategy::Range, &base, &profile, &cold);

        assert_eq!(overrides, vec![EnvironmentalOverride::ColdWeather]);
        assert!(
            cold_settings[FunctionId::MAX_CURRENT] >= warm_settings[FunctionId::MAX_CURRENT] + 20.0
        );
        assert!(cold_settings[FunctionId::ACCEL_RATE] < warm_settings[FunctionId::ACCEL_RATE]);
        assert!(cold_settings[FunctionId::ACCEL_RATE] >= 30.0);
    }

    #[test]
    fn steep_grade_caps_current_at_motor_max() {
        let rules = RuleSet::new();
        let (profile, base) = defaults_for("e2");
        let steep = EnvironmentalConditions {
            grade: 15.0,
            load: 800.0,
            ..EnvironmentalConditions::default()
        };
        let (settings, overrides) = rules.apply_strategy(Strategy::Hills, &base, &profile, &steep);
        assert_eq!(
            overrides,
            vec![EnvironmentalOverride::SteepGrade, EnvironmentalOverride::HeavyLoad]
        );
        assert!(settings[FunctionId::MAX_CURRENT] <= profile.motor.max_current);
        assert!(settings[FunctionId::FIELD_WEAKENING] <= 60.0);
        assert!(settings[FunctionId::ACCEL_RATE] >= 40.0);
    }

    #[test]
    fn hot_weather_floors_current_at_ninety_percent_of_motor() {
        let rules = RuleSet::new();
        let (profile, base) = defaults_for("e4");
        let hot = EnvironmentalConditions {
            temperature: 95.0,
            ..EnvironmentalConditions::default()
        };
        let (settings, overrides) = rules.apply_strategy(Strategy::Balanced, &base, &profile, &hot);
        assert_eq!(overrides, vec![EnvironmentalOverride::HotWeather]);
        assert_eq!(settings[FunctionId::MAX_CURRENT], (profile.motor.max_current * 0.9).round());
    }
}
