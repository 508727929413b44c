//! Optimizer Scenario Tests
//!
//! End-to-end properties of `RuleBasedOptimizer::optimize`: determinism, the
//! safety invariant over a seeded input sweep, prediction bounds, and the
//! reference scenarios for strategy selection, cold weather, unknown vehicles
//! and the emergency path.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use gem_advisor::optimization::{
    emergency_settings, ConstraintSet, RuleBasedOptimizer, RuleSet, EMERGENCY_CONFIDENCE,
};
use gem_advisor::registry::VehicleRegistry;
use gem_advisor::types::{
    ConditionsInput, EnvironmentalConditions, FunctionId, OptimizationMethod,
    OptimizationRequest, OptimizationResult, PerformancePrediction, Priorities, PriorityInput,
    Strategy, VehicleData,
};

const MODELS: [&str; 5] = ["e2", "e4", "e6", "el-xd", "elss"];

fn request(model: &str, priorities: PriorityInput, conditions: ConditionsInput) -> OptimizationRequest {
    OptimizationRequest {
        vehicle_data: VehicleData::model(model),
        priorities,
        current_settings: Vec::new(),
        conditions,
    }
}

fn assert_safe(result: &OptimizationResult, registry: &VehicleRegistry) {
    let profile = registry.get_profile(&result.vehicle_model);
    let s = &result.optimized_settings;
    let violations = ConstraintSet::default().violations(s, profile);
    assert!(violations.is_empty(), "{}: violated {violations:?}", result.vehicle_model);

    assert!(s[FunctionId::MAX_CURRENT] <= profile.motor.max_current);
    assert!((25.0..=60.0).contains(&s[FunctionId::FIELD_WEAKENING]));
    assert!(s[FunctionId::SPEED_SCALING] * 1.2 <= 25.0);
    assert!(s[FunctionId::REGEN_CURRENT] <= profile.battery.max_charge_rate * 10.0);
    assert!(s[FunctionId::ACCEL_RATE] >= 30.0);
    assert!(s[FunctionId::SPEED_SCALING] >= 18.0);
}

fn assert_bounded(p: &PerformancePrediction) {
    assert!((10.0..=25.0).contains(&p.speed), "speed {}", p.speed);
    assert!(p.range >= 8.0, "range {}", p.range);
    assert!((50.0..=95.0).contains(&p.efficiency), "efficiency {}", p.efficiency);
    assert!((4.0..=15.0).contains(&p.acceleration), "acceleration {}", p.acceleration);
}

fn maybe(rng: &mut StdRng, lo: f64, hi: f64) -> Option<f64> {
    rng.gen_bool(0.8).then(|| rng.gen_range(lo..hi))
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn identical_inputs_yield_identical_settings() {
    let optimizer = RuleBasedOptimizer::builtin();
    let mut req = request(
        "e6",
        PriorityInput {
            hills: Some(9.0),
            ..PriorityInput::default()
        },
        ConditionsInput {
            grade: Some(12.0),
            load: Some(600.0),
            ..ConditionsInput::default()
        },
    );
    req.current_settings = vec![Some(23.0), None, None, Some(300.0)];

    let a = optimizer.optimize(&req);
    let b = optimizer.optimize(&req);
    assert_eq!(a.optimized_settings, b.optimized_settings);
    assert_eq!(a, b);
}

#[test]
fn seeded_sweep_keeps_every_result_safe_and_bounded() {
    let optimizer = RuleBasedOptimizer::builtin();
    let registry = VehicleRegistry::builtin();
    let mut rng = StdRng::seed_from_u64(0x6e4d);
    let surfaces = ["paved", "gravel", "grass", "sand", "wet", "ice"];

    for i in 0..400 {
        let model = MODELS[i % MODELS.len()];
        let priorities = PriorityInput {
            speed: maybe(&mut rng, -5.0, 15.0),
            range: maybe(&mut rng, -5.0, 15.0),
            acceleration: maybe(&mut rng, -5.0, 15.0),
            efficiency: maybe(&mut rng, -5.0, 15.0),
            hills: maybe(&mut rng, -5.0, 15.0),
        };
        let conditions = ConditionsInput {
            temperature: maybe(&mut rng, -60.0, 150.0),
            wind_speed: maybe(&mut rng, -10.0, 120.0),
            grade: maybe(&mut rng, -40.0, 40.0),
            load: maybe(&mut rng, -100.0, 2500.0),
            surface: Some(surfaces[rng.gen_range(0..surfaces.len())].to_string()),
            humidity: maybe(&mut rng, -10.0, 110.0),
        };
        let mut req = request(model, priorities, conditions);
        req.current_settings = (0..rng.gen_range(0..30))
            .map(|_| maybe(&mut rng, -100.0, 600.0))
            .collect();

        let result = optimizer.optimize(&req);
        assert!(result.success, "sweep {i} ({model}) fell back: {:?}", result.recommendations);
        assert_eq!(result.vehicle_model, model);
        assert_safe(&result, &registry);
        assert_bounded(&result.performance);
        assert!(result.confidence > 0.0 && result.confidence <= 0.95);
    }
}

#[test]
fn every_strategy_is_safe_on_every_profile() {
    let optimizer = RuleBasedOptimizer::builtin();
    let registry = VehicleRegistry::builtin();
    let rules = RuleSet::new();
    let conditions = EnvironmentalConditions::default();

    for model in MODELS {
        let profile = registry.get_profile(model);
        let mut base = gem_advisor::types::ControllerSettings::default();
        for (&id, &value) in &profile.default_settings {
            base[id] = value;
        }
        for strategy in Strategy::ALL {
            let (mut settings, _) = rules.apply_strategy(strategy, &base, profile, &conditions);
            optimizer
                .constraints()
                .validate(&mut settings, profile)
                .expect("built-in constraints always resolve");
            assert!(optimizer.constraints().violations(&settings, profile).is_empty());
        }
    }
}

#[test]
fn garbage_input_never_fails() {
    let optimizer = RuleBasedOptimizer::builtin();
    let json = r#"{
        "vehicleData": { "model": "   " },
        "priorities": { "speed": -40, "range": 1e9 },
        "currentSettings": [-1, 0, 1e12, null, -300],
        "conditions": { "temperature": -400, "surface": "lava", "load": -5 }
    }"#;
    let req: OptimizationRequest = serde_json::from_str(json).expect("lenient request");
    let result = optimizer.optimize(&req);
    assert!(result.success);
    assert_eq!(result.vehicle_model, "e4");
    assert!(!result.exact_match);
    assert_safe(&result, &VehicleRegistry::builtin());
}

// ============================================================================
// Reference scenarios
// ============================================================================

#[test]
fn speed_priorities_select_speed() {
    let rules = RuleSet::new();
    let priorities = Priorities {
        speed: 9.0,
        range: 2.0,
        acceleration: 5.0,
        efficiency: 2.0,
        hills: 0.0,
    };
    let conditions = EnvironmentalConditions {
        grade: 0.0,
        ..EnvironmentalConditions::default()
    };
    assert_eq!(rules.select_strategy(&priorities, &conditions), Strategy::Speed);
}

#[test]
fn e4_defaults_are_balanced() {
    let optimizer = RuleBasedOptimizer::builtin();
    let result = optimizer.optimize(&OptimizationRequest::for_model("e4"));
    assert!(result.success);
    assert_eq!(result.strategy, Some(Strategy::Balanced));
    let f1 = result.optimized_settings[FunctionId::SPEED_SCALING];
    assert!((20.0..=26.0).contains(&f1), "F.1 = {f1}");
    assert!(result.confidence >= 0.8);
}

#[test]
fn cold_weather_raises_current() {
    let optimizer = RuleBasedOptimizer::builtin();
    let at = |temperature: f64| {
        optimizer.optimize(&request(
            "e2",
            PriorityInput {
                range: Some(8.0),
                ..PriorityInput::default()
            },
            ConditionsInput {
                temperature: Some(temperature),
                ..ConditionsInput::default()
            },
        ))
    };
    let cold = at(30.0);
    let mild = at(70.0);
    assert_eq!(cold.strategy, Some(Strategy::Range));
    assert!(
        cold.optimized_settings[FunctionId::MAX_CURRENT]
            >= mild.optimized_settings[FunctionId::MAX_CURRENT] + 20.0,
        "cold {} vs mild {}",
        cold.optimized_settings[FunctionId::MAX_CURRENT],
        mild.optimized_settings[FunctionId::MAX_CURRENT]
    );
}

#[test]
fn unknown_vehicle_uses_fallback_with_lower_confidence() {
    let optimizer = RuleBasedOptimizer::builtin();
    let unknown = optimizer.optimize(&OptimizationRequest::for_model("zzz-unknown"));
    let e4 = optimizer.optimize(&OptimizationRequest::for_model("e4"));

    assert!(unknown.success);
    assert_eq!(unknown.vehicle_model, "e4");
    assert!(!unknown.exact_match);
    assert!(unknown.confidence <= e4.confidence);
    assert_eq!(unknown.optimized_settings, e4.optimized_settings);
}

#[test]
fn malformed_profile_returns_emergency_settings() {
    let mut registry = VehicleRegistry::builtin();
    let mut broken = registry.get_profile("e2").clone();
    broken.model = "e2-broken".into();
    broken.battery.capacity_ah = 0.0;
    registry.insert(broken);

    let optimizer = RuleBasedOptimizer::new(registry, RuleSet::new(), ConstraintSet::default());
    let result = optimizer.optimize(&OptimizationRequest::for_model("e2-broken"));

    assert!(!result.success);
    assert_eq!(result.method, OptimizationMethod::EmergencyFallback);
    assert_eq!(result.strategy, None);
    assert_eq!(result.confidence, EMERGENCY_CONFIDENCE);
    assert_eq!(result.optimized_settings, emergency_settings());
    assert_eq!(result.performance, PerformancePrediction::FALLBACK);
    assert!(result
        .recommendations
        .iter()
        .any(|r| r.contains("battery.capacity_ah")));

    // Other models on the same optimizer are unaffected
    assert!(optimizer.optimize(&OptimizationRequest::for_model("e2")).success);
}

#[test]
fn results_report_changes_and_tradeoffs() {
    let optimizer = RuleBasedOptimizer::builtin();
    let result = optimizer.optimize(&request(
        "el-xd",
        PriorityInput {
            efficiency: Some(10.0),
            ..PriorityInput::default()
        },
        ConditionsInput::default(),
    ));
    assert_eq!(result.strategy, Some(Strategy::Efficiency));
    assert!(!result.tradeoffs.is_empty());
    for change in &result.changes {
        assert_ne!(change.before, change.after);
        assert_eq!(result.optimized_settings[change.function], change.after);
    }
}
