//! Template-based recommendation text for optimization results

use crate::types::{
    ControllerSettings, Correction, EnvironmentalConditions, EnvironmentalOverride, FunctionId,
    PerformancePrediction, Strategy, VehicleProfile,
};

/// Predicted range below which the speed strategy warns (miles).
const LOW_RANGE_MILES: f64 = 20.0;
/// Predicted 0-20 mph time above which a faster launch is suggested (s).
const SLOW_ACCEL_SECONDS: f64 = 10.0;
const HIGH_CURRENT_RATIO: f64 = 0.9;
const HIGH_FIELD_WEAKENING: f64 = 50.0;

/// Everything the templates read.
pub struct RecommendationContext<'a> {
    pub strategy: Strategy,
    pub settings: &'a ControllerSettings,
    pub profile: &'a VehicleProfile,
    pub conditions: &'a EnvironmentalConditions,
    pub performance: &'a PerformancePrediction,
    pub overrides: &'a [EnvironmentalOverride],
    pub corrections: &'a [Correction],
}

/// Build the ordered recommendation list: strategy-specific advice first,
/// then checks that apply to every strategy.
pub fn generate_recommendations(ctx: &RecommendationContext<'_>) -> Vec<String> {
    let mut out = strategy_recommendations(ctx);
    out.extend(universal_recommendations(ctx));
    out
}

fn strategy_recommendations(ctx: &RecommendationContext<'_>) -> Vec<String> {
    let perf = ctx.performance;
    let mut out = Vec::new();
    match ctx.strategy {
        Strategy::Speed => {
            out.push(
                "Speed-focused settings applied. Monitor motor temperature during sustained high-speed driving."
                    .to_string(),
            );
            if perf.range < LOW_RANGE_MILES {
                out.push(format!(
                    "Predicted range drops to {:.0} miles with these settings. Plan charging stops accordingly.",
                    perf.range
                ));
            }
        }
        Strategy::Range => {
            out.push(format!(
                "Range-focused settings applied. Expect about {:.0} miles per charge with smooth acceleration and early braking.",
                perf.range
            ));
        }
        Strategy::Efficiency => {
            out.push(format!(
                "Efficiency-focused settings applied (predicted drive efficiency {:.0}%). Keep tires at recommended pressure to preserve the gain.",
                perf.efficiency
            ));
        }
        Strategy::Hills => {
            out.push(
                "Hill-climbing settings applied. Watch controller and motor temperature on long climbs and allow cool-down between them."
                    .to_string(),
            );
        }
        Strategy::Balanced => {
            out.push(format!(
                "Balanced settings applied: about {:.0} mph top speed and {:.0} miles of range.",
                perf.speed, perf.range
            ));
        }
    }
    out
}

fn universal_recommendations(ctx: &RecommendationContext<'_>) -> Vec<String> {
    let settings = ctx.settings;
    let mut out = Vec::new();

    if ctx.performance.acceleration > SLOW_ACCEL_SECONDS {
        out.push(format!(
            "Acceleration is slow ({:.1}s to 20 mph). Consider raising {} (acceleration rate) if the batteries are in good condition.",
            ctx.performance.acceleration,
            FunctionId::ACCEL_RATE
        ));
    }

    let current = settings[FunctionId::MAX_CURRENT];
    if current > ctx.profile.motor.max_current * HIGH_CURRENT_RATIO {
        out.push(format!(
            "{} (max current) is above 90% of the motor rating. Ensure adequate motor and controller cooling.",
            FunctionId::MAX_CURRENT
        ));
    }

    if settings[FunctionId::FIELD_WEAKENING] > HIGH_FIELD_WEAKENING {
        out.push(format!(
            "{} (field weakening) above 50 raises motor overheating risk at top speed.",
            FunctionId::FIELD_WEAKENING
        ));
    }

    if ctx.overrides.contains(&EnvironmentalOverride::ColdWeather) {
        out.push(
            "Cold weather reduces battery capacity. Charge indoors when possible and let the pack warm before long trips."
                .to_string(),
        );
    }

    if ctx.conditions.surface.is_loose() {
        out.push(format!(
            "Loose or slippery surface ({}): apply throttle gradually to limit wheel spin.",
            ctx.conditions.surface
        ));
    }

    if !ctx.corrections.is_empty() {
        let mut functions: Vec<FunctionId> = ctx.corrections.iter().map(|c| c.function).collect();
        functions.sort_unstable();
        functions.dedup();
        let names: Vec<String> = functions.iter().map(ToString::to_string).collect();
        out.push(format!(
            "{} setting(s) were adjusted to stay within safety limits: {}.",
            functions.len(),
            names.join(", ")
        ));
    }

    out
}

/// Recommendation text for the emergency path.
pub fn emergency_recommendations(reason: &str) -> Vec<String> {
    vec![
        "Emergency default settings were applied because optimization could not complete.".to_string(),
        format!("Reason: {reason}"),
        "Verify the vehicle model and settings, then run the optimization again.".to_string(),
    ]
}
