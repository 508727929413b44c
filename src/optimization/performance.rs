//! Performance Prediction Models
//!
//! Four independent estimators over (settings, profile, conditions). Each is a
//! pure function; missing settings fall back to the profile default. A model
//! that cannot produce a finite number reports a `PredictionError` and the
//! caller substitutes the metric's fallback value.

use thiserror::Error;
use tracing::warn;

use crate::types::{
    ControllerSettings, EnvironmentalConditions, FunctionId, PerformancePrediction, VehicleProfile,
};

/// Reference speed scaling the models are calibrated around.
const REFERENCE_SPEED_SCALING: f64 = 22.0;
/// Neutral field weakening setting.
const REFERENCE_FIELD_WEAKENING: f64 = 43.0;
/// Neutral max current setting (A).
const REFERENCE_CURRENT: f64 = 245.0;
/// Consumption at the reference settings (Wh/mile).
const BASE_CONSUMPTION_WH_PER_MILE: f64 = 150.0;
/// Usable share of nameplate pack energy.
const USABLE_CAPACITY: f64 = 0.8;
/// 0-20 mph time at the reference settings (s).
const BASE_ACCEL_SECONDS: f64 = 8.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error("no value or profile default for {0}")]
    MissingSetting(FunctionId),

    #[error("{model} model produced a non-finite value")]
    NonFinite { model: &'static str },

    #[error("non-positive energy consumption ({0:.1} Wh/mile)")]
    NonPositiveConsumption(f64),
}

/// Setting value, or the profile default when the entry is unset.
fn setting(
    settings: &ControllerSettings,
    profile: &VehicleProfile,
    id: FunctionId,
) -> Result<f64, PredictionError> {
    let value = settings[id];
    if value.is_finite() && value > 0.0 {
        return Ok(value);
    }
    profile
        .default_for(id)
        .ok_or(PredictionError::MissingSetting(id))
}

fn finite(model: &'static str, value: f64) -> Result<f64, PredictionError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PredictionError::NonFinite { model })
    }
}

/// Top speed estimate (mph), clamped to [10, 25].
pub fn predict_speed(
    settings: &ControllerSettings,
    profile: &VehicleProfile,
    conditions: &EnvironmentalConditions,
) -> Result<f64, PredictionError> {
    let scaling = setting(settings, profile, FunctionId::SPEED_SCALING)?;
    let field = setting(settings, profile, FunctionId::FIELD_WEAKENING)?;

    let mut speed = scaling * (1.0 + (field - REFERENCE_FIELD_WEAKENING) * 0.01);
    if conditions.temperature < 40.0 {
        speed *= 0.95;
    }
    if conditions.wind_speed > 15.0 {
        speed *= 0.92;
    }
    if conditions.grade > 5.0 {
        speed *= 1.0 - conditions.grade * 0.02;
    }
    speed *= 1.0 - conditions.load * 0.0002;

    Ok(finite("speed", speed)?.clamp(10.0, 25.0))
}

/// Range estimate (miles), floored at 8.
pub fn predict_range(
    settings: &ControllerSettings,
    profile: &VehicleProfile,
    conditions: &EnvironmentalConditions,
) -> Result<f64, PredictionError> {
    let current = setting(settings, profile, FunctionId::MAX_CURRENT)?;
    let scaling = setting(settings, profile, FunctionId::SPEED_SCALING)?;
    let regen = setting(settings, profile, FunctionId::REGEN_CURRENT)?;

    let mut consumption = BASE_CONSUMPTION_WH_PER_MILE
        + (current - REFERENCE_CURRENT) * 0.8
        + (scaling - REFERENCE_SPEED_SCALING) * 5.0;

    if conditions.temperature < 50.0 {
        consumption *= 1.15;
    }
    if conditions.temperature > 85.0 {
        consumption *= 1.1;
    }
    if conditions.wind_speed > 10.0 {
        consumption *= 1.0 + conditions.wind_speed * 0.01;
    }
    if conditions.grade > 0.0 {
        consumption *= 1.0 + conditions.grade * 0.02;
    }

    let regen_recovery = ((regen - 200.0) * 0.001).min(0.3);
    consumption *= 1.0 - regen_recovery;

    let consumption = finite("range", consumption)?;
    if consumption <= 0.0 {
        return Err(PredictionError::NonPositiveConsumption(consumption));
    }

    let pack_wh = profile.battery.capacity_ah * profile.battery.nominal_voltage * USABLE_CAPACITY;
    Ok(finite("range", pack_wh / consumption)?.max(8.0))
}

/// Drive efficiency (%), clamped to [50, 95].
pub fn predict_efficiency(
    settings: &ControllerSettings,
    profile: &VehicleProfile,
    conditions: &EnvironmentalConditions,
) -> Result<f64, PredictionError> {
    let current = setting(settings, profile, FunctionId::MAX_CURRENT)?;
    let scaling = setting(settings, profile, FunctionId::SPEED_SCALING)?;
    let accel = setting(settings, profile, FunctionId::ACCEL_RATE)?;

    let mut efficiency = profile.motor.efficiency;

    let current_ratio = current / profile.motor.max_current;
    if current_ratio > 0.9 {
        efficiency *= 0.95;
    } else if current_ratio < 0.6 {
        efficiency *= 0.92;
    }

    let speed_ratio = scaling / REFERENCE_SPEED_SCALING;
    efficiency *= 1.0 - speed_ratio.powi(2) * 0.1;
    efficiency *= 1.0 - (accel - 60.0).abs() / 30.0 * 0.05;

    if !(60.0..=80.0).contains(&conditions.temperature) {
        efficiency *= 0.95;
    }

    Ok(finite("efficiency", efficiency)?.clamp(0.5, 0.95) * 100.0)
}

/// 0-20 mph time (s), clamped to [4, 15].
pub fn predict_acceleration(
    settings: &ControllerSettings,
    profile: &VehicleProfile,
    conditions: &EnvironmentalConditions,
) -> Result<f64, PredictionError> {
    let current = setting(settings, profile, FunctionId::MAX_CURRENT)?;
    let accel = setting(settings, profile, FunctionId::ACCEL_RATE)?;

    let current_ratio = current / profile.motor.max_current;
    let curb = profile.weight.curb_lbs;

    let mut seconds = BASE_ACCEL_SECONDS / current_ratio.sqrt() / (accel / 100.0);
    seconds *= ((curb + conditions.load) / curb).sqrt();
    if conditions.grade > 0.0 {
        seconds *= 1.0 + conditions.grade * 0.1;
    }
    if conditions.temperature < 40.0 {
        seconds *= 1.1;
    }

    Ok(finite("acceleration", seconds)?.clamp(4.0, 15.0))
}

/// Run all four models, substituting the per-metric fallback on error.
pub fn predict_all(
    settings: &ControllerSettings,
    profile: &VehicleProfile,
    conditions: &EnvironmentalConditions,
) -> PerformancePrediction {
    let fallback = PerformancePrediction::FALLBACK;
    PerformancePrediction {
        speed: or_fallback("speed", predict_speed(settings, profile, conditions), fallback.speed),
        range: or_fallback("range", predict_range(settings, profile, conditions), fallback.range),
        efficiency: or_fallback(
            "efficiency",
            predict_efficiency(settings, profile, conditions),
            fallback.efficiency,
        ),
        acceleration: or_fallback(
            "acceleration",
            predict_acceleration(settings, profile, conditions),
            fallback.acceleration,
        ),
    }
}

fn or_fallback(metric: &'static str, result: Result<f64, PredictionError>, fallback: f64) -> f64 {
    result.unwrap_or_else(|e| {
        warn!(metric, error = %e, fallback, "Performance model failed, using fallback value");
        fallback
    })
}
