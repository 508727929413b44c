//! Vehicle archetype data: motor, battery, drivetrain, weight and default settings

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use super::settings::FunctionId;

/// Traction motor limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorSpec {
    /// Motor construction, e.g. "shunt" or "series"
    #[serde(rename = "type")]
    pub motor_type: String,
    /// Maximum armature current (A)
    pub max_current: f64,
    /// Nominal voltage (V)
    pub nominal_voltage: f64,
    pub max_rpm: f64,
    /// Peak efficiency (0-1)
    pub efficiency: f64,
}

/// Traction battery pack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatterySpec {
    /// Pack voltage (V)
    pub nominal_voltage: f64,
    /// Capacity (Ah)
    pub capacity_ah: f64,
    pub chemistry: String,
    /// Maximum charge rate (A), bounds regenerative current
    pub max_charge_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrivetrainSpec {
    pub gear_ratio: f64,
    /// Wheel diameter (inches)
    pub wheel_diameter: f64,
    /// Rated top speed (mph)
    pub max_speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSpec {
    pub curb_lbs: f64,
    pub max_gvw_lbs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AeroSpec {
    pub drag_coefficient: f64,
    /// Frontal area (m^2)
    pub frontal_area: f64,
}

/// A named vehicle archetype. Constructed once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleProfile {
    /// Registry key, e.g. "e4"
    pub model: String,
    /// Display name
    pub name: String,
    pub motor: MotorSpec,
    pub battery: BatterySpec,
    pub drivetrain: DrivetrainSpec,
    pub weight: WeightSpec,
    pub aerodynamics: AeroSpec,
    /// Sparse factory defaults keyed by function number
    pub default_settings: BTreeMap<FunctionId, f64>,
}

/// Why a vehicle profile cannot be used by the optimizer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    #[error("profile '{model}' has no default for {function}")]
    MissingDefault { model: String, function: FunctionId },

    #[error("profile '{model}': {field} must be positive and finite (got {value})")]
    NonPositive {
        model: String,
        field: &'static str,
        value: f64,
    },

    #[error("profile '{model}': motor efficiency {value} outside (0, 1]")]
    EfficiencyOutOfRange { model: String, value: f64 },

    #[error("profile '{model}': default for {function} is not finite")]
    NonFiniteDefault { model: String, function: FunctionId },
}

impl VehicleProfile {
    /// Factory default for a function, if the profile defines one.
    pub fn default_for(&self, id: FunctionId) -> Option<f64> {
        self.default_settings.get(&id).copied()
    }

    /// Check the invariants the rules and models rely on.
    pub fn validate(&self) -> Result<(), ProfileError> {
        for id in FunctionId::REQUIRED {
            if !self.default_settings.contains_key(&id) {
                return Err(ProfileError::MissingDefault {
                    model: self.model.clone(),
                    function: id,
                });
            }
        }
        for (&function, value) in &self.default_settings {
            if !value.is_finite() {
                return Err(ProfileError::NonFiniteDefault {
                    model: self.model.clone(),
                    function,
                });
            }
        }

        let positive_fields = [
            ("motor.max_current", self.motor.max_current),
            ("battery.nominal_voltage", self.battery.nominal_voltage),
            ("battery.capacity_ah", self.battery.capacity_ah),
            ("battery.max_charge_rate", self.battery.max_charge_rate),
            ("weight.curb_lbs", self.weight.curb_lbs),
        ];
        for (field, value) in positive_fields {
            if !(value.is_finite() && value > 0.0) {
                return Err(ProfileError::NonPositive {
                    model: self.model.clone(),
                    field,
                    value,
                });
            }
        }

        let eff = self.motor.efficiency;
        if !(eff.is_finite() && eff > 0.0 && eff <= 1.0) {
            return Err(ProfileError::EfficiencyOutOfRange {
                model: self.model.clone(),
                value: eff,
            });
        }
        Ok(())
    }
}
