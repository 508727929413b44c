//! Optimization request records and their per-call normalization
//!
//! Callers send loosely-filled records (every field optional). Normalization
//! clamps each value to its documented range and fills gaps with neutral
//! defaults; it never rejects input.

use serde::{Deserialize, Serialize};
use tracing::warn;

// ============================================================================
// Vehicle data
// ============================================================================

/// Vehicle description supplied by the configuration form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleData {
    /// Model identifier, e.g. "e4" or "GEM eL XD"
    #[serde(default)]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motor_type: Option<String>,
    /// Battery capacity reported by the owner (Ah)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_capacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl VehicleData {
    pub fn model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }
}

// ============================================================================
// Priorities
// ============================================================================

/// Neutral priority for unspecified sliders.
pub const NEUTRAL_PRIORITY: f64 = 5.0;
/// Upper bound of every priority slider.
pub const MAX_PRIORITY: f64 = 10.0;

/// Raw slider values, each expected on [0, 10].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceleration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub efficiency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hills: Option<f64>,
}

/// Normalized priorities, every value on [0, 10].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Priorities {
    pub speed: f64,
    pub range: f64,
    pub acceleration: f64,
    pub efficiency: f64,
    pub hills: f64,
}

impl Default for Priorities {
    fn default() -> Self {
        Self {
            speed: NEUTRAL_PRIORITY,
            range: NEUTRAL_PRIORITY,
            acceleration: NEUTRAL_PRIORITY,
            efficiency: NEUTRAL_PRIORITY,
            hills: 0.0,
        }
    }
}

impl Priorities {
    /// The five values in a fixed order: speed, range, acceleration, efficiency, hills.
    pub fn values(&self) -> [f64; 5] {
        [
            self.speed,
            self.range,
            self.acceleration,
            self.efficiency,
            self.hills,
        ]
    }
}

impl From<&PriorityInput> for Priorities {
    fn from(input: &PriorityInput) -> Self {
        let d = Self::default();
        Self {
            speed: clamp_or(input.speed, d.speed, 0.0, MAX_PRIORITY, "priorities.speed"),
            range: clamp_or(input.range, d.range, 0.0, MAX_PRIORITY, "priorities.range"),
            acceleration: clamp_or(
                input.acceleration,
                d.acceleration,
                0.0,
                MAX_PRIORITY,
                "priorities.acceleration",
            ),
            efficiency: clamp_or(
                input.efficiency,
                d.efficiency,
                0.0,
                MAX_PRIORITY,
                "priorities.efficiency",
            ),
            hills: clamp_or(input.hills, d.hills, 0.0, MAX_PRIORITY, "priorities.hills"),
        }
    }
}

// ============================================================================
// Environmental conditions
// ============================================================================

/// Road surface the vehicle mostly drives on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    #[default]
    Paved,
    Gravel,
    Grass,
    Sand,
    Wet,
}

impl Surface {
    /// Loose surfaces reduce traction under hard acceleration.
    pub fn is_loose(self) -> bool {
        matches!(self, Self::Gravel | Self::Grass | Self::Sand | Self::Wet)
    }

    /// Parse a surface name, falling back to paved for anything unrecognized.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "paved" | "asphalt" | "concrete" => Self::Paved,
            "gravel" | "dirt" => Self::Gravel,
            "grass" | "turf" => Self::Grass,
            "sand" => Self::Sand,
            "wet" | "rain" => Self::Wet,
            other => {
                warn!(surface = %other, "Unknown surface, assuming paved");
                Self::Paved
            }
        }
    }
}

impl std::fmt::Display for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Paved => write!(f, "paved"),
            Self::Gravel => write!(f, "gravel"),
            Self::Grass => write!(f, "grass"),
            Self::Sand => write!(f, "sand"),
            Self::Wet => write!(f, "wet"),
        }
    }
}

/// Raw conditions from the weather/terrain collaborators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionsInput {
    /// Ambient temperature (F)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Wind speed (mph)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    /// Road grade (%)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<f64>,
    /// Cargo and passenger load (lbs)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface: Option<String>,
    /// Relative humidity (%)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
}

/// Normalized environmental conditions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentalConditions {
    pub temperature: f64,
    pub wind_speed: f64,
    pub grade: f64,
    pub load: f64,
    pub surface: Surface,
    pub humidity: f64,
}

impl Default for EnvironmentalConditions {
    fn default() -> Self {
        Self {
            temperature: 70.0,
            wind_speed: 0.0,
            grade: 0.0,
            load: 0.0,
            surface: Surface::Paved,
            humidity: 50.0,
        }
    }
}

impl From<&ConditionsInput> for EnvironmentalConditions {
    fn from(input: &ConditionsInput) -> Self {
        let d = Self::default();
        Self {
            temperature: clamp_or(input.temperature, d.temperature, -40.0, 130.0, "conditions.temperature"),
            wind_speed: clamp_or(input.wind_speed, d.wind_speed, 0.0, 100.0, "conditions.windSpeed"),
            grade: clamp_or(input.grade, d.grade, -30.0, 30.0, "conditions.grade"),
            load: clamp_or(input.load, d.load, 0.0, 2000.0, "conditions.load"),
            surface: input
                .surface
                .as_deref()
                .map_or(d.surface, Surface::parse_lenient),
            humidity: clamp_or(input.humidity, d.humidity, 0.0, 100.0, "conditions.humidity"),
        }
    }
}

// ============================================================================
// Full request
// ============================================================================

/// One call to the optimizer, as received from a host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationRequest {
    #[serde(default)]
    pub vehicle_data: VehicleData,
    #[serde(default)]
    pub priorities: PriorityInput,
    /// Up to 25 values aligned to F.1..F.25; `null` marks an unknown entry
    #[serde(default)]
    pub current_settings: Vec<Option<f64>>,
    #[serde(default)]
    pub conditions: ConditionsInput,
}

impl OptimizationRequest {
    pub fn for_model(model: impl Into<String>) -> Self {
        Self {
            vehicle_data: VehicleData::model(model),
            ..Self::default()
        }
    }
}

/// Clamp a present value into `[min, max]`, substituting `default` for
/// missing or non-finite input.
fn clamp_or(value: Option<f64>, default: f64, min: f64, max: f64, field: &str) -> f64 {
    match value {
        None => default,
        Some(v) if !v.is_finite() => {
            warn!(field, value = v, default, "Non-finite input replaced with default");
            default
        }
        Some(v) if v < min || v > max => {
            let clamped = v.clamp(min, max);
            warn!(field, value = v, clamped, "Input outside range, clamped");
            clamped
        }
        Some(v) => v,
    }
}
