//! Optimization engine types: strategies, constraint categories, corrections
//! and the result record handed back to hosts

use serde::{Deserialize, Serialize};

use super::settings::{ControllerSettings, FunctionId, SettingChange};

/// Named optimization bias selecting which rule table is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Speed,
    Range,
    Balanced,
    Efficiency,
    Hills,
}

impl Strategy {
    pub const ALL: [Self; 5] = [
        Self::Speed,
        Self::Range,
        Self::Balanced,
        Self::Efficiency,
        Self::Hills,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Speed => "speed",
            Self::Range => "range",
            Self::Balanced => "balanced",
            Self::Efficiency => "efficiency",
            Self::Hills => "hills",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Safety constraint categories, validated in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintCategory {
    ThermalLimits,
    MotorLimits,
    LegalSpeed,
    BatteryProtection,
    Drivability,
}

impl ConstraintCategory {
    pub const ALL: [Self; 5] = [
        Self::ThermalLimits,
        Self::MotorLimits,
        Self::LegalSpeed,
        Self::BatteryProtection,
        Self::Drivability,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ThermalLimits => "thermal_limits",
            Self::MotorLimits => "motor_limits",
            Self::LegalSpeed => "legal_speed",
            Self::BatteryProtection => "battery_protection",
            Self::Drivability => "drivability",
        }
    }
}

impl std::fmt::Display for ConstraintCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a constraint violation was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionKind {
    /// The category's corrective clamp
    Corrected,
    /// Conservative value applied after corrective passes did not converge
    Fallback,
}

/// One setting silently changed by safety validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Correction {
    pub category: ConstraintCategory,
    pub function: FunctionId,
    pub before: f64,
    pub after: f64,
    pub kind: CorrectionKind,
}

/// Environmental override layered on top of a strategy's adjustments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentalOverride {
    ColdWeather,
    HotWeather,
    SteepGrade,
    HeavyLoad,
}

impl std::fmt::Display for EnvironmentalOverride {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ColdWeather => write!(f, "cold weather"),
            Self::HotWeather => write!(f, "hot weather"),
            Self::SteepGrade => write!(f, "steep grade"),
            Self::HeavyLoad => write!(f, "heavy load"),
        }
    }
}

/// Predicted vehicle performance for one settings vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformancePrediction {
    /// Top speed (mph), 10-25
    pub speed: f64,
    /// Range (miles), at least 8
    pub range: f64,
    /// Drive efficiency (%), 50-95
    pub efficiency: f64,
    /// 0-20 mph time (s), 4-15
    pub acceleration: f64,
}

impl PerformancePrediction {
    /// Values substituted when a model cannot produce a number.
    pub const FALLBACK: Self = Self {
        speed: 22.0,
        range: 25.0,
        efficiency: 75.0,
        acceleration: 8.0,
    };
}

/// Which path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationMethod {
    RuleBased,
    EmergencyFallback,
}

/// Output of one optimization call. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    pub success: bool,
    pub optimized_settings: ControllerSettings,
    /// `None` only on the emergency path
    pub strategy: Option<Strategy>,
    pub performance: PerformancePrediction,
    /// Ordered, human-readable advice
    pub recommendations: Vec<String>,
    /// 0.0-1.0
    pub confidence: f64,
    pub method: OptimizationMethod,
    pub source: String,
    /// Registry key of the profile actually used
    pub vehicle_model: String,
    /// Whether the requested model matched a known profile
    pub exact_match: bool,
    pub corrections: Vec<Correction>,
    pub environmental_overrides: Vec<EnvironmentalOverride>,
    pub tradeoffs: Vec<String>,
    /// Models run against the pre-optimization settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_performance: Option<PerformancePrediction>,
    /// Entries that differ between the base and optimized vectors
    pub changes: Vec<SettingChange>,
}
