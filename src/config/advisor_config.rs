//! Advisor Configuration - optimizer, cache, server and custom vehicle profiles
//!
//! Every field has a default, so an empty file (or no file) yields the
//! built-in behavior.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::registry::{normalize_model_id, RegistryError, VehicleRegistry, DEFAULT_FALLBACK_MODEL};
use crate::types::{
    AeroSpec, BatterySpec, DrivetrainSpec, FunctionId, MotorSpec, VehicleProfile, WeightSpec,
};

use super::defaults;
use super::validation::{validate_physical_ranges, validate_unknown_keys, ValidationWarning};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error ({}): {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error ({origin}): {source}")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for an advisor deployment.
///
/// Load with `AdvisorConfig::load()` which searches:
/// 1. `$GEM_ADVISOR_CONFIG` env var
/// 2. `./gem_advisor.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdvisorConfig {
    #[serde(default)]
    pub optimizer: OptimizerSection,

    /// Result cache
    #[serde(default)]
    pub cache: CacheConfig,

    /// HTTP server
    #[serde(default)]
    pub server: ServerConfig,

    /// Custom vehicle profiles, merged over the built-in set
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vehicles: Vec<VehicleProfileConfig>,
}

impl AdvisorConfig {
    /// Config file the standard search order would read, if any.
    pub fn locate() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                return Some(p);
            }
            warn!(path = %path, "GEM_ADVISOR_CONFIG points to non-existent file, ignoring");
        }
        let local = PathBuf::from(defaults::CONFIG_FILE_NAME);
        local.exists().then_some(local)
    }

    /// Load configuration using the standard search order:
    /// 1. `$GEM_ADVISOR_CONFIG` environment variable
    /// 2. `./gem_advisor.toml` in the current working directory
    /// 3. Built-in defaults
    ///
    /// A file that fails to load is logged and skipped.
    pub fn load() -> Self {
        if let Some(path) = Self::locate() {
            match Self::load_from_file(&path) {
                Ok(config) => {
                    info!(path = %path.display(), vehicles = config.vehicles.len(), "Loaded advisor config");
                    return config;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to load advisor config, using defaults");
                }
            }
        } else {
            info!("No gem_advisor.toml found, using built-in defaults");
        }
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents, &path.display().to_string())
    }

    /// Parse and validate TOML text. `origin` labels parse errors.
    pub fn from_toml_str(contents: &str, origin: &str) -> Result<Self, ConfigError> {
        // Two-pass: check for unknown keys first (warnings only)
        for w in validate_unknown_keys(contents) {
            warn!(origin, "{}", w);
        }

        let config: Self = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            origin: origin.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check that the optimizer can be built from this config.
    ///
    /// Range warnings are logged and returned; errors are collected into
    /// one `ConfigError::Validation`.
    pub fn validate(&self) -> Result<Vec<ValidationWarning>, ConfigError> {
        let (mut errors, warnings) = validate_physical_ranges(self);
        for w in &warnings {
            warn!(field = %w.field, "{}", w);
        }

        let passes = self.optimizer.max_validation_passes;
        if !(1..=defaults::MAX_VALIDATION_PASSES_LIMIT).contains(&passes) {
            errors.push(format!(
                "optimizer.max_validation_passes = {passes} must be between 1 and {}",
                defaults::MAX_VALIDATION_PASSES_LIMIT
            ));
        }

        if self.cache.max_entries == 0 {
            errors.push("cache.max_entries must be > 0".to_string());
        }

        if self.server.addr.parse::<std::net::SocketAddr>().is_err() {
            errors.push(format!(
                "server.addr = '{}' is not a socket address",
                self.server.addr
            ));
        }

        let mut custom_models = Vec::new();
        for (i, vehicle) in self.vehicles.iter().enumerate() {
            match vehicle.to_profile() {
                Ok(profile) => match profile.validate() {
                    Ok(()) => custom_models.push(profile.model),
                    Err(e) => errors.push(format!("vehicles[{i}]: {e}")),
                },
                Err(e) => errors.push(format!("vehicles[{i}]: {e}")),
            }
        }

        let builtin = VehicleRegistry::builtin();
        let fallback = normalize_model_id(&self.optimizer.fallback_model);
        if builtin.find(&fallback).is_none() && !custom_models.contains(&fallback) {
            errors.push(format!(
                "optimizer.fallback_model = '{}' is not a known vehicle model",
                self.optimizer.fallback_model
            ));
        }

        if errors.is_empty() {
            Ok(warnings)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Built-in registry with custom profiles merged in and the configured
    /// fallback model selected.
    pub fn build_registry(&self) -> Result<VehicleRegistry, ConfigError> {
        let mut registry = VehicleRegistry::builtin();
        for vehicle in &self.vehicles {
            let profile = vehicle
                .to_profile()
                .map_err(|e| ConfigError::Validation(vec![e]))?;
            registry.insert(profile);
        }
        Ok(registry.with_fallback(&self.optimizer.fallback_model)?)
    }
}

// ============================================================================
// Optimizer
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerSection {
    /// Profile used when a requested model is unknown
    #[serde(default = "default_fallback_model")]
    pub fallback_model: String,

    /// Corrective passes before conservative fallbacks are applied
    #[serde(default = "default_max_validation_passes")]
    pub max_validation_passes: usize,
}

fn default_fallback_model() -> String {
    DEFAULT_FALLBACK_MODEL.to_string()
}

fn default_max_validation_passes() -> usize {
    defaults::MAX_VALIDATION_PASSES
}

impl Default for OptimizerSection {
    fn default() -> Self {
        Self {
            fallback_model: default_fallback_model(),
            max_validation_passes: default_max_validation_passes(),
        }
    }
}

// ============================================================================
// Cache
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Entries held before the cache is cleared
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: usize,
}

fn default_cache_max_entries() -> usize {
    defaults::CACHE_MAX_ENTRIES
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_entries: default_cache_max_entries(),
        }
    }
}

// ============================================================================
// Server
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server bind address.
    ///
    /// Can be overridden by the `--addr` CLI flag.
    #[serde(default = "default_server_addr")]
    pub addr: String,
}

fn default_server_addr() -> String {
    defaults::SERVER_ADDR.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
        }
    }
}

// ============================================================================
// Custom Vehicle Profiles
// ============================================================================

/// A `[[vehicles]]` entry. Same shape as `VehicleProfile`, except that
/// `default_settings` keys are written `"4"` or `"F.4"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleProfileConfig {
    pub model: String,
    /// Display name, defaults to the model key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub motor: MotorSpec,
    pub battery: BatterySpec,
    pub drivetrain: DrivetrainSpec,
    pub weight: WeightSpec,
    pub aerodynamics: AeroSpec,
    #[serde(default)]
    pub default_settings: BTreeMap<String, f64>,
}

impl VehicleProfileConfig {
    /// Convert to a registry profile. Fails on unparseable function keys.
    pub fn to_profile(&self) -> Result<VehicleProfile, String> {
        let mut default_settings = BTreeMap::new();
        for (key, &value) in &self.default_settings {
            let id: FunctionId = key
                .parse()
                .map_err(|e| format!("default_settings: {e}"))?;
            default_settings.insert(id, value);
        }
        let model = normalize_model_id(&self.model);
        Ok(VehicleProfile {
            name: self.name.clone().unwrap_or_else(|| model.clone()),
            model,
            motor: self.motor.clone(),
            battery: self.battery.clone(),
            drivetrain: self.drivetrain.clone(),
            weight: self.weight.clone(),
            aerodynamics: self.aerodynamics.clone(),
            default_settings,
        })
    }

    /// Every numeric field with its dotted name.
    pub fn numeric_fields(&self) -> Vec<(String, f64)> {
        let mut fields = vec![
            ("motor.max_current".to_string(), self.motor.max_current),
            ("motor.nominal_voltage".to_string(), self.motor.nominal_voltage),
            ("motor.max_rpm".to_string(), self.motor.max_rpm),
            ("motor.efficiency".to_string(), self.motor.efficiency),
            ("battery.nominal_voltage".to_string(), self.battery.nominal_voltage),
            ("battery.capacity_ah".to_string(), self.battery.capacity_ah),
            ("battery.max_charge_rate".to_string(), self.battery.max_charge_rate),
            ("drivetrain.gear_ratio".to_string(), self.drivetrain.gear_ratio),
            ("drivetrain.wheel_diameter".to_string(), self.drivetrain.wheel_diameter),
            ("drivetrain.max_speed".to_string(), self.drivetrain.max_speed),
            ("weight.curb_lbs".to_string(), self.weight.curb_lbs),
            ("weight.max_gvw_lbs".to_string(), self.weight.max_gvw_lbs),
            ("aerodynamics.drag_coefficient".to_string(), self.aerodynamics.drag_coefficient),
            ("aerodynamics.frontal_area".to_string(), self.aerodynamics.frontal_area),
        ];
        fields.extend(
            self.default_settings
                .iter()
                .map(|(k, &v)| (format!("default_settings.{k}"), v)),
        );
        fields
    }
}

impl From<&VehicleProfile> for VehicleProfileConfig {
    fn from(profile: &VehicleProfile) -> Self {
        Self {
            model: profile.model.clone(),
            name: Some(profile.name.clone()),
            motor: profile.motor.clone(),
            battery: profile.battery.clone(),
            drivetrain: profile.drivetrain.clone(),
            weight: profile.weight.clone(),
            aerodynamics: profile.aerodynamics.clone(),
            default_settings: profile
                .default_settings
                .iter()
                .map(|(id, &v)| (id.to_string(), v))
                .collect(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const CUSTOM: &str = r#"
[optimizer]
fallback_model = "shop-cart"

[[vehicles]]
model = "Shop Cart"

[vehicles.motor]
type = "shunt"
max_current = 320.0
nominal_voltage = 72.0
max_rpm = 4000.0
efficiency = 0.85

[vehicles.battery]
nominal_voltage = 72.0
capacity_ah = 120.0
chemistry = "lithium"
max_charge_rate = 30.0

[vehicles.drivetrain]
gear_ratio = 12.5
wheel_diameter = 22.0
max_speed = 25.0

[vehicles.weight]
curb_lbs = 1300.0
max_gvw_lbs = 2100.0

[vehicles.aerodynamics]
drag_coefficient = 0.6
frontal_area = 2.2

[vehicles.default_settings]
"F.1" = 22
"4" = 240
"F.6" = 60
"F.9" = 220
"24" = 42
"#;

    #[test]
    fn test_default_config_validates() {
        let config = AdvisorConfig::default();
        assert!(config.validate().is_ok(), "Default config must always validate");
    }

    #[test]
    fn test_empty_toml_produces_defaults() {
        let config: AdvisorConfig = toml::from_str("").expect("empty TOML should parse");
        assert_eq!(config.optimizer.fallback_model, "e4");
        assert_eq!(config.optimizer.max_validation_passes, 3);
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.max_entries, 1024);
        assert_eq!(config.server.addr, "127.0.0.1:8080");
        assert!(config.vehicles.is_empty());
    }

    #[test]
    fn test_custom_vehicle_becomes_fallback() {
        let config = AdvisorConfig::from_toml_str(CUSTOM, "inline").expect("custom config");
        let registry = config.build_registry().expect("registry");
        assert_eq!(registry.fallback_model(), "shop-cart");
        let profile = registry.find("shop cart").expect("custom profile registered");
        assert_eq!(profile.name, "shop-cart");
        assert_eq!(profile.default_for(FunctionId::MAX_CURRENT), Some(240.0));
        assert_eq!(registry.len(), 6);
    }

    #[test]
    fn test_validation_catches_bad_passes_and_fallback() {
        let mut config = AdvisorConfig::default();
        config.optimizer.max_validation_passes = 0;
        config.optimizer.fallback_model = "e9".into();
        config.cache.max_entries = 0;
        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors.len(), 3, "{errors:?}");
                assert!(errors.iter().any(|e| e.contains("max_validation_passes")));
                assert!(errors.iter().any(|e| e.contains("e9")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_catches_incomplete_profile() {
        let broken = CUSTOM.replace("\"24\" = 42\n", "");
        let err = AdvisorConfig::from_toml_str(&broken, "inline").unwrap_err();
        assert!(err.to_string().contains("F.24"), "{err}");
    }

    #[test]
    fn test_validation_catches_bad_function_key() {
        let broken = CUSTOM.replace("\"24\" = 42", "\"F.99\" = 42");
        assert!(matches!(
            AdvisorConfig::from_toml_str(&broken, "inline"),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_error_names_origin() {
        let err = AdvisorConfig::from_toml_str("[cache\nenabled = 1", "broken.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_roundtrip_toml() {
        let original = AdvisorConfig::from_toml_str(CUSTOM, "inline").expect("custom config");
        let toml_str = original.to_toml().expect("serialization should work");
        let roundtripped =
            AdvisorConfig::from_toml_str(&toml_str, "roundtrip").expect("deserialization should work");
        assert_eq!(roundtripped.optimizer.fallback_model, "shop-cart");
        assert_eq!(roundtripped.vehicles.len(), 1);
        assert_eq!(
            roundtripped.vehicles[0].default_settings.get("F.1"),
            Some(&22.0)
        );
    }

    #[test]
    fn test_profile_config_from_builtin() {
        let registry = VehicleRegistry::builtin();
        let config = VehicleProfileConfig::from(registry.get_profile("e6"));
        let back = config.to_profile().expect("convertible");
        assert_eq!(&back, registry.get_profile("e6"));
    }
}
