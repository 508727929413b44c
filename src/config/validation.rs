//! Config validation: unknown-key detection with Levenshtein suggestions
//! and range checks on custom vehicle profiles.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Unknown keys never break a config.

use std::collections::HashSet;

use super::defaults::{CACHE_MAX_ENTRIES_WARN, LSV_MAX_SPEED_MPH, SUSPICIOUS_MOTOR_EFFICIENCY};

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Keys under this table are function numbers, not field names.
const FREE_FORM_TABLE: &str = "vehicles.default_settings";

/// Returns the complete set of valid dotted key paths for `AdvisorConfig`.
///
/// Entries of the `[[vehicles]]` array share one path prefix. Must be kept in
/// step with the structs in advisor_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [optimizer]
        "optimizer",
        "optimizer.fallback_model",
        "optimizer.max_validation_passes",
        // [cache]
        "cache",
        "cache.enabled",
        "cache.max_entries",
        // [server]
        "server",
        "server.addr",
        // [[vehicles]]
        "vehicles",
        "vehicles.model",
        "vehicles.name",
        "vehicles.motor",
        "vehicles.motor.type",
        "vehicles.motor.max_current",
        "vehicles.motor.nominal_voltage",
        "vehicles.motor.max_rpm",
        "vehicles.motor.efficiency",
        "vehicles.battery",
        "vehicles.battery.nominal_voltage",
        "vehicles.battery.capacity_ah",
        "vehicles.battery.chemistry",
        "vehicles.battery.max_charge_rate",
        "vehicles.drivetrain",
        "vehicles.drivetrain.gear_ratio",
        "vehicles.drivetrain.wheel_diameter",
        "vehicles.drivetrain.max_speed",
        "vehicles.weight",
        "vehicles.weight.curb_lbs",
        "vehicles.weight.max_gvw_lbs",
        "vehicles.aerodynamics",
        "vehicles.aerodynamics.drag_coefficient",
        "vehicles.aerodynamics.frontal_area",
        FREE_FORM_TABLE,
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// Tables inside arrays contribute their keys under the array's own path, so
/// `[[vehicles]] model = "x"` yields `["vehicles", "vehicles.model"]`.
/// Children of `vehicles.default_settings` are not collected.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if prefix == FREE_FORM_TABLE {
        return keys;
    }
    match value {
        toml::Value::Table(table) => {
            for (k, v) in table {
                let path = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{prefix}.{k}")
                };
                keys.push(path.clone());
                if v.is_table() || v.is_array() {
                    keys.extend(walk_toml_keys(v, &path));
                }
            }
        }
        toml::Value::Array(items) => {
            for item in items.iter().filter(|i| i.is_table()) {
                for key in walk_toml_keys(item, prefix) {
                    if !keys.contains(&key) {
                        keys.push(key);
                    }
                }
            }
        }
        _ => {}
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let b_len = b_chars.len();
    if a.is_empty() {
        return b_len;
    }
    if b_len == 0 {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties go to the alphabetically first key so suggestions are stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (levenshtein(unknown, k), k))
        .filter(|&(dist, _)| dist <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// Parse errors yield no warnings; serde reports them afterwards.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(),
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Range Validation
// ============================================================================

/// Validate numeric ranges on a parsed `AdvisorConfig`.
///
/// Returns (errors, warnings): errors are values the optimizer cannot work
/// with, warnings are legal but suspicious.
pub fn validate_physical_ranges(
    config: &super::AdvisorConfig,
) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if config.cache.max_entries > CACHE_MAX_ENTRIES_WARN {
        warnings.push(ValidationWarning {
            field: "cache.max_entries".to_string(),
            message: format!(
                "cache.max_entries = {} is unusually large",
                config.cache.max_entries
            ),
            suggestion: None,
        });
    }

    for (i, vehicle) in config.vehicles.iter().enumerate() {
        let label = format!("vehicles[{i}] ({})", vehicle.model);

        for (field, value) in vehicle.numeric_fields() {
            if !value.is_finite() {
                errors.push(format!("{label}: {field} = {value} is not a finite number"));
            }
        }

        let d = &vehicle.drivetrain;
        if d.gear_ratio <= 0.0 || d.wheel_diameter <= 0.0 {
            errors.push(format!(
                "{label}: drivetrain gear_ratio ({}) and wheel_diameter ({}) must be > 0",
                d.gear_ratio, d.wheel_diameter
            ));
        }

        if d.max_speed > LSV_MAX_SPEED_MPH {
            warnings.push(ValidationWarning {
                field: format!("vehicles[{i}].drivetrain.max_speed"),
                message: format!(
                    "{label}: max_speed = {:.1} mph exceeds the 25 mph low-speed vehicle limit",
                    d.max_speed
                ),
                suggestion: None,
            });
        }

        let eff = vehicle.motor.efficiency;
        if eff > 0.0 && eff < SUSPICIOUS_MOTOR_EFFICIENCY {
            warnings.push(ValidationWarning {
                field: format!("vehicles[{i}].motor.efficiency"),
                message: format!("{label}: motor efficiency {eff:.2} is unusually low"),
                suggestion: None,
            });
        }

        if vehicle.weight.max_gvw_lbs < vehicle.weight.curb_lbs {
            warnings.push(ValidationWarning {
                field: format!("vehicles[{i}].weight.max_gvw_lbs"),
                message: format!(
                    "{label}: max_gvw_lbs ({:.0}) is below curb_lbs ({:.0})",
                    vehicle.weight.max_gvw_lbs, vehicle.weight.curb_lbs
                ),
                suggestion: None,
            });
        }
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("cache", "cache"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("max_entires", "max_entries"), 2);
        assert_eq!(levenshtein("fallback_mode", "fallback_model"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [optimizer]
            fallback_model = "e4"
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"optimizer".to_string()));
        assert!(keys.contains(&"optimizer.fallback_model".to_string()));
    }

    #[test]
    fn test_walk_toml_keys_array_of_tables() {
        let toml: toml::Value = r#"
            [[vehicles]]
            model = "a"
            [vehicles.default_settings]
            "F.1" = 22

            [[vehicles]]
            model = "b"
        "#
        .parse()
        .unwrap();
        let mut keys = walk_toml_keys(&toml, "");
        keys.sort();
        assert_eq!(
            keys,
            vec!["vehicles", "vehicles.default_settings", "vehicles.model"]
        );
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let toml_str = r#"
[optimizer]
fallback_mode = "e6"
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "optimizer.fallback_mode");
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("optimizer.fallback_model")
        );
    }

    #[test]
    fn test_typo_inside_vehicle_table() {
        let toml_str = r#"
[[vehicles]]
model = "custom"
[vehicles.motor]
max_curent = 300.0
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("vehicles.motor.max_current")
        );
    }

    #[test]
    fn test_all_valid_keys_produce_zero_warnings() {
        let toml_str = r#"
[optimizer]
fallback_model = "e4"
max_validation_passes = 3

[cache]
enabled = true

[server]
addr = "0.0.0.0:9000"
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert!(warnings.is_empty(), "Expected 0 warnings, got: {:?}", warnings);
    }

    #[test]
    fn test_suggest_correction_no_match_for_garbage() {
        let known = known_config_keys();
        assert!(suggest_correction("zzzzzzzzzzzzzzzzzzzz", &known).is_none());
    }

    #[test]
    fn test_defaults_have_no_range_findings() {
        let (errors, warnings) = validate_physical_ranges(&super::super::AdvisorConfig::default());
        assert!(errors.is_empty());
        assert!(warnings.is_empty());
    }
}
