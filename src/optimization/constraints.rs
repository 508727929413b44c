//! Safety Constraint Set
//!
//! Each category holds one or more checks and a single corrective clamp.
//! Validation is self-healing: violations are corrected and reported, never
//! rejected. Categories are re-checked until a pass comes back clean; any
//! still failing after the pass limit get their conservative fallback.

use thiserror::Error;
use tracing::{debug, warn};

use crate::types::{
    ConstraintCategory, ControllerSettings, Correction, CorrectionKind, FunctionId,
    VehicleProfile,
};

/// Default number of corrective passes before fallbacks are applied.
pub const DEFAULT_MAX_PASSES: usize = 3;

/// Highest legal speed for the vehicle class (mph).
const LEGAL_SPEED_MPH: f64 = 25.0;
/// Approximate mph per unit of speed scaling.
const MPH_PER_SPEED_UNIT: f64 = 1.2;

const FIELD_WEAKENING_MIN: f64 = 25.0;
const FIELD_WEAKENING_MAX: f64 = 60.0;

type Check = fn(&ControllerSettings, &VehicleProfile) -> bool;
type Action = fn(&mut ControllerSettings, &VehicleProfile);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintError {
    #[error("safety constraints still violated after fallback: {}", list(.0))]
    Unresolved(Vec<ConstraintCategory>),
}

fn list(categories: &[ConstraintCategory]) -> String {
    categories
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// One named constraint category.
#[derive(Clone)]
pub struct SafetyConstraint {
    pub category: ConstraintCategory,
    pub description: &'static str,
    checks: Vec<Check>,
    correct: Action,
    fallback: Action,
}

impl std::fmt::Debug for SafetyConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SafetyConstraint")
            .field("category", &self.category)
            .field("description", &self.description)
            .field("checks", &self.checks.len())
            .finish_non_exhaustive()
    }
}

impl SafetyConstraint {
    /// True when every check passes.
    pub fn is_satisfied(&self, settings: &ControllerSettings, profile: &VehicleProfile) -> bool {
        self.checks.iter().all(|check| check(settings, profile))
    }
}

// ============================================================================
// Checks and actions
// ============================================================================

fn thermal_ceiling(profile: &VehicleProfile) -> f64 {
    profile.motor.max_current * 0.8 + 50.0
}

fn conservative_current(profile: &VehicleProfile) -> f64 {
    (profile.motor.max_current * 0.8).floor()
}

fn current_within_thermal(s: &ControllerSettings, p: &VehicleProfile) -> bool {
    s[FunctionId::MAX_CURRENT] <= thermal_ceiling(p)
}

fn current_within_motor(s: &ControllerSettings, p: &VehicleProfile) -> bool {
    s[FunctionId::MAX_CURRENT] <= p.motor.max_current
}

fn field_weakening_in_band(s: &ControllerSettings, _: &VehicleProfile) -> bool {
    (FIELD_WEAKENING_MIN..=FIELD_WEAKENING_MAX).contains(&s[FunctionId::FIELD_WEAKENING])
}

fn speed_within_legal(s: &ControllerSettings, _: &VehicleProfile) -> bool {
    s[FunctionId::SPEED_SCALING] * MPH_PER_SPEED_UNIT <= LEGAL_SPEED_MPH
}

fn regen_within_charge_rate(s: &ControllerSettings, p: &VehicleProfile) -> bool {
    s[FunctionId::REGEN_CURRENT] <= p.battery.max_charge_rate * 10.0
}

fn accel_drivable(s: &ControllerSettings, _: &VehicleProfile) -> bool {
    s[FunctionId::ACCEL_RATE] >= 30.0
}

fn speed_drivable(s: &ControllerSettings, _: &VehicleProfile) -> bool {
    s[FunctionId::SPEED_SCALING] >= 18.0
}

fn cap_current(s: &mut ControllerSettings, p: &VehicleProfile) {
    let cap = conservative_current(p);
    if s[FunctionId::MAX_CURRENT] > cap {
        s[FunctionId::MAX_CURRENT] = cap;
    }
}

fn cap_current_and_band_field(s: &mut ControllerSettings, p: &VehicleProfile) {
    cap_current(s, p);
    s[FunctionId::FIELD_WEAKENING] =
        s[FunctionId::FIELD_WEAKENING].clamp(FIELD_WEAKENING_MIN, FIELD_WEAKENING_MAX);
}

fn cap_speed(s: &mut ControllerSettings, _: &VehicleProfile) {
    s[FunctionId::SPEED_SCALING] = s[FunctionId::SPEED_SCALING].min(24.0);
}

fn conservative_speed(s: &mut ControllerSettings, _: &VehicleProfile) {
    s[FunctionId::SPEED_SCALING] = 20.0;
}

fn cap_regen(s: &mut ControllerSettings, p: &VehicleProfile) {
    s[FunctionId::REGEN_CURRENT] = s[FunctionId::REGEN_CURRENT].min(p.battery.max_charge_rate * 10.0);
}

fn floor_drivability(s: &mut ControllerSettings, _: &VehicleProfile) {
    s[FunctionId::ACCEL_RATE] = s[FunctionId::ACCEL_RATE].max(40.0);
    s[FunctionId::SPEED_SCALING] = s[FunctionId::SPEED_SCALING].max(20.0);
}

// ============================================================================
// Constraint set
// ============================================================================

/// All safety constraints, validated in category order.
#[derive(Debug, Clone)]
pub struct ConstraintSet {
    constraints: Vec<SafetyConstraint>,
    max_passes: usize,
}

impl Default for ConstraintSet {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PASSES)
    }
}

impl ConstraintSet {
    pub fn new(max_passes: usize) -> Self {
        let constraints = vec![
            SafetyConstraint {
                category: ConstraintCategory::ThermalLimits,
                description: "Max current must leave thermal headroom (<= 80% of motor max + 50 A)",
                checks: vec![current_within_thermal],
                correct: cap_current,
                fallback: cap_current,
            },
            SafetyConstraint {
                category: ConstraintCategory::MotorLimits,
                description: "Max current within motor rating; field weakening between 25 and 60",
                checks: vec![current_within_motor, field_weakening_in_band],
                correct: cap_current_and_band_field,
                fallback: cap_current_and_band_field,
            },
            SafetyConstraint {
                category: ConstraintCategory::LegalSpeed,
                description: "Estimated top speed must not exceed 25 mph",
                checks: vec![speed_within_legal],
                correct: cap_speed,
                fallback: conservative_speed,
            },
            SafetyConstraint {
                category: ConstraintCategory::BatteryProtection,
                description: "Regen current must not exceed 10x the battery charge rate",
                checks: vec![regen_within_charge_rate],
                correct: cap_regen,
                fallback: cap_regen,
            },
            SafetyConstraint {
                category: ConstraintCategory::Drivability,
                description: "Acceleration rate >= 30 and speed scaling >= 18",
                checks: vec![accel_drivable, speed_drivable],
                correct: floor_drivability,
                fallback: floor_drivability,
            },
        ];
        Self {
            constraints,
            max_passes: max_passes.max(1),
        }
    }

    pub fn constraints(&self) -> &[SafetyConstraint] {
        &self.constraints
    }

    pub fn get(&self, category: ConstraintCategory) -> Option<&SafetyConstraint> {
        self.constraints.iter().find(|c| c.category == category)
    }

    /// Categories whose checks currently fail.
    pub fn violations(
        &self,
        settings: &ControllerSettings,
        profile: &VehicleProfile,
    ) -> Vec<ConstraintCategory> {
        self.constraints
            .iter()
            .filter(|c| !c.is_satisfied(settings, profile))
            .map(|c| c.category)
            .collect()
    }

    /// Correct `settings` in place until every constraint holds.
    ///
    /// Returns the corrections applied, in order. Fails only if the
    /// conservative fallbacks still leave a violation.
    pub fn validate(
        &self,
        settings: &mut ControllerSettings,
        profile: &VehicleProfile,
    ) -> Result<Vec<Correction>, ConstraintError> {
        let mut corrections = Vec::new();

        for pass in 1..=self.max_passes {
            let mut clean = true;
            for constraint in &self.constraints {
                if !constraint.is_satisfied(settings, profile) {
                    clean = false;
                    apply_recorded(
                        constraint.category,
                        constraint.correct,
                        CorrectionKind::Corrected,
                        settings,
                        profile,
                        &mut corrections,
                    );
                }
            }
            if clean {
                debug!(pass, corrections = corrections.len(), "Safety validation clean");
                return Ok(corrections);
            }
        }

        // Corrective passes did not converge.
        for constraint in &self.constraints {
            if !constraint.is_satisfied(settings, profile) {
                apply_recorded(
                    constraint.category,
                    constraint.fallback,
                    CorrectionKind::Fallback,
                    settings,
                    profile,
                    &mut corrections,
                );
            }
        }

        let remaining = self.violations(settings, profile);
        if remaining.is_empty() {
            Ok(corrections)
        } else {
            Err(ConstraintError::Unresolved(remaining))
        }
    }
}

/// Run an action and record every entry it changed.
fn apply_recorded(
    category: ConstraintCategory,
    action: Action,
    kind: CorrectionKind,
    settings: &mut ControllerSettings,
    profile: &VehicleProfile,
    corrections: &mut Vec<Correction>,
) {
    let before = *settings;
    action(settings, profile);
    for change in crate::types::diff_settings(&before, settings) {
        warn!(
            category = %category,
            function = %change.function,
            before = change.before,
            after = change.after,
            ?kind,
            "Safety correction applied"
        );
        corrections.push(Correction {
            category,
            function: change.function,
            before: change.before,
            after: change.after,
            kind,
        });
    }
}
