//! Built-in GEM vehicle archetypes

use std::collections::BTreeMap;

use crate::types::{
    AeroSpec, BatterySpec, DrivetrainSpec, FunctionId, MotorSpec, VehicleProfile, WeightSpec,
};

/// Model key used when a requested vehicle is unknown.
pub const DEFAULT_FALLBACK_MODEL: &str = "e4";

/// Factory defaults in (F.1, F.4, F.6, F.9, F.24) order.
fn defaults(speed: f64, current: f64, accel: f64, regen: f64, field: f64) -> BTreeMap<FunctionId, f64> {
    BTreeMap::from([
        (FunctionId::SPEED_SCALING, speed),
        (FunctionId::MAX_CURRENT, current),
        (FunctionId::ACCEL_RATE, accel),
        (FunctionId::REGEN_CURRENT, regen),
        (FunctionId::FIELD_WEAKENING, field),
    ])
}

fn shunt_motor(max_current: f64, efficiency: f64) -> MotorSpec {
    MotorSpec {
        motor_type: "shunt".to_string(),
        max_current,
        nominal_voltage: 72.0,
        max_rpm: 4000.0,
        efficiency,
    }
}

fn battery(capacity_ah: f64, chemistry: &str, max_charge_rate: f64) -> BatterySpec {
    BatterySpec {
        nominal_voltage: 72.0,
        capacity_ah,
        chemistry: chemistry.to_string(),
        max_charge_rate,
    }
}

/// Two-seat neighborhood vehicle.
fn e2() -> VehicleProfile {
    VehicleProfile {
        model: "e2".to_string(),
        name: "GEM e2".to_string(),
        motor: shunt_motor(300.0, 0.85),
        battery: battery(130.0, "flooded lead-acid", 30.0),
        drivetrain: DrivetrainSpec {
            gear_ratio: 12.44,
            wheel_diameter: 22.0,
            max_speed: 25.0,
        },
        weight: WeightSpec {
            curb_lbs: 1250.0,
            max_gvw_lbs: 1900.0,
        },
        aerodynamics: AeroSpec {
            drag_coefficient: 0.45,
            frontal_area: 2.1,
        },
        default_settings: defaults(22.0, 245.0, 60.0, 225.0, 43.0),
    }
}

/// Four-seat passenger vehicle, the reference archetype.
fn e4() -> VehicleProfile {
    VehicleProfile {
        model: "e4".to_string(),
        name: "GEM e4".to_string(),
        motor: shunt_motor(350.0, 0.86),
        battery: battery(150.0, "AGM", 30.0),
        drivetrain: DrivetrainSpec {
            gear_ratio: 12.44,
            wheel_diameter: 22.0,
            max_speed: 25.0,
        },
        weight: WeightSpec {
            curb_lbs: 1450.0,
            max_gvw_lbs: 2400.0,
        },
        aerodynamics: AeroSpec {
            drag_coefficient: 0.48,
            frontal_area: 2.3,
        },
        default_settings: defaults(22.0, 245.0, 60.0, 225.0, 43.0),
    }
}

/// Six-seat shuttle.
fn e6() -> VehicleProfile {
    VehicleProfile {
        model: "e6".to_string(),
        name: "GEM e6".to_string(),
        motor: shunt_motor(400.0, 0.86),
        battery: battery(200.0, "AGM", 35.0),
        drivetrain: DrivetrainSpec {
            gear_ratio: 12.44,
            wheel_diameter: 22.0,
            max_speed: 25.0,
        },
        weight: WeightSpec {
            curb_lbs: 1700.0,
            max_gvw_lbs: 2900.0,
        },
        aerodynamics: AeroSpec {
            drag_coefficient: 0.50,
            frontal_area: 2.4,
        },
        default_settings: defaults(22.0, 260.0, 55.0, 230.0, 43.0),
    }
}

/// Extended utility bed, geared for payload.
fn el_xd() -> VehicleProfile {
    VehicleProfile {
        model: "el-xd".to_string(),
        name: "GEM eL XD".to_string(),
        motor: shunt_motor(400.0, 0.84),
        battery: battery(200.0, "AGM", 35.0),
        drivetrain: DrivetrainSpec {
            gear_ratio: 15.0,
            wheel_diameter: 22.0,
            max_speed: 25.0,
        },
        weight: WeightSpec {
            curb_lbs: 1850.0,
            max_gvw_lbs: 3300.0,
        },
        aerodynamics: AeroSpec {
            drag_coefficient: 0.55,
            frontal_area: 2.6,
        },
        default_settings: defaults(21.0, 270.0, 50.0, 230.0, 40.0),
    }
}

/// Short-bed utility.
fn elss() -> VehicleProfile {
    VehicleProfile {
        model: "elss".to_string(),
        name: "GEM eLSS".to_string(),
        motor: shunt_motor(350.0, 0.85),
        battery: battery(150.0, "AGM", 30.0),
        drivetrain: DrivetrainSpec {
            gear_ratio: 12.44,
            wheel_diameter: 22.0,
            max_speed: 25.0,
        },
        weight: WeightSpec {
            curb_lbs: 1500.0,
            max_gvw_lbs: 2500.0,
        },
        aerodynamics: AeroSpec {
            drag_coefficient: 0.52,
            frontal_area: 2.4,
        },
        default_settings: defaults(22.0, 250.0, 55.0, 225.0, 42.0),
    }
}

/// Every built-in profile.
pub fn builtin_profiles() -> Vec<VehicleProfile> {
    vec![e2(), e4(), e6(), el_xd(), elss()]
}

/// The archetype used when nothing else is available.
pub(super) fn reference_profile() -> VehicleProfile {
    e4()
}
