//! Controller settings vector addressed by 1-based function number (F.1..F.25)

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Number of controller functions exposed by the advisor.
pub const FUNCTION_COUNT: usize = 25;

/// A controller function number, always 1-based (`F.1`..`F.25`).
///
/// The only way to address a [`ControllerSettings`] entry. The 0-based
/// storage offset never leaves this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct FunctionId(u8);

impl FunctionId {
    /// F.1 - top speed scaling
    pub const SPEED_SCALING: Self = Self(1);
    /// F.4 - maximum armature current (A)
    pub const MAX_CURRENT: Self = Self(4);
    /// F.6 - acceleration rate
    pub const ACCEL_RATE: Self = Self(6);
    /// F.9 - regenerative braking current (A)
    pub const REGEN_CURRENT: Self = Self(9);
    /// F.24 - field weakening
    pub const FIELD_WEAKENING: Self = Self(24);

    /// Functions every vehicle profile must supply a default for.
    pub const REQUIRED: [Self; 5] = [
        Self::SPEED_SCALING,
        Self::MAX_CURRENT,
        Self::ACCEL_RATE,
        Self::REGEN_CURRENT,
        Self::FIELD_WEAKENING,
    ];

    /// Build a function id, returning `None` outside 1..=25.
    pub const fn new(number: u8) -> Option<Self> {
        if number >= 1 && number as usize <= FUNCTION_COUNT {
            Some(Self(number))
        } else {
            None
        }
    }

    /// The 1-based function number.
    pub const fn number(self) -> u8 {
        self.0
    }

    /// Iterate F.1..F.25 in order.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=FUNCTION_COUNT as u8).map(Self)
    }

    /// Human-readable name for the functions the advisor tunes.
    pub const fn label(self) -> &'static str {
        match self.0 {
            1 => "Top speed scaling",
            4 => "Max armature current",
            6 => "Acceleration rate",
            9 => "Regen current",
            24 => "Field weakening",
            _ => "Controller function",
        }
    }

    const fn offset(self) -> usize {
        self.0 as usize - 1
    }
}

impl TryFrom<u8> for FunctionId {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("function number {value} outside F.1..F.{FUNCTION_COUNT}"))
    }
}

impl From<FunctionId> for u8 {
    fn from(id: FunctionId) -> Self {
        id.0
    }
}

impl std::str::FromStr for FunctionId {
    type Err = String;

    /// Accepts `"4"`, `"F.4"` and `"f4"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("F.")
            .or_else(|| trimmed.strip_prefix("f."))
            .or_else(|| trimmed.strip_prefix('F'))
            .or_else(|| trimmed.strip_prefix('f'))
            .unwrap_or(trimmed);
        let number: u8 = digits
            .parse()
            .map_err(|_| format!("'{s}' is not a controller function number"))?;
        Self::try_from(number)
    }
}

impl std::fmt::Display for FunctionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "F.{}", self.0)
    }
}

/// The 25 controller function values.
///
/// Serialized as a plain JSON array where element `i` holds `F.(i+1)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControllerSettings([f64; FUNCTION_COUNT]);

impl Default for ControllerSettings {
    fn default() -> Self {
        Self([0.0; FUNCTION_COUNT])
    }
}

impl ControllerSettings {
    /// Every entry set to `value`.
    pub fn filled(value: f64) -> Self {
        Self([value; FUNCTION_COUNT])
    }

    pub fn get(&self, id: FunctionId) -> f64 {
        self.0[id.offset()]
    }

    pub fn set(&mut self, id: FunctionId, value: f64) {
        self.0[id.offset()] = value;
    }

    /// `(function, value)` pairs in F.1..F.25 order.
    pub fn iter(&self) -> impl Iterator<Item = (FunctionId, f64)> + '_ {
        FunctionId::all().map(move |id| (id, self.get(id)))
    }

    /// Values in F.1..F.25 order.
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl Index<FunctionId> for ControllerSettings {
    type Output = f64;

    fn index(&self, id: FunctionId) -> &f64 {
        &self.0[id.offset()]
    }
}

impl IndexMut<FunctionId> for ControllerSettings {
    fn index_mut(&mut self, id: FunctionId) -> &mut f64 {
        &mut self.0[id.offset()]
    }
}

/// One setting that differs between two vectors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingChange {
    pub function: FunctionId,
    pub before: f64,
    pub after: f64,
}

/// List the entries that differ between `before` and `after`.
pub fn diff_settings(before: &ControllerSettings, after: &ControllerSettings) -> Vec<SettingChange> {
    before
        .iter()
        .zip(after.iter())
        .filter(|((_, b), (_, a))| (a - b).abs() > f64::EPSILON)
        .map(|((function, before), (_, after))| SettingChange {
            function,
            before,
            after,
        })
        .collect()
}
