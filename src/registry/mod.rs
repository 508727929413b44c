//! Vehicle Profile Registry
//!
//! Read-only lookup of vehicle archetypes keyed by a normalized model
//! identifier. Unknown identifiers resolve to the fallback archetype with a
//! warning, so lookups never fail.

mod profiles;

pub use profiles::{builtin_profiles, DEFAULT_FALLBACK_MODEL};

use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::types::VehicleProfile;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("fallback model '{0}' is not registered")]
    UnknownFallback(String),
}

/// Outcome of a registry lookup.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedProfile<'a> {
    pub profile: &'a VehicleProfile,
    /// `false` when the fallback archetype was substituted
    pub exact: bool,
}

/// Table of vehicle archetypes. Constructed once by the host, then shared.
#[derive(Debug, Clone)]
pub struct VehicleRegistry {
    profiles: HashMap<String, VehicleProfile>,
    fallback: VehicleProfile,
}

impl Default for VehicleRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl VehicleRegistry {
    /// Registry holding the built-in GEM archetypes, falling back to `e4`.
    pub fn builtin() -> Self {
        let profiles = builtin_profiles()
            .into_iter()
            .map(|p| (p.model.clone(), p))
            .collect();
        Self {
            profiles,
            fallback: profiles::reference_profile(),
        }
    }

    /// Use a different registered model as the fallback archetype.
    pub fn with_fallback(mut self, model: &str) -> Result<Self, RegistryError> {
        let key = normalize_model_id(model);
        let profile = self
            .profiles
            .get(&key)
            .ok_or_else(|| RegistryError::UnknownFallback(model.to_string()))?;
        self.fallback = profile.clone();
        Ok(self)
    }

    /// Add or replace a profile under its normalized model key.
    ///
    /// Profiles are not validated here; the optimizer validates the profile
    /// it resolves before using it.
    pub fn insert(&mut self, mut profile: VehicleProfile) {
        let key = normalize_model_id(&profile.model);
        profile.model = key.clone();
        if key == self.fallback.model {
            self.fallback = profile.clone();
        }
        debug!(model = %key, "Registered vehicle profile");
        self.profiles.insert(key, profile);
    }

    /// Look up a profile, reporting whether the identifier matched exactly.
    pub fn resolve(&self, identifier: &str) -> ResolvedProfile<'_> {
        let key = normalize_model_id(identifier);
        match self.profiles.get(&key) {
            Some(profile) => ResolvedProfile {
                profile,
                exact: true,
            },
            None => {
                warn!(
                    requested = %identifier,
                    fallback = %self.fallback.model,
                    "Unknown vehicle model, using fallback profile"
                );
                ResolvedProfile {
                    profile: &self.fallback,
                    exact: false,
                }
            }
        }
    }

    /// Profile for an identifier, or the fallback archetype.
    pub fn get_profile(&self, identifier: &str) -> &VehicleProfile {
        self.resolve(identifier).profile
    }

    /// Exact lookup without fallback.
    pub fn find(&self, identifier: &str) -> Option<&VehicleProfile> {
        self.profiles.get(&normalize_model_id(identifier))
    }

    pub fn fallback_model(&self) -> &str {
        &self.fallback.model
    }

    /// Registered model keys, sorted.
    pub fn models(&self) -> Vec<&str> {
        let mut models: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        models.sort_unstable();
        models
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Normalize a model identifier: trimmed, lowercase, whitespace runs become
/// `-`, and a leading `gem-` brand prefix is dropped.
pub fn normalize_model_id(identifier: &str) -> String {
    let joined = identifier
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase();
    match joined.strip_prefix("gem-") {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => joined,
    }
}
