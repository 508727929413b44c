//! GEM Advisor: motor controller configuration for GEM low-speed EVs
//!
//! Rule-based optimizer that turns owner priorities, driving conditions and
//! current controller settings into a safety-checked recommended settings
//! vector with predicted performance.
//!
//! ## Architecture
//!
//! - **Registry**: vehicle archetypes keyed by model, with fallback
//! - **Optimization**: strategy rules, safety constraints, performance models
//! - **Config**: TOML deployment config and custom vehicle profiles
//! - **API**: Axum JSON endpoints over a shared optimizer

pub mod api;
pub mod config;
pub mod optimization;
pub mod registry;
pub mod types;

pub use config::{AdvisorConfig, ConfigError};
pub use optimization::{OptimizerError, RuleBasedOptimizer};
pub use registry::VehicleRegistry;
pub use types::{
    ControllerSettings, FunctionId, OptimizationRequest, OptimizationResult, Strategy,
    VehicleProfile,
};
