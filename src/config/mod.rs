//! Advisor Configuration Module
//!
//! Deployment configuration loaded from TOML: optimizer tuning, result cache,
//! HTTP server and custom vehicle profiles.
//!
//! ## Loading Order
//!
//! 1. `GEM_ADVISOR_CONFIG` environment variable (path to TOML file)
//! 2. `gem_advisor.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! The config is passed explicitly; nothing is stored globally:
//!
//! ```ignore
//! let config = AdvisorConfig::load();
//! let optimizer = RuleBasedOptimizer::from_config(&config)?;
//! ```

mod advisor_config;
pub mod defaults;
pub mod validation;

pub use advisor_config::*;
pub use validation::ValidationWarning;
