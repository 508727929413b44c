//! Configuration default constants.
//!
//! Grouped by config section.

// ============================================================================
// Loading
// ============================================================================

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "GEM_ADVISOR_CONFIG";

/// Config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "gem_advisor.toml";

// ============================================================================
// Optimizer
// ============================================================================

/// Safety validation passes before conservative fallbacks are applied.
pub const MAX_VALIDATION_PASSES: usize = 3;

/// Upper bound accepted for `optimizer.max_validation_passes`.
pub const MAX_VALIDATION_PASSES_LIMIT: usize = 10;

// ============================================================================
// Cache
// ============================================================================

/// Result cache capacity before it is cleared.
pub const CACHE_MAX_ENTRIES: usize = 1024;

/// Capacities above this are accepted with a warning.
pub const CACHE_MAX_ENTRIES_WARN: usize = 1_000_000;

// ============================================================================
// Server
// ============================================================================

/// HTTP bind address. Overridden by `--addr`.
pub const SERVER_ADDR: &str = "127.0.0.1:8080";

/// Request body limit for the HTTP API (bytes). Batch requests dominate.
pub const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

// ============================================================================
// Custom vehicle profiles
// ============================================================================

/// Low-speed vehicles are limited to 25 mph; higher rated speeds are flagged.
pub const LSV_MAX_SPEED_MPH: f64 = 25.0;

/// Motor efficiency below this is accepted with a warning.
pub const SUSPICIOUS_MOTOR_EFFICIENCY: f64 = 0.5;
