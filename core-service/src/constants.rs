//! Central Configuration Constants
//!
//! Single source of truth for engine defaults.
//! Env helpers read overrides with fallback to these values.

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "secops-core";

/// Env var holding the path of the engine config file
pub const CONFIG_PATH_ENV: &str = "SECOPS_CONFIG";

/// Env var forcing a fixed simulated stage delay (milliseconds)
pub const STAGE_DELAY_ENV: &str = "SECOPS_STAGE_DELAY_MS";

/// Directory under the user config dir
pub const CONFIG_DIR_NAME: &str = "secops";

/// Config file name inside `CONFIG_DIR_NAME`
pub const CONFIG_FILE_NAME: &str = "engine.json";

/// Default lower bound of a simulated stage delay (ms)
pub const DEFAULT_MIN_STAGE_DELAY_MS: u64 = 800;

/// Default upper bound of a simulated stage delay (ms)
pub const DEFAULT_MAX_STAGE_DELAY_MS: u64 = 1200;

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Fixed stage delay from the environment, if set and numeric
pub fn get_stage_delay_override() -> Option<u64> {
    std::env::var(STAGE_DELAY_ENV)
        .ok()
        .and_then(|s| s.trim().parse().ok())
}

/// Config path from the environment, if set and non-empty
pub fn get_config_path() -> Option<std::path::PathBuf> {
    std::env::var(CONFIG_PATH_ENV)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(std::path::PathBuf::from)
}
