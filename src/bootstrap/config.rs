//! Configuration loader.
//!
//! Reads the TOML file named by `WALLET_ONBOARDING_CONFIG` (after loading a
//! `.env` file if present). Without one, the built-in defaults apply.

use std::path::Path;

use anyhow::Context;
use tracing::debug;
use wo_core::AppConfig;

pub const CONFIG_PATH_ENV: &str = "WALLET_ONBOARDING_CONFIG";

/// Load configuration from a TOML file. Missing keys keep their defaults.
pub fn load_config(config_path: &Path) -> anyhow::Result<AppConfig> {
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", config_path.display()))
}

/// Configuration for this process: the file from the environment, or the
/// defaults.
pub fn resolve_config() -> anyhow::Result<AppConfig> {
    if let Ok(path) = dotenvy::dotenv() {
        debug!(path = %path.display(), "loaded .env");
    }
    match std::env::var_os(CONFIG_PATH_ENV) {
        Some(path) => load_config(Path::new(&path)),
        None => Ok(AppConfig::default()),
    }
}
