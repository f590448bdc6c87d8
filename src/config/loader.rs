//! Configuration loading
//!
//! Loads configuration from JSON files or strings, in the same shape the
//! rest of the crate consumes:
//!
//! ```json
//! {
//!   "rules": [
//!     { "host": "vip.example.com", "tag": "vip", "message": "broadcast %player% joined VIP" },
//!     { "host": "play.example.com", "tag": "" }
//!   ],
//!   "options": { "exclusive": true, "pending_ttl_ms": 30000 }
//! }
//! ```

use std::path::Path;

use tracing::{debug, info};

use super::types::Config;
use crate::error::ConfigError;

/// Load configuration from a JSON file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or parsed, or if
/// validation fails.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();

    debug!("loading configuration from {:?}", path);

    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let contents = std::fs::read_to_string(path)?;
    let config = load_config_str(&contents)?;

    info!(
        rules = config.rules.len(),
        mode = ?config.options.mode,
        "configuration loaded"
    );

    Ok(config)
}

/// Load configuration from a JSON string.
///
/// # Errors
///
/// Returns `ConfigError` if parsing or validation fails.
pub fn load_config_str(json: &str) -> Result<Config, ConfigError> {
    let config: Config =
        serde_json::from_str(json).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    config.validate()?;

    Ok(config)
}
