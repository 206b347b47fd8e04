//! # Configuration Module
//!
//! Settings are layered: built-in defaults, then an optional JSON file, then
//! environment variables (a `.env` file is honoured via `dotenvy`).
//!
//! | Variable                 | Field                   |
//! |--------------------------|-------------------------|
//! | `STOREBOT_REDIS_URL`     | `redisUrl`              |
//! | `STOREBOT_ADMIN_IDS`     | `quota.adminIds` (csv)  |
//! | `STOREBOT_DAILY_LIMIT`   | `quota.dailyLimit`      |
//! | `STOREBOT_LOG_LEVEL`     | `logLevel`              |
//! | `STOREBOT_CACHE_VERSION` | `cache.schemaVersion`   |

/// The settings model and its defaults.
pub mod settings;

pub use settings::{BotSettings, CacheSettings, QuotaSettings, UpstreamSettings};

use std::path::{Path, PathBuf};
use std::{env, fs, io};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Loads settings from `path` (if given and present) and the process
/// environment.
pub fn load_settings(path: Option<&Path>) -> Result<BotSettings, ConfigError> {
    // A missing .env is normal.
    if let Ok(env_file) = dotenvy::dotenv() {
        debug!(path = %env_file.display(), "loaded .env");
    }
    let mut settings = match path {
        Some(p) => read_file(p)?,
        None => BotSettings::default(),
    };
    apply_env_overrides(&mut settings, |var| env::var(var).ok())?;
    Ok(settings)
}

fn read_file(path: &Path) -> Result<BotSettings, ConfigError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(BotSettings::default());
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Applies `STOREBOT_*` overrides read through `lookup`. Empty values are
/// ignored.
pub fn apply_env_overrides<F>(settings: &mut BotSettings, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(url) = get("STOREBOT_REDIS_URL") {
        settings.redis_url = Some(url);
    }
    if let Some(ids) = get("STOREBOT_ADMIN_IDS") {
        settings.quota.admin_ids = ids
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
    }
    if let Some(limit) = get("STOREBOT_DAILY_LIMIT") {
        settings.quota.daily_limit = limit.parse().map_err(|_| ConfigError::InvalidEnv {
            var: "STOREBOT_DAILY_LIMIT",
            value: limit.clone(),
        })?;
    }
    if let Some(level) = get("STOREBOT_LOG_LEVEL") {
        settings.log_level = level;
    }
    if let Some(version) = get("STOREBOT_CACHE_VERSION") {
        settings.cache.schema_version = version;
    }
    Ok(())
}
