//! Application-level configuration loading: store location, room lifetime and upstream policy.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::dao::{bgg::BggConfig, room_store::memory::DEFAULT_SWEEP_INTERVAL};

/// Default location on disk where the library looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BGCHOOSER_CONFIG_PATH";
/// Environment variable that overrides the configured Redis URL.
const REDIS_URL_ENV: &str = "REDIS_URL";
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
/// Rooms nobody touched for this long disappear from the store.
pub const DEFAULT_ROOM_TTL: Duration = Duration::from_secs(14 * 24 * 60 * 60);

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Connection URL of the Redis room store.
    pub redis_url: String,
    /// Inactivity window after which a room's keys expire.
    pub room_ttl: Duration,
    /// How often the in-process store drops expired rooms nobody touches anymore.
    pub sweep_interval: Duration,
    /// Upstream inventory service settings.
    pub bgg: BggConfig,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    ///
    /// `REDIS_URL` always wins over the file so deployments can point at a store without
    /// shipping a config file.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        if let Some(url) = env::var(REDIS_URL_ENV).ok().filter(|url| !url.trim().is_empty()) {
            config.redis_url = url;
        }
        config
    }

    /// Parse a JSON document; omitted fields keep their defaults.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            redis_url: DEFAULT_REDIS_URL.to_owned(),
            room_ttl: DEFAULT_ROOM_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            bgg: BggConfig::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    redis_url: Option<String>,
    room_ttl_secs: Option<u64>,
    sweep_interval_secs: Option<u64>,
    bgg: RawBggConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawBggConfig {
    base_url: Option<String>,
    max_attempts: Option<u32>,
    retry_delay_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
    identity_header: Option<String>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            redis_url: raw.redis_url.unwrap_or(defaults.redis_url),
            room_ttl: raw
                .room_ttl_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.room_ttl),
            sweep_interval: raw
                .sweep_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
            bgg: raw.bgg.into(),
        }
    }
}

impl From<RawBggConfig> for BggConfig {
    fn from(raw: RawBggConfig) -> Self {
        let defaults = BggConfig::default();
        Self {
            base_url: raw.base_url.unwrap_or(defaults.base_url),
            max_attempts: raw.max_attempts.unwrap_or(defaults.max_attempts).max(1),
            retry_delay: raw
                .retry_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_delay),
            request_timeout: raw
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            identity_header: raw.identity_header.unwrap_or(defaults.identity_header),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
