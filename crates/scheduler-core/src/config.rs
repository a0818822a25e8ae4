//! Layered settings loader: defaults, then an optional JSON file, then
//! environment variables. Unlike the loader this repository's ancestry
//! once used, secret-shaped values are never logged.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_path: String,
    pub bind_addr: String,
    pub log_level: String,
    pub timezone: String,
    pub api_key: Option<String>,
    pub cors_allowed_origins: Vec<String>,
    #[serde(with = "duration_secs")]
    pub tick_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "scheduler.db".to_string(),
            bind_addr: "127.0.0.1:8080".to_string(),
            log_level: "info".to_string(),
            timezone: "UTC".to_string(),
            api_key: None,
            // Deliberately not `["*"]`: an empty allow-list means
            // same-origin only until an operator opts in explicitly.
            cors_allowed_origins: Vec::new(),
            tick_interval: Duration::from_secs(60),
        }
    }
}

impl Config {
    /// Load defaults, then overlay a JSON config file if one exists at
    /// `path`, then overlay `SCHED_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(path) = path {
            if path.exists() {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| ConfigError::Io(path.display().to_string(), e.to_string()))?;
                let file_config: PartialConfig = serde_json::from_str(&text)
                    .map_err(|e| ConfigError::Parse(path.display().to_string(), e.to_string()))?;
                file_config.apply(&mut config);
            }
        }

        apply_env(&mut config);

        if config.database_path.trim().is_empty() {
            return Err(ConfigError::Invalid("database_path must not be empty".into()));
        }

        Ok(config)
    }

    /// Whether mutating API routes require an `X-Api-Key` header.
    pub fn auth_required(&self) -> bool {
        self.api_key.is_some()
    }
}

/// A config file only ever overrides the fields it names; absent fields
/// fall through to whatever came before (defaults, in practice).
#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    database_path: Option<String>,
    bind_addr: Option<String>,
    log_level: Option<String>,
    timezone: Option<String>,
    api_key: Option<String>,
    cors_allowed_origins: Option<Vec<String>>,
    tick_interval_secs: Option<u64>,
}

impl PartialConfig {
    fn apply(self, config: &mut Config) {
        if let Some(v) = self.database_path {
            config.database_path = v;
        }
        if let Some(v) = self.bind_addr {
            config.bind_addr = v;
        }
        if let Some(v) = self.log_level {
            config.log_level = v;
        }
        if let Some(v) = self.timezone {
            config.timezone = v;
        }
        if let Some(v) = self.api_key {
            config.api_key = Some(v);
        }
        if let Some(v) = self.cors_allowed_origins {
            config.cors_allowed_origins = v;
        }
        if let Some(v) = self.tick_interval_secs {
            config.tick_interval = Duration::from_secs(v);
        }
    }
}

fn apply_env(config: &mut Config) {
    if let Ok(v) = std::env::var("SCHED_DATABASE_PATH") {
        config.database_path = v;
    }
    if let Ok(v) = std::env::var("SCHED_BIND_ADDR") {
        config.bind_addr = v;
    }
    if let Ok(v) = std::env::var("SCHED_LOG_LEVEL") {
        config.log_level = v;
    }
    if let Ok(v) = std::env::var("SCHED_TIMEZONE") {
        config.timezone = v;
    }
    if let Ok(v) = std::env::var("SCHED_API_KEY") {
        // Never logged: presence is observable via `auth_required()`,
        // the value itself never is.
        config.api_key = Some(v);
    }
    if let Ok(v) = std::env::var("SCHED_CORS_ALLOWED_ORIGINS") {
        config.cors_allowed_origins = v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
    }
    if let Ok(v) = std::env::var("SCHED_TICK_INTERVAL_SECS") {
        if let Ok(secs) = v.parse::<u64>() {
            config.tick_interval = Duration::from_secs(secs);
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Io(String, String),
    #[error("failed to parse config file {0}: {1}")]
    Parse(String, String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cors_is_not_wildcard() {
        let config = Config::default();
        assert!(config.cors_allowed_origins.is_empty());
    }

    #[test]
    fn test_default_database_path_is_valid() {
        assert!(Config::load(None).is_ok());
    }

    #[test]
    fn test_auth_required_tracks_api_key() {
        let mut config = Config::default();
        assert!(!config.auth_required());
        config.api_key = Some("k".into());
        assert!(config.auth_required());
    }

    #[test]
    fn test_env_override_database_path() {
        std::env::set_var("SCHED_DATABASE_PATH", "/tmp/test_sched_env.db");
        let config = Config::load(None).unwrap();
        assert_eq!(config.database_path, "/tmp/test_sched_env.db");
        std::env::remove_var("SCHED_DATABASE_PATH");
    }

    #[test]
    fn test_file_config_overlay() {
        let dir = std::env::temp_dir();
        let path = dir.join("sched_test_config.json");
        std::fs::write(&path, r#"{"bind_addr": "0.0.0.0:9090"}"#).unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:9090");
        std::fs::remove_file(&path).ok();
    }
}
