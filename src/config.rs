use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::core::throttle::{ThrottlePolicy, DEFAULT_LOCK_MINUTES, DEFAULT_MAX_ATTEMPTS};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub backend: BackendSettings,
    #[serde(default)]
    pub database: Option<DatabaseSettings>,
    #[serde(default)]
    pub redis: Option<RedisSettings>,
    #[serde(default)]
    pub throttle: ThrottleSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendSettings {
    pub endpoint: String,
    pub api_key: String,
    #[serde(default = "default_vacancies_table")]
    pub vacancies_table: String,
    #[serde(default = "default_postulations_table")]
    pub postulations_table: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_vacancies_table() -> String { "vacantes".to_string() }
fn default_postulations_table() -> String { "postulaciones".to_string() }
fn default_timeout_secs() -> u64 { 30 }

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThrottleSettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_lock_minutes")]
    pub lock_minutes: i64,
    #[serde(default = "default_unlock_tick_ms")]
    pub unlock_tick_ms: u64,
    #[serde(default = "default_idle_ttl_secs")]
    pub idle_ttl_secs: u64,
}

impl Default for ThrottleSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            lock_minutes: default_lock_minutes(),
            unlock_tick_ms: default_unlock_tick_ms(),
            idle_ttl_secs: default_idle_ttl_secs(),
        }
    }
}

impl ThrottleSettings {
    pub fn policy(&self) -> ThrottlePolicy {
        ThrottlePolicy {
            max_attempts: self.max_attempts.max(1),
            lock_duration: chrono::Duration::minutes(self.lock_minutes.max(1)),
        }
    }

    pub fn unlock_tick(&self) -> Duration {
        Duration::from_millis(self.unlock_tick_ms.max(10))
    }
}

fn default_max_attempts() -> u32 { DEFAULT_MAX_ATTEMPTS }
fn default_lock_minutes() -> i64 { DEFAULT_LOCK_MINUTES }
fn default_unlock_tick_ms() -> u64 { 1000 }
fn default_idle_ttl_secs() -> u64 { 3600 }

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringSettings {
    #[serde(default = "default_limit")]
    pub default_limit: u16,
    #[serde(default = "default_max_limit")]
    pub max_limit: u16,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

fn default_limit() -> u16 { 100 }
fn default_max_limit() -> u16 { 500 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with RECRUIT_)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., RECRUIT__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("RECRUIT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("RECRUIT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Apply the conventional unprefixed variables on top of the layered config
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(database_url) = env::var("DATABASE_URL") {
        builder = builder.set_override("database.url", database_url)?;
    }
    if let Ok(redis_url) = env::var("REDIS_URL") {
        builder = builder.set_override("redis.url", redis_url)?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_throttle_settings() {
        let throttle = ThrottleSettings::default();
        assert_eq!(throttle.max_attempts, 5);
        assert_eq!(throttle.lock_minutes, 5);
        assert_eq!(throttle.unlock_tick(), Duration::from_secs(1));
        assert_eq!(throttle.policy(), ThrottlePolicy::default());
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "json");
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("recruit-settings-{}.toml", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[server]
host = "127.0.0.1"
port = 8081

[backend]
endpoint = "https://backend.test"
api_key = "anon"

[throttle]
max_attempts = 3
"#
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.server.port, 8081);
        assert_eq!(settings.backend.postulations_table, "postulaciones");
        assert_eq!(settings.throttle.max_attempts, 3);
        assert_eq!(settings.throttle.lock_minutes, 5);
        assert!(settings.database.is_none());
        assert_eq!(settings.scoring.max_limit, 500);
    }
}
