//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,
    /// Background job configuration.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Optional super admin seeded at startup.
    #[serde(default)]
    pub bootstrap: Option<BootstrapAdminConfig>,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory holding the HTML/CSS/JS pages.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Where sessions are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    /// Process-local map. Single instance only.
    #[default]
    Memory,
    /// Shared Redis store, for running several instances.
    Redis,
}

/// Session configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Cookie carrying the session id.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Session lifetime in hours.
    #[serde(default = "default_session_ttl_hours")]
    pub ttl_hours: u64,
    /// Set the `Secure` attribute on the cookie.
    #[serde(default)]
    pub secure_cookie: bool,
    /// Store backend.
    #[serde(default)]
    pub backend: SessionBackend,
    /// Redis URL, required for the redis backend.
    #[serde(default)]
    pub redis_url: Option<String>,
    /// Key prefix for sessions kept in Redis.
    #[serde(default = "default_session_prefix")]
    pub prefix: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            ttl_hours: default_session_ttl_hours(),
            secure_cookie: false,
            backend: SessionBackend::Memory,
            redis_url: None,
            prefix: default_session_prefix(),
        }
    }
}

/// Scheduler configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Whether background jobs run at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds between expired-event sweeps.
    #[serde(default = "default_conclude_interval")]
    pub conclude_interval_secs: u64,
    /// Seconds between in-memory session purges.
    #[serde(default = "default_session_purge_interval")]
    pub session_purge_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            conclude_interval_secs: default_conclude_interval(),
            session_purge_interval_secs: default_session_purge_interval(),
        }
    }
}

/// Super admin account created on startup when absent.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapAdminConfig {
    /// Admin username.
    pub username: String,
    /// Login email.
    pub email: String,
    /// Plain-text password, hashed before storage.
    pub password: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> String {
    "public".to_string()
}

const fn default_max_connections() -> u32 {
    10
}

const fn default_min_connections() -> u32 {
    1
}

fn default_cookie_name() -> String {
    "reelhouse_sid".to_string()
}

const fn default_session_ttl_hours() -> u64 {
    24
}

fn default_session_prefix() -> String {
    "reelhouse:session".to_string()
}

const fn default_true() -> bool {
    true
}

const fn default_conclude_interval() -> u64 {
    60
}

const fn default_session_purge_interval() -> u64 {
    600
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `REELHOUSE_ENV`)
    /// 4. Environment variables with `REELHOUSE__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("REELHOUSE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("REELHOUSE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("REELHOUSE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_fills_defaults() {
        let raw = r#"
            [server]
            [database]
            url = "postgres://localhost/reelhouse"
        "#;

        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.static_dir, "public");
        assert_eq!(config.session.ttl_hours, 24);
        assert_eq!(config.session.backend, SessionBackend::Memory);
        assert!(config.scheduler.enabled);
        assert!(config.bootstrap.is_none());
    }

    #[test]
    fn test_redis_session_backend() {
        let raw = r#"
            [server]
            port = 8080
            [database]
            url = "postgres://localhost/reelhouse"
            [session]
            backend = "redis"
            redis_url = "redis://localhost:6379"
        "#;

        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.session.backend, SessionBackend::Redis);
        assert_eq!(
            config.session.redis_url.as_deref(),
            Some("redis://localhost:6379")
        );
        assert_eq!(config.session.cookie_name, "reelhouse_sid");
    }
}
