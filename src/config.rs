//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub age: AgeConfig,

    #[serde(default)]
    pub discord: DiscordSettings,

    #[serde(default)]
    pub admin: AdminConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins; empty means any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_max_body_bytes() -> usize {
    1024 * 1024 // 1 MiB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// SQLite database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    /// Create tables when the database has none
    #[serde(default = "default_allow_create")]
    pub allow_create: bool,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("/data/reject.db")
}

fn default_allow_create() -> bool {
    true
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            allow_create: default_allow_create(),
        }
    }
}

/// Structure-age index configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AgeConfig {
    /// CSV of `structure_id,first_seen`
    #[serde(default = "default_age_csv")]
    pub csv_path: PathBuf,
}

fn default_age_csv() -> PathBuf {
    PathBuf::from("data").join("a4e_first_seen_monotone.csv")
}

impl Default for AgeConfig {
    fn default() -> Self {
        Self {
            csv_path: default_age_csv(),
        }
    }
}

/// Discord webhook configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordSettings {
    /// Webhook URL; contact requests fail with 500 when unset
    #[serde(default)]
    pub webhook_url: Option<String>,

    #[serde(default = "default_discord_username")]
    pub username: String,

    #[serde(default = "default_discord_timeout")]
    pub request_timeout_ms: u64,
}

fn default_discord_username() -> String {
    "SALT MINER WOOOO".to_string()
}

fn default_discord_timeout() -> u64 {
    10_000
}

impl Default for DiscordSettings {
    fn default() -> Self {
        Self {
            webhook_url: None,
            username: default_discord_username(),
            request_timeout_ms: default_discord_timeout(),
        }
    }
}

/// Admin panel credentials (HTTP Basic)
#[derive(Clone, Default, Deserialize)]
pub struct AdminConfig {
    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub pass: Option<String>,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("user", &self.user)
            .field("pass", &self.pass.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub fn filter_directive(&self) -> String {
        format!("reject={},tower_http={}", self.level, self.level)
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse { error, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                error,
            },
            other => other,
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            error: e.to_string(),
        })
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from an explicit path, the default locations, or environment
    pub fn load_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_with_env(path);
        }

        let config_paths = [
            dirs::config_dir().map(|p| p.join("reject").join("config.toml")),
            Some(PathBuf::from("/etc/reject/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Ok(Self::from_env())
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup. The first key listed for a
    /// setting wins over the legacy names after it.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| keys.iter().find_map(|k| lookup(k));

        // Server overrides
        if let Some(host) = first(&["REJECT_HOST"]) {
            self.server.host = host;
        }
        if let Some(port) = first(&["REJECT_PORT", "PORT"]) {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }

        // Storage overrides
        if let Some(path) = first(&["REJECT_DB_PATH", "DB_PATH"]) {
            self.database.path = PathBuf::from(path);
        }
        if let Some(path) = first(&["REJECT_AGE_CSV", "A4E_AGE_CSV"]) {
            self.age.csv_path = PathBuf::from(path);
        }

        // Discord overrides
        if let Some(url) = first(&["REJECT_DISCORD_WEBHOOK", "DISCORD_WEBHOOK_URL"]) {
            if !url.trim().is_empty() {
                self.discord.webhook_url = Some(url);
            }
        }

        // Admin credentials
        if let Some(user) = first(&["ADMIN_USER"]) {
            self.admin.user = Some(user);
        }
        if let Some(pass) = first(&["ADMIN_PASS"]) {
            self.admin.pass = Some(pass);
        }

        // Logging overrides
        if let Some(level) = first(&["REJECT_LOG_LEVEL"]) {
            self.logging.level = level;
        }
        if let Some(format) = first(&["REJECT_LOG_FORMAT"]) {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Reject Configuration
#
# Environment variables override these settings:
# - REJECT_HOST, REJECT_PORT
# - REJECT_DB_PATH (or DB_PATH)
# - REJECT_AGE_CSV (or A4E_AGE_CSV)
# - REJECT_DISCORD_WEBHOOK (or DISCORD_WEBHOOK_URL)
# - ADMIN_USER, ADMIN_PASS
# - REJECT_LOG_LEVEL, REJECT_LOG_FORMAT

[server]
# API server host
host = "0.0.0.0"

# API server port
port = 4000

# Allowed CORS origins (empty = any)
cors_origins = []

# Maximum JSON body size (bytes)
max_body_bytes = 1048576

[database]
# SQLite file holding systems and structures
path = "/data/reject.db"

# Create tables if the database is empty
allow_create = true

[age]
# Structure first-seen export (structure_id,first_seen)
csv_path = "data/a4e_first_seen_monotone.csv"

[discord]
# Webhook for negotiation requests
# webhook_url = "https://discord.com/api/webhooks/..."

# Bot display name
username = "SALT MINER WOOOO"

# Request timeout in milliseconds
request_timeout_ms = 10000

[admin]
# HTTP Basic credentials for /api/admin
# user = "admin"
# pass = "change-me"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
