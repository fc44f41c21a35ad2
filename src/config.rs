use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;
use crate::core::{DEFAULT_CANDIDATE_FETCH_LIMIT, DEFAULT_HISTORY_WINDOW, DEFAULT_MATCH_LIMIT};
use crate::models::PreferenceDefaults;

const ENV_PREFIX: &str = "SMART_MATCH";

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub rest: RestSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub defaults: PreferenceDefaults,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

/// Which data store backend serves the match reads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Rest,
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: StoreBackend,
    /// JSON fixture loaded by the memory backend
    pub fixture_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestSettings {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub tables: TableSettings,
}

impl Default for RestSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            request_timeout_secs: default_request_timeout_secs(),
            tables: TableSettings::default(),
        }
    }
}

fn default_request_timeout_secs() -> u64 { 10 }

#[derive(Debug, Clone, Deserialize)]
pub struct TableSettings {
    #[serde(default = "default_preferences_table")]
    pub preferences: String,
    #[serde(default = "default_profiles_table")]
    pub profiles: String,
    #[serde(default = "default_bookings_table")]
    pub bookings: String,
    #[serde(default = "default_tasks_table")]
    pub tasks: String,
    #[serde(default = "default_match_logs_table")]
    pub match_logs: String,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            preferences: default_preferences_table(),
            profiles: default_profiles_table(),
            bookings: default_bookings_table(),
            tasks: default_tasks_table(),
            match_logs: default_match_logs_table(),
        }
    }
}

fn default_preferences_table() -> String { "match_preferences".to_string() }
fn default_profiles_table() -> String { "profiles".to_string() }
fn default_bookings_table() -> String { "bookings".to_string() }
fn default_tasks_table() -> String { "tasks".to_string() }
fn default_match_logs_table() -> String { "match_logs".to_string() }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default)]
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub audience: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_candidate_fetch_limit")]
    pub candidate_fetch_limit: usize,
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    #[serde(default = "default_match_limit")]
    pub default_limit: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
    #[serde(default = "default_audit_timeout_ms")]
    pub audit_timeout_ms: u64,
    /// Score from the stored profile location when the request has none
    #[serde(default)]
    pub use_profile_location: bool,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            candidate_fetch_limit: default_candidate_fetch_limit(),
            history_window: default_history_window(),
            default_limit: default_match_limit(),
            max_limit: default_max_limit(),
            store_timeout_ms: default_store_timeout_ms(),
            audit_timeout_ms: default_audit_timeout_ms(),
            use_profile_location: false,
        }
    }
}

impl MatchingSettings {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn audit_timeout(&self) -> Duration {
        Duration::from_millis(self.audit_timeout_ms)
    }

    /// Effective result limit for a request
    pub fn resolve_limit(&self, requested: Option<u32>) -> usize {
        requested
            .map(|l| l as usize)
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit.max(1))
    }
}

fn default_candidate_fetch_limit() -> usize { DEFAULT_CANDIDATE_FETCH_LIMIT }
fn default_history_window() -> usize { DEFAULT_HISTORY_WINDOW }
fn default_match_limit() -> usize { DEFAULT_MATCH_LIMIT }
fn default_max_limit() -> usize { 100 }
fn default_store_timeout_ms() -> u64 { 3000 }
fn default_audit_timeout_ms() -> u64 { 5000 }

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
    /// 4. Environment variables (prefixed with SMART_MATCH__)
    /// 5. Well-known variables: DATABASE_URL, SUPABASE_URL, SUPABASE_SERVICE_KEY, JWT_SECRET
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., SMART_MATCH__SERVER__PORT -> server.port
            .add_source(environment())
            .build()?;

        settings = apply_env_overrides(settings)?;

        settings.try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Apply the conventional variable names used by the hosting platform
fn apply_env_overrides(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let overrides = [
        ("DATABASE_URL", "database.url"),
        ("SUPABASE_URL", "rest.url"),
        ("SUPABASE_SERVICE_KEY", "rest.api_key"),
        ("JWT_SECRET", "auth.jwt_secret"),
    ];

    let mut builder = Config::builder().add_source(settings);
    for (var, key) in overrides {
        if let Ok(value) = env::var(var) {
            builder = builder.set_override(key, value)?;
        }
    }

    builder.build()
}
