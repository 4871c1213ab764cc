use std::env;
use std::fmt;
use std::num::NonZeroU32;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use humantime_serde::re::humantime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::ConfigError;

pub const PRODUCTION_BASE_URL: &str = "https://api.autopay.com";
pub const SANDBOX_BASE_URL: &str = "https://sandbox-api.autopay.com";

/// Prefix of every environment variable read by [`Config::from_env`]
const ENV_PREFIX: &str = "AUTOPAY_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Sandbox,
    Production,
}

impl Environment {
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Sandbox => SANDBOX_BASE_URL,
            Self::Production => PRODUCTION_BASE_URL,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sandbox => "sandbox",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sandbox" => Ok(Self::Sandbox),
            "production" => Ok(Self::Production),
            _ => Err(ConfigError::InvalidValue {
                key: "environment".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Client configuration.
///
/// Durations are written in humantime form (`"30s"`, `"1m 30s"`) in TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Empty means "derive from `environment`"
    pub base_url: String,
    pub api_key: String,
    pub secret_key: String,
    pub environment: Environment,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub read_timeout: Duration,
    pub max_idle_conns_per_host: usize,
    #[serde(with = "humantime_serde")]
    pub idle_conn_timeout: Duration,
    /// Requests per second across the whole client
    pub rate_limit: u32,
    pub rate_burst: u32,
    /// Default worker budget for batch calls
    pub max_workers: usize,
    pub enable_logging: bool,
    pub log_level: String,
    pub skip_tls_verify: bool,
    pub proxy_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            secret_key: String::new(),
            environment: Environment::default(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
            max_idle_conns_per_host: 30,
            idle_conn_timeout: Duration::from_secs(90),
            rate_limit: 100,
            rate_burst: 20,
            max_workers: 10,
            enable_logging: true,
            log_level: "info".to_string(),
            skip_tls_verify: false,
            proxy_url: None,
        }
    }
}

impl Config {
    pub fn new(
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
        environment: Environment,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            environment,
            ..Default::default()
        }
    }

    pub fn sandbox(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self::new(api_key, secret_key, Environment::Sandbox)
    }

    pub fn production(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self::new(api_key, secret_key, Environment::Production)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: u32, rate_burst: u32) -> Self {
        self.rate_limit = rate_limit;
        self.rate_burst = rate_burst;
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Base URL in effect, without a trailing slash
    pub fn effective_base_url(&self) -> &str {
        if self.base_url.is_empty() {
            self.environment.base_url()
        } else {
            self.base_url.trim_end_matches('/')
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.secret_key.is_empty() {
            return Err(ConfigError::MissingSecretKey);
        }
        self.rate_quota()?;
        Ok(())
    }

    /// `(rate_limit, rate_burst)` as non-zero values for the rate gate
    pub fn rate_quota(&self) -> Result<(NonZeroU32, NonZeroU32), ConfigError> {
        let rate = NonZeroU32::new(self.rate_limit).ok_or(ConfigError::ZeroLimit("rate_limit"))?;
        let burst = NonZeroU32::new(self.rate_burst).ok_or(ConfigError::ZeroLimit("rate_burst"))?;
        Ok((rate, burst))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading config file");
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Defaults overridden by `AUTOPAY_*` variables, after loading `.env` if present
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source; unset or empty keys keep defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}")).filter(|value| !value.trim().is_empty())
        };
        let mut config = Self::default();

        if let Some(v) = get("BASE_URL") {
            config.base_url = v;
        }
        if let Some(v) = get("API_KEY") {
            config.api_key = v;
        }
        if let Some(v) = get("SECRET_KEY") {
            config.secret_key = v;
        }
        if let Some(v) = get("ENVIRONMENT") {
            config.environment = v.parse()?;
        }
        if let Some(v) = get("TIMEOUT") {
            config.timeout = parse_duration("TIMEOUT", &v)?;
        }
        if let Some(v) = get("CONNECT_TIMEOUT") {
            config.connect_timeout = parse_duration("CONNECT_TIMEOUT", &v)?;
        }
        if let Some(v) = get("READ_TIMEOUT") {
            config.read_timeout = parse_duration("READ_TIMEOUT", &v)?;
        }
        if let Some(v) = get("IDLE_CONN_TIMEOUT") {
            config.idle_conn_timeout = parse_duration("IDLE_CONN_TIMEOUT", &v)?;
        }
        if let Some(v) = get("MAX_IDLE_CONNS_PER_HOST") {
            config.max_idle_conns_per_host = parse_number("MAX_IDLE_CONNS_PER_HOST", &v)?;
        }
        if let Some(v) = get("RATE_LIMIT") {
            config.rate_limit = parse_number("RATE_LIMIT", &v)?;
        }
        if let Some(v) = get("RATE_BURST") {
            config.rate_burst = parse_number("RATE_BURST", &v)?;
        }
        if let Some(v) = get("MAX_WORKERS") {
            config.max_workers = parse_number("MAX_WORKERS", &v)?;
        }
        if let Some(v) = get("ENABLE_LOGGING") {
            config.enable_logging = parse_bool("ENABLE_LOGGING", &v)?;
        }
        if let Some(v) = get("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Some(v) = get("SKIP_TLS_VERIFY") {
            config.skip_tls_verify = parse_bool("SKIP_TLS_VERIFY", &v)?;
        }
        if let Some(v) = get("PROXY_URL") {
            config.proxy_url = Some(v);
        }

        Ok(config)
    }
}

fn invalid(name: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: format!("{ENV_PREFIX}{name}"),
        value: value.to_string(),
    }
}

fn parse_duration(name: &str, value: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value.trim()).map_err(|_| invalid(name, value))
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| invalid(name, value))
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(invalid(name, value)),
    }
}
