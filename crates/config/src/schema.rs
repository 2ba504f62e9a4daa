use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use storefront_types::ClientError;

const ENV_PREFIX: &str = "STOREFRONT_";

fn default_production_domain() -> String {
    "simplylovely.ng".to_string()
}
fn default_production_api() -> String {
    "https://api.simplylovely.ng/api".to_string()
}
fn default_development_api() -> String {
    "http://localhost:5001/api".to_string()
}
fn default_hostname() -> String {
    "localhost".to_string()
}
fn default_refresh_path() -> String {
    "users/refresh-token".to_string()
}

/// Which backend the client talks to when no explicit `api_base` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
}

/// Bounded retry applied by callers that opt in (usage statistics).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first (defaults to 2).
    #[serde(default = "RetryConfig::default_attempts")]
    pub max_attempts: u32,
    /// Fixed pause between attempts in milliseconds (defaults to 1000).
    #[serde(default = "RetryConfig::default_delay_ms")]
    pub delay_ms: u64,
}

impl RetryConfig {
    fn default_attempts() -> u32 {
        2
    }
    fn default_delay_ms() -> u64 {
        1000
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: Self::default_attempts(),
            delay_ms: Self::default_delay_ms(),
        }
    }
}

/// Log output settings for the binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "LogConfig::default_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl LogConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
        }
    }
}

/// Top-level client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Explicit API base URL; overrides hostname-based selection.
    #[serde(default)]
    pub api_base: Option<String>,
    /// Host the client is serving from (defaults to `localhost`).
    #[serde(default = "default_hostname")]
    pub hostname: String,
    #[serde(default = "default_production_domain")]
    pub production_domain: String,
    #[serde(default = "default_production_api")]
    pub production_api: String,
    #[serde(default = "default_development_api")]
    pub development_api: String,
    /// Path of the refresh endpoint relative to the API base.
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
    /// Transport timeout in seconds; unset leaves the HTTP client default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: None,
            hostname: default_hostname(),
            production_domain: default_production_domain(),
            production_api: default_production_api(),
            development_api: default_development_api(),
            refresh_path: default_refresh_path(),
            timeout_secs: None,
            retry: RetryConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Parses configuration from a YAML string, merged with defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the YAML is invalid or extraction fails.
    #[allow(clippy::result_large_err)]
    pub fn from_yaml(yaml: &str) -> Result<Self, figment::Error> {
        use figment::{
            Figment,
            providers::{Format as _, Serialized, Yaml},
        };
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::string(yaml))
            .extract()
    }

    /// Loads defaults, then the YAML file at `path` (if any), then
    /// `STOREFRONT_*` environment variables (`__` separates nested keys,
    /// e.g. `STOREFRONT_RETRY__DELAY_MS`).
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the file cannot be parsed or a value
    /// has the wrong type.
    #[allow(clippy::result_large_err)]
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        use figment::{
            Figment,
            providers::{Env, Format as _, Serialized, Yaml},
        };
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
    }

    /// The environment implied by `hostname`.
    #[must_use]
    pub fn environment(&self) -> Environment {
        if self.hostname == self.production_domain {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    /// The API base URL without a trailing slash.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] if the resolved base is empty or
    /// not an `http(s)` URL.
    pub fn resolve_api_base(&self) -> Result<String, ClientError> {
        let raw = match (&self.api_base, self.environment()) {
            (Some(explicit), _) => explicit.as_str(),
            (None, Environment::Production) => self.production_api.as_str(),
            (None, Environment::Development) => self.development_api.as_str(),
        };
        let base = raw.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(ClientError::Configuration("API base URL is empty".into()));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ClientError::Configuration(format!(
                "API base URL must be http(s): {base}"
            )));
        }
        tracing::debug!(api_base = base, environment = ?self.environment(), "resolved API base");
        Ok(base.to_string())
    }

    /// Full URL of the refresh endpoint.
    ///
    /// # Errors
    ///
    /// Propagates [`Config::resolve_api_base`] failures.
    pub fn refresh_url(&self) -> Result<String, ClientError> {
        Ok(format!(
            "{}/{}",
            self.resolve_api_base()?,
            self.refresh_path.trim_start_matches('/')
        ))
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
