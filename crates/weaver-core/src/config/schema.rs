//! Configuration structs grouped by concern, loaded from the environment.

use super::env_keys::{health, observability as obv_keys};
use super::loader::{env_bool, env_or, env_parse};

pub const DEFAULT_HEALTH_HOST: &str = "0.0.0.0";
pub const DEFAULT_HEALTH_PORT: u16 = 18790;

/// Bind address of the status server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HEALTH_HOST.to_string(),
            port: DEFAULT_HEALTH_PORT,
        }
    }
}

impl HealthConfig {
    /// Load from the environment (also loads `.env`).
    pub fn from_env() -> Self {
        super::loader::load_dotenv();
        Self {
            host: env_or(health::WEAVER_HEALTH_HOST, health::HOST_ALIASES, || {
                DEFAULT_HEALTH_HOST.to_string()
            }),
            port: env_parse(
                health::WEAVER_HEALTH_PORT,
                health::PORT_ALIASES,
                DEFAULT_HEALTH_PORT,
            ),
        }
    }

    /// Apply CLI overrides on top of the environment values.
    #[must_use]
    pub fn with_overrides(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    /// `host:port` as passed to the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging: quiet, log_level, log_json.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub quiet: bool,
    pub log_level: String,
    pub log_json: bool,
}

/// Default filter. `rest` is the target the chat endpoint logs under.
pub const DEFAULT_LOG_LEVEL: &str = "weaver=info,rest=info";

impl ObservabilityConfig {
    /// Loaded once and cached for the lifetime of the process.
    pub fn from_env() -> &'static Self {
        use std::sync::OnceLock;
        static CACHE: OnceLock<ObservabilityConfig> = OnceLock::new();
        CACHE.get_or_init(|| {
            super::loader::load_dotenv();
            Self {
                quiet: env_bool(obv_keys::WEAVER_QUIET, &[], false),
                log_level: env_or(
                    obv_keys::WEAVER_LOG_LEVEL,
                    obv_keys::LOG_LEVEL_ALIASES,
                    || DEFAULT_LOG_LEVEL.to_string(),
                ),
                log_json: env_bool(obv_keys::WEAVER_LOG_JSON, &[], false),
            }
        })
    }
}
