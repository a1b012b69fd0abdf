//! Environment variable keys and alias chains.
//!
//! Primary keys use the `WEAVER_*` prefix; aliases are checked in order.

/// Health/status server binding.
pub mod health {
    pub const WEAVER_HEALTH_HOST: &str = "WEAVER_HEALTH_HOST";
    pub const HOST_ALIASES: &[&str] = &["HEALTH_HOST"];

    pub const WEAVER_HEALTH_PORT: &str = "WEAVER_HEALTH_PORT";
    pub const PORT_ALIASES: &[&str] = &["HEALTH_PORT"];
}

/// Logging.
pub mod observability {
    pub const WEAVER_QUIET: &str = "WEAVER_QUIET";

    pub const WEAVER_LOG_LEVEL: &str = "WEAVER_LOG_LEVEL";
    pub const LOG_LEVEL_ALIASES: &[&str] = &["RUST_LOG_LEVEL"];

    pub const WEAVER_LOG_JSON: &str = "WEAVER_LOG_JSON";
}
