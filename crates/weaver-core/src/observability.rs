//! Observability: tracing initialization.
//!
//! Uses `config::ObservabilityConfig` for WEAVER_QUIET, WEAVER_LOG_LEVEL and WEAVER_LOG_JSON.

use tracing_subscriber::{prelude::*, EnvFilter};

/// Initialize tracing. Call once at process startup; later calls are no-ops.
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing() {
    let cfg = crate::config::ObservabilityConfig::from_env();
    let level = filter_directive(cfg.quiet, &cfg.log_level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let _ = if cfg.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .try_init()
    };
}

/// Quiet mode keeps warnings from our own targets only; otherwise the
/// configured level plus per-request spans from the HTTP layer.
fn filter_directive(quiet: bool, log_level: &str) -> String {
    if quiet {
        "weaver=warn,rest=warn".to_string()
    } else {
        format!("{},tower_http=debug", log_level)
    }
}
