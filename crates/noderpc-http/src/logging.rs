//! Tracing / logging initialisation helpers.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use noderpc_core::config::ClientConfig;

/// Build the filter: `RUST_LOG` when set, else `level` applied to the
/// noderpc crates.
fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(format!("warn,noderpc_core={level},noderpc_http={level}"))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    })
}

/// Install a fmt subscriber at `level` ("trace" | "debug" | "info" | "warn" | "error").
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing(level: &str) -> bool {
    tracing_subscriber::registry()
        .with(filter(level))
        .with(fmt::layer())
        .try_init()
        .is_ok()
}

/// Install a subscriber at the client's configured `log_level`.
pub fn init_from_config(config: &ClientConfig) -> bool {
    init_tracing(&config.log_level)
}
