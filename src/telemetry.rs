//! Log subscriber setup for embedders.
use crate::config::EngineConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs a fmt subscriber filtered by `RUST_LOG`, or by `filter` when the
/// variable is unset or unparsable.
///
/// Returns `false` when a global subscriber is already installed; calling it
/// again is harmless.
pub fn init_tracing(filter: &str) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .is_ok()
}

/// `init_tracing` with the configured `log_filter`.
pub fn init_from_config(config: &EngineConfig) -> bool {
    init_tracing(&config.log_filter)
}
