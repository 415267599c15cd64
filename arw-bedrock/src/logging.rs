//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins over `general.log_level` when set. Installing twice is a
//! no-op, so tests and embedders can call [`init_tracing`] freely.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use arw_core::config::GeneralConfig;

/// Install the global subscriber. Returns `false` if one was already set.
pub fn init_tracing(general: &GeneralConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("arw_core={0},arw_bedrock={0}", general.log_level)));

    let registry = tracing_subscriber::registry().with(filter);
    if general.json_logs {
        registry.with(fmt::layer().json().with_target(true)).try_init().is_ok()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init().is_ok()
    }
}
