//! Logger setup. Application code logs through the `log` macros,
//! the subscriber installed here picks those records up as well.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use config::Logging;

const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber. `RUST_LOG` wins over the configured filter.
pub fn init(config: Option<&Logging>) {
    let configured = config.map(|c| c.filter.clone()).unwrap_or_else(|| DEFAULT_FILTER.to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(configured));
    let registry = tracing_subscriber::registry().with(filter);

    let initialized = if config.map(|c| c.json).unwrap_or(false) {
        registry.with(fmt::layer().json().with_current_span(false)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true).with_line_number(true)).try_init()
    };

    if let Err(e) = initialized {
        eprintln!("Logger is already initialized: {}", e);
    }
}
