//! Logging setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const LOG_ENV: &str = "SHUTTER_LOG";

/// Log to stderr, filtered by the `SHUTTER_LOG` environment variable
/// (`info` when unset or unparseable), e.g. `SHUTTER_LOG=shutter_library=debug`.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}
