//! Logging setup for binaries and tests that embed the runner.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` (e.g.
/// `"surgelab_runner=info"`) applies. Fails if a subscriber is already
/// installed, which callers may ignore.
pub fn init_logging(default_filter: &str) -> Result<(), TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .try_init()
}
