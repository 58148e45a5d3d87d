//! Log output for the server.
//!
//! Filtering follows `RUST_LOG` when set and falls back to
//! [`DEFAULT_FILTER`]. Encoder failures are only ever visible here.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::config::LogFormat;

pub const DEFAULT_FILTER: &str = "qirust_server=info,tower_http=info";

/// Installs the global subscriber.
///
/// # Errors
///
/// Fails if a global subscriber has already been set.
pub fn init_telemetry(format: LogFormat) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .compact(),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .json(),
            )
            .try_init(),
    }
}
