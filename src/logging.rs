use tracing_subscriber::{fmt, EnvFilter};

use crate::config::AppConfig;

/// Installs the global tracing subscriber.
///
/// The filter honors `RUST_LOG` when set, falling back to the configured
/// level. Safe to call more than once; later calls are no-ops.
pub fn init_telemetry(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    let builder = fmt().with_env_filter(filter).with_target(true);

    let result = if config.log_json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
