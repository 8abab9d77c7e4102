//! Telemetry initialization
//!
//! Structured logging through `tracing-subscriber`. `RUST_LOG` wins over
//! the configured filter when both are set.

use tracing_subscriber::EnvFilter;

use crate::config::TelemetryAppConfig;

/// Initialize the global tracing subscriber
///
/// Safe to call once per process; later calls are ignored so tests that
/// each initialize telemetry do not panic.
pub fn init_telemetry(config: &TelemetryAppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.clone()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = if config.json_output {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if result.is_err() {
        tracing::debug!("Telemetry already initialized, keeping existing subscriber");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_initialization_is_harmless() {
        let config = TelemetryAppConfig::default();
        init_telemetry(&config);
        init_telemetry(&config);
    }
}
