//! Tracing subscriber setup for host applications.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

use crate::config::{ClientConfig, LogFormat};

/// Installs the global tracing subscriber.
///
/// The filter comes from the configured `RUST_LOG` directive and falls back
/// to `info` when the directive does not parse. Fails if a subscriber is
/// already installed.
pub fn init_tracing(config: &ClientConfig) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        let config = ClientConfig {
            log_level: "not a [directive".to_string(),
            ..ClientConfig::default()
        };
        // Another test may have installed a subscriber first.
        let _ = init_tracing(&config);
        assert!(init_tracing(&config).is_err());
    }
}
