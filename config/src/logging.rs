use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{ConfigError, LogFormat, LoggingConfig};

/// Filter directive for a logging config: the explicit filter wins over the level.
#[must_use]
pub fn filter_directive(config: &LoggingConfig) -> String {
    if config.filter.is_empty() {
        config.level.as_str().to_string()
    } else {
        config.filter.clone()
    }
}

/// Install the global `tracing` subscriber.
///
/// Fails if a subscriber is already installed, which callers such as test
/// suites may ignore.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ConfigError> {
    let filter = EnvFilter::try_new(filter_directive(config))
        .map_err(|e| ConfigError::InvalidValue(format!("log filter: {e}")))?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer().pretty()).try_init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init(),
    };
    result.map_err(|e| ConfigError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LogLevel;

    #[test]
    fn level_used_without_filter() {
        let config = LoggingConfig {
            level: LogLevel::Warn,
            ..LoggingConfig::default()
        };
        assert_eq!(filter_directive(&config), "warn");
    }

    #[test]
    fn explicit_filter_wins() {
        let config = LoggingConfig {
            level: LogLevel::Warn,
            filter: "myem_sync=debug,lapin=warn".into(),
            ..LoggingConfig::default()
        };
        assert_eq!(filter_directive(&config), "myem_sync=debug,lapin=warn");
    }

    #[test]
    fn invalid_filter_is_rejected() {
        let config = LoggingConfig {
            filter: "myem_sync=notalevel".into(),
            ..LoggingConfig::default()
        };
        assert!(matches!(
            init_logging(&config),
            Err(ConfigError::InvalidValue(_))
        ));
    }
}
