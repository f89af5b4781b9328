//! Log output for the command line
//!
//! Diagnostics go to stderr so command output on stdout stays clean.

use std::io;
use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration for the CLI
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "warn", "debug")
    pub level: String,
    /// Enable JSON structured logging (vs plain text)
    pub json_format: bool,
    /// Environment filter, overrides `level` when set
    pub env_filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json_format: false,
            env_filter: None,
        }
    }
}

impl LoggingConfig {
    /// Debug output for the revision crates, warnings for everything else
    pub fn verbose() -> Self {
        Self {
            level: "debug".to_string(),
            env_filter: Some("warn,elif=debug".to_string()),
            ..Self::default()
        }
    }

    pub fn with_json(mut self, json_format: bool) -> Self {
        self.json_format = json_format;
        self
    }

    /// Filter used when `RUST_LOG` is not set
    pub fn filter(&self) -> &str {
        self.env_filter.as_deref().unwrap_or(&self.level)
    }
}

/// Initialize logging for the process
pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(config.filter()))?;

    if config.json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stderr).json())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stderr).without_time())
            .try_init()?;
    }

    tracing::debug!(
        target: "elif::logging",
        "Logging initialized (filter: {}, format: {})",
        config.filter(),
        if config.json_format { "JSON" } else { "text" }
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(LoggingConfig::default().filter(), "warn");
    }

    #[test]
    fn test_verbose_filter() {
        let config = LoggingConfig::verbose().with_json(true);

        assert_eq!(config.filter(), "warn,elif=debug");
        assert!(config.json_format);
    }
}
