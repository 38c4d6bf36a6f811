//! The root configuration type.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use storefront_telemetry::{create_env_filter, LogFormat};

use crate::{ConfigError, LoggingConfig, ScraperConfig, ServerConfig};

/// Complete service configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and the
/// environment.
///
/// # Example
///
/// ```
/// use storefront_config::StorefrontConfig;
///
/// let config = StorefrontConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct StorefrontConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream fetch settings.
    #[serde(default)]
    pub scraper: ScraperConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StorefrontConfig {
    /// Check values that deserialization alone cannot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        let timeouts = [
            ("server.request_timeout_ms", self.server.request_timeout_ms),
            ("scraper.connect_timeout_ms", self.scraper.connect_timeout_ms),
            ("scraper.request_timeout_ms", self.scraper.request_timeout_ms),
        ];
        for (field, value) in timeouts {
            if value == 0 {
                return Err(ConfigError::invalid(field, "must be greater than zero"));
            }
        }

        // The handler timer starts before the upstream one, so it must be the
        // longer of the two for upstream timeouts to be reported as such.
        if self.server.request_timeout_ms <= self.scraper.request_timeout_ms {
            return Err(ConfigError::invalid(
                "server.request_timeout_ms",
                format!(
                    "must exceed scraper.request_timeout_ms ({} <= {})",
                    self.server.request_timeout_ms, self.scraper.request_timeout_ms
                ),
            ));
        }

        if let Some(agent) = &self.scraper.user_agent {
            if agent.trim().is_empty() {
                return Err(ConfigError::invalid(
                    "scraper.user_agent",
                    "must not be blank",
                ));
            }
        }

        if self.logging.enabled {
            create_env_filter(&self.logging.level)
                .map_err(|e| ConfigError::invalid("logging.level", e.to_string()))?;
        }

        Ok(())
    }

    /// Local development preset: pretty debug logs with source locations.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.server.http_addr = "127.0.0.1:8080".to_string();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.include_location = true;
        config
    }

    /// Production preset: JSON info logs.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config
    }
}
