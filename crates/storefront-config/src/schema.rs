//! Configuration schema types.
//!
//! Every section rejects unknown keys and fills in defaults for keys that
//! are left out.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use storefront_core::FetchConfig;
use storefront_telemetry::{LogConfig, LogFormat};

/// How `/api` failures map to HTTP status codes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ErrorStatusMode {
    /// 400 for bad input, 502 for upstream problems, 504 for timeouts.
    #[default]
    Semantic,
    /// 405 for every failure, matching older clients.
    Legacy,
}

/// Server configuration section.
///
/// # Example
///
/// ```
/// use storefront_config::ServerConfig;
///
/// let config = ServerConfig {
///     http_addr: "127.0.0.1:3000".to_string(),
///     ..ServerConfig::default()
/// };
/// assert_eq!(config.request_timeout_ms, 35000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// HTTP server bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Per-request handler timeout in milliseconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// HTML file served at `/`. The built-in page is used when unset.
    #[serde(default)]
    pub index_page: Option<PathBuf>,

    /// Status code mapping for `/api` failures.
    #[serde(default)]
    pub error_status: ErrorStatusMode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            request_timeout_ms: default_request_timeout(),
            index_page: None,
            error_status: ErrorStatusMode::default(),
        }
    }
}

impl ServerConfig {
    /// The handler timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// The shutdown drain period as a [`Duration`].
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    35000
}

/// Upstream fetch configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ScraperConfig {
    /// TCP/TLS connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Overall upstream request timeout in milliseconds.
    #[serde(default = "default_fetch_timeout")]
    pub request_timeout_ms: u64,

    /// `User-Agent` sent upstream. Defaults to `storefront/<version>`.
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout(),
            request_timeout_ms: default_fetch_timeout(),
            user_agent: None,
        }
    }
}

impl ScraperConfig {
    /// Build the fetcher settings for this section.
    pub fn to_fetch_config(&self) -> FetchConfig {
        let builder = FetchConfig::builder()
            .connect_timeout(Duration::from_millis(self.connect_timeout_ms))
            .request_timeout(Duration::from_millis(self.request_timeout_ms));

        match &self.user_agent {
            Some(agent) => builder.user_agent(agent.clone()).build(),
            None => builder.build(),
        }
    }
}

fn default_connect_timeout() -> u64 {
    10000
}

fn default_fetch_timeout() -> u64 {
    30000
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (trace, debug, info, warn, error, or per-target).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
        }
    }
}

impl LoggingConfig {
    /// Build the subscriber settings for this section.
    pub fn to_log_config(&self) -> LogConfig {
        let base = match self.format {
            LogFormat::Json => LogConfig::production(),
            LogFormat::Pretty => LogConfig::development(),
        };

        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            format: self.format,
            file_line_info: self.include_location,
            ..base
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
