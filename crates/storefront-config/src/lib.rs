//! Typed configuration for the storefront service.
//!
//! Configuration is loaded in layers (defaults → file → `.env` → environment)
//! by [`ConfigLoader`] into a [`StorefrontConfig`]. Unknown keys are errors.
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! shutdown_timeout_secs = 30
//! request_timeout_ms = 35000      # must exceed scraper.request_timeout_ms
//! # index_page = "static/index.html"
//! error_status = "semantic"   # or "legacy"
//!
//! [scraper]
//! connect_timeout_ms = 10000
//! request_timeout_ms = 30000
//! # user_agent = "storefront/0.1.0"
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"             # or "pretty"
//! include_location = false
//! ```
//!
//! # Environment Variable Overrides
//!
//! Every key can be overridden with `STOREFRONT__SECTION__KEY`, e.g.
//! `STOREFRONT__SERVER__HTTP_ADDR=127.0.0.1:9000` or
//! `STOREFRONT__LOGGING__LEVEL=debug`.

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::StorefrontConfig;
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use schema::{ErrorStatusMode, LoggingConfig, ScraperConfig, ServerConfig};
pub use storefront_telemetry::LogFormat;
