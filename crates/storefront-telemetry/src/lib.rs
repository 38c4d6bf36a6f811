//! Structured logging for the storefront service.
//!
//! Everything logs through `tracing`. This crate installs the subscriber:
//! JSON lines for production, a pretty multi-line layout for development,
//! both written to stderr and filtered by an `EnvFilter` directive.
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(url = "https://instagram.en.aptoide.com/app", "scraping");
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
