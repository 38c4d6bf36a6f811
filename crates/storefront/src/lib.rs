//! # Storefront
//!
//! Scrapes a single app listing from `*.aptoide.com` into a JSON record with
//! five fields: name, version, downloads, release date and description.
//!
//! The work is split across crates, all re-exported here:
//!
//! - [`core`]: URL validation, fetching, field extraction and assembly
//! - [`server`]: the HTTP adapter (`/api`, `/`, `/health`)
//! - [`config`]: layered configuration (file, `.env`, `STOREFRONT__*`)
//! - [`telemetry`]: structured logging
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use storefront::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = storefront::load_config(None)?;
//!     let scraper = storefront::build_scraper(&config)?;
//!
//!     let record = scraper
//!         .get_app_record("https://instagram.en.aptoide.com/app")
//!         .await?;
//!     println!("{}", record.to_json()?);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::path::Path;

use thiserror::Error;

pub use storefront_config as config;
pub use storefront_core as core;
pub use storefront_server as server;
pub use storefront_telemetry as telemetry;

use storefront_config::{
    ConfigError, ConfigLoader, ErrorStatusMode, StorefrontConfig, DEFAULT_ENV_PREFIX,
};
use storefront_core::{ScrapeError, Scraper};
use storefront_server::{ErrorStatus, IndexPage, IndexPageError, Server, ServerError};
use storefront_telemetry::{init_logging, TelemetryError};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use storefront_config::{ConfigLoader, StorefrontConfig};
    pub use storefront_core::{AppRecord, Field, ScrapeError, Scraper, Stage};
    pub use storefront_server::{ErrorStatus, Server, ShutdownSignal};
}

/// Anything that stops the service from starting or a one-shot scrape from
/// finishing.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The log subscriber could not be installed.
    #[error("logging error: {0}")]
    Telemetry(#[from] TelemetryError),

    /// The scraper could not be created, or a one-shot scrape failed.
    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    /// The custom index page could not be read.
    #[error(transparent)]
    IndexPage(#[from] IndexPageError),

    /// The server failed to bind or run.
    #[error("server error: {0}")]
    Server(#[from] ServerError),

    /// A scraped record could not be written out.
    #[error("cannot serialize record: {0}")]
    Output(String),
}

/// Loads configuration: defaults, then `path` if given, then `.env`, then
/// `STOREFRONT__SECTION__KEY` variables. The result is validated.
///
/// # Errors
///
/// Returns [`ConfigError`] if any layer fails to load or the result is
/// invalid.
pub fn load_config(path: Option<&Path>) -> Result<StorefrontConfig, ConfigError> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = path {
        loader = loader.with_file(path)?;
    }
    loader
        .with_dotenv()?
        .with_env_prefix(DEFAULT_ENV_PREFIX)
        .load()
}

/// Installs the global log subscriber from the `[logging]` section.
///
/// # Errors
///
/// Returns [`StartupError::Telemetry`] for a bad level filter or when a
/// subscriber is already installed.
pub fn init_telemetry(config: &StorefrontConfig) -> Result<(), StartupError> {
    init_logging(&config.logging.to_log_config())?;
    Ok(())
}

/// Creates an HTTPS scraper from the `[scraper]` section.
///
/// # Errors
///
/// Returns [`StartupError::Scrape`] if the HTTP client cannot be built.
pub fn build_scraper(config: &StorefrontConfig) -> Result<Scraper, StartupError> {
    Ok(Scraper::http(&config.scraper.to_fetch_config())?)
}

/// Creates the HTTP server from the `[server]` section.
///
/// # Errors
///
/// Returns [`StartupError::IndexPage`] if a configured index page cannot be
/// read.
pub fn build_server(config: &StorefrontConfig, scraper: Scraper) -> Result<Server, StartupError> {
    let server = &config.server;
    let error_status = match server.error_status {
        ErrorStatusMode::Semantic => ErrorStatus::Semantic,
        ErrorStatusMode::Legacy => ErrorStatus::Legacy,
    };

    let mut builder = Server::builder(scraper)
        .http_addr(server.http_addr.clone())
        .shutdown_timeout(server.shutdown_timeout())
        .request_timeout(server.request_timeout())
        .error_status(error_status)
        .service_version(VERSION);

    if let Some(path) = &server.index_page {
        builder = builder.index_page(IndexPage::from_file(path)?);
    }

    Ok(builder.build())
}

/// Scrapes one listing and returns the record as JSON.
///
/// # Errors
///
/// Returns [`StartupError::Scrape`] for any validation, fetch or extraction
/// failure.
pub async fn scrape_once(scraper: &Scraper, url: &str) -> Result<String, StartupError> {
    let record = scraper.get_app_record(url).await?;
    record.to_json().map_err(|e| StartupError::Output(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;
    use storefront_core::fixtures::{instagram_listing_html, StaticPageFetcher};

    fn offline_scraper() -> Scraper {
        Scraper::new(Arc::new(StaticPageFetcher::ok(instagram_listing_html())))
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nhttp_addr = \"127.0.0.1:9999\"\nerror_status = \"legacy\"\nrequest_timeout_ms = 1500\n\n[scraper]\nrequest_timeout_ms = 1000"
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.server.http_addr, "127.0.0.1:9999");
        assert_eq!(config.server.error_status, ErrorStatusMode::Legacy);
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Some(Path::new("/no/such/storefront.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_build_server_maps_settings() {
        let mut config = StorefrontConfig::default();
        config.server.http_addr = "127.0.0.1:7000".to_string();
        config.server.request_timeout_ms = 2500;
        config.server.error_status = ErrorStatusMode::Legacy;

        let server = build_server(&config, offline_scraper()).unwrap();
        assert_eq!(server.config().http_addr(), "127.0.0.1:7000");
        assert_eq!(server.config().request_timeout(), Duration::from_millis(2500));
        assert_eq!(server.config().error_status(), ErrorStatus::Legacy);
    }

    #[test]
    fn test_build_server_missing_index_page() {
        let mut config = StorefrontConfig::default();
        config.server.index_page = Some("/no/such/index.html".into());

        let err = build_server(&config, offline_scraper()).unwrap_err();
        assert!(matches!(err, StartupError::IndexPage(_)));
    }

    #[test]
    fn test_init_telemetry_rejects_bad_filter() {
        let mut config = StorefrontConfig::default();
        config.logging.level = "storefront=notalevel".to_string();

        let err = init_telemetry(&config).unwrap_err();
        assert!(matches!(err, StartupError::Telemetry(_)));
        assert!(err.to_string().starts_with("logging error:"));
    }

    #[test]
    fn test_init_telemetry_disabled_is_noop() {
        let mut config = StorefrontConfig::default();
        config.logging.enabled = false;
        assert!(init_telemetry(&config).is_ok());
    }

    #[test]
    fn test_build_scraper_from_defaults() {
        assert!(build_scraper(&StorefrontConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_scrape_once() {
        let json = scrape_once(&offline_scraper(), "https://instagram.en.aptoide.com/app")
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["app_name"], "Instagram");

        let err = scrape_once(&offline_scraper(), "https://www.google.com")
            .await
            .unwrap_err();
        assert!(matches!(err, StartupError::Scrape(ref e) if e.code() == "VALIDATION_ERROR"));
    }
}
