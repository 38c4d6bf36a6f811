//! # Storefront Server
//!
//! HTTP adapter for the listing scraper.
//!
//! - `GET /api?url=<listing URL>`: scrape one listing and return it as JSON
//! - `GET /`: the HTML front page
//! - `GET /health`: liveness probe
//!
//! Requests are bounded by a timeout, stamped with an `x-request-id` and
//! logged through `tracing`. SIGINT and SIGTERM trigger a graceful drain.
//!
//! ## Example
//!
//! ```rust,ignore
//! use storefront_core::{FetchConfig, Scraper};
//! use storefront_server::{ErrorStatus, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scraper = Scraper::http(&FetchConfig::default())?;
//!     let server = Server::builder(scraper)
//!         .http_addr("0.0.0.0:8080")
//!         .error_status(ErrorStatus::Semantic)
//!         .build();
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod api;
mod config;
mod health;
mod index;
mod router;
mod server;
pub mod shutdown;

pub use api::ApiError;
pub use config::{
    ErrorStatus, ServerConfig, ServerConfigBuilder, DEFAULT_HTTP_ADDR,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SHUTDOWN_TIMEOUT_SECS,
};
pub use health::{HealthCheck, HealthStatus};
pub use index::{IndexPage, IndexPageError};
pub use router::{allow_header, Endpoint, RouteMatch, Router};
pub use server::{HttpResponse, ResponseBody, Server, ServerBuilder, ServerError, REQUEST_ID_HEADER};
pub use shutdown::ShutdownSignal;
