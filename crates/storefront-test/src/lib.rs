//! # Storefront Test
//!
//! In-memory HTTP testing for the storefront server. Requests go through
//! the server's real dispatch path without a socket, and the upstream site
//! is replaced by a canned [`PageFetcher`](storefront_core::PageFetcher).
//!
//! ## Example
//!
//! ```rust
//! use http::StatusCode;
//! use storefront_core::fixtures::StaticPageFetcher;
//! use storefront_test::TestClient;
//!
//! # tokio_test::block_on(async {
//! let client = TestClient::with_fetcher(StaticPageFetcher::with_status(404, "gone"));
//!
//! client
//!     .api("https://missing.en.aptoide.com/app")
//!     .await
//!     .assert_status(StatusCode::BAD_GATEWAY)
//!     .assert_error_code("FETCH_ERROR");
//! # });
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
