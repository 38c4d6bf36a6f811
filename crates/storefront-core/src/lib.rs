//! # Storefront Core
//!
//! Scrapes app listing pages from the Aptoide store into structured records.
//!
//! The pipeline has four steps, each with its own module:
//!
//! - [`ValidatedUrl`] - rejects anything that is not an `https://*.aptoide.com/app` URL
//! - [`PageFetcher`] - retrieves the page once ([`HttpFetcher`] in production)
//! - [`extract`] - five independent field extractors over a [`ParsedDocument`]
//! - [`Scraper`] - runs the steps in order and builds an [`AppRecord`]
//!
//! Every failure is a [`ScrapeError`] tagged with the [`Stage`] it came from.

#![doc(html_root_url = "https://docs.rs/storefront-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod assemble;
pub mod document;
mod error;
pub mod extract;
pub mod fetch;
pub mod fixtures;
mod record;
mod validate;

pub use assemble::{assemble, extract_page, Scraper};
pub use document::{AttrPattern, Node, ParsedDocument};
pub use error::{
    ExtractionError, FetchError, Field, ScrapeError, ScrapeResult, Stage, ValidationError,
};
pub use fetch::{fetch_document, FetchConfig, FetchedPage, HttpFetcher, PageFetcher};
pub use record::AppRecord;
pub use validate::{ValidatedUrl, APP_PATH, HOST_SUFFIX};
