//! Error types for the scraping pipeline.
//!
//! Every failure is terminal for the request that produced it. The
//! [`ScrapeError`] wrapper records which stage failed so the HTTP adapter can
//! pick a status code and the logs can say where the pipeline stopped.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for scraping operations.
pub type ScrapeResult<T> = Result<T, ScrapeError>;

/// The pipeline stage at which a scrape failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// URL validation, before any network access.
    Validation,
    /// Retrieving the listing page.
    Fetch,
    /// Pulling fields out of the parsed page.
    Extraction,
}

impl Stage {
    /// Returns the stage name as used in logs and error bodies.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Fetch => "fetch",
            Self::Extraction => "extraction",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the five fields of an app record.
///
/// The declaration order is the order in which extraction failures are
/// reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Field {
    /// The app's display name.
    #[serde(rename = "app_name")]
    Name,
    /// The current version string.
    #[serde(rename = "app_version")]
    Version,
    /// The download-count bucket, e.g. `500M+`.
    #[serde(rename = "app_downloads")]
    Downloads,
    /// The release date of the current version.
    #[serde(rename = "release_date")]
    ReleaseDate,
    /// The long-form description.
    #[serde(rename = "description")]
    Description,
}

impl Field {
    /// All fields, in reporting order.
    pub const ALL: [Field; 5] = [
        Field::Name,
        Field::Version,
        Field::Downloads,
        Field::ReleaseDate,
        Field::Description,
    ];

    /// Returns the JSON key used for this field in a serialized record.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Name => "app_name",
            Self::Version => "app_version",
            Self::Downloads => "app_downloads",
            Self::ReleaseDate => "release_date",
            Self::Description => "description",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A URL rejected before any network access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The input is not an absolute URL.
    #[error("malformed URL '{input}': {reason}")]
    Malformed {
        /// The rejected input.
        input: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// The scheme is not `https`.
    #[error("URL scheme must be 'https', got '{scheme}'")]
    Scheme {
        /// The scheme that was found.
        scheme: String,
    },

    /// The host is not an aptoide subdomain.
    #[error("URL host must end with '{suffix}', got '{host}'")]
    Host {
        /// The host that was found (empty if none).
        host: String,
        /// The required suffix.
        suffix: &'static str,
    },

    /// The path is not the app page path.
    #[error("URL path must be exactly '{expected}', got '{path}'")]
    Path {
        /// The path that was found.
        path: String,
        /// The required path.
        expected: &'static str,
    },

    /// The URL carries a query string.
    #[error("URL must not carry a query string, got '?{query}'")]
    Query {
        /// The query that was found, possibly empty.
        query: String,
    },
}

/// A failure to retrieve the listing page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The upstream answered with something other than 200.
    #[error("upstream returned status {status} for {url}")]
    Status {
        /// The requested URL.
        url: String,
        /// The status code received.
        status: u16,
    },

    /// The request did not complete in time.
    #[error("request to {url} timed out")]
    Timeout {
        /// The requested URL.
        url: String,
    },

    /// Connection, TLS or protocol failure.
    #[error("request to {url} failed: {source}")]
    Transport {
        /// The requested URL.
        url: String,
        /// Underlying cause.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The fetcher could not be constructed.
    #[error("fetcher setup failed: {message}")]
    Setup {
        /// Error message.
        message: String,
    },
}

impl FetchError {
    /// Create a transport error from any error type.
    pub fn transport(
        url: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Transport {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Create a setup error.
    pub fn setup(message: impl Into<String>) -> Self {
        Self::Setup {
            message: message.into(),
        }
    }

    /// Returns the upstream status code, if the upstream answered at all.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A field that could not be extracted from the page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not extract {field}: {reason}")]
pub struct ExtractionError {
    field: Field,
    reason: String,
    also_failed: Vec<Field>,
}

impl ExtractionError {
    /// Create an extraction error for a field.
    pub fn new(field: Field, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
            also_failed: Vec::new(),
        }
    }

    /// Create an error for a missing anchor element.
    pub fn missing(field: Field, what: impl fmt::Display) -> Self {
        Self::new(field, format!("no {what} found"))
    }

    /// Attach the other fields that failed in the same pass.
    #[must_use]
    pub fn with_also_failed(mut self, fields: Vec<Field>) -> Self {
        self.also_failed = fields;
        self
    }

    /// The field that failed.
    pub fn field(&self) -> Field {
        self.field
    }

    /// Human-readable reason.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Other fields that also failed, in reporting order.
    pub fn also_failed(&self) -> &[Field] {
        &self.also_failed
    }
}

/// Any failure of a scrape, tagged with its stage.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The URL was rejected.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The page could not be fetched.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// A field could not be extracted.
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
}

impl ScrapeError {
    /// The stage at which the scrape stopped.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Validation(_) => Stage::Validation,
            Self::Fetch(_) => Stage::Fetch,
            Self::Extraction(_) => Stage::Extraction,
        }
    }

    /// The field that failed, for extraction errors.
    pub fn field(&self) -> Option<Field> {
        match self {
            Self::Extraction(e) => Some(e.field()),
            _ => None,
        }
    }

    /// Get the HTTP status code for this error.
    #[allow(clippy::match_same_arms)]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Fetch(FetchError::Timeout { .. }) => 504,
            Self::Fetch(FetchError::Setup { .. }) => 500,
            Self::Fetch(_) => 502,
            Self::Extraction(_) => 502,
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Fetch(FetchError::Timeout { .. }) => "FETCH_TIMEOUT",
            Self::Fetch(_) => "FETCH_ERROR",
            Self::Extraction(_) => "EXTRACTION_ERROR",
        }
    }
}
