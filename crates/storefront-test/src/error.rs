//! Failures inside the test harness itself, as opposed to failures of the
//! server under test.

use std::fmt;

/// A request could not be built or a response could not be decoded.
#[derive(Debug)]
pub enum TestError {
    /// The URI or query string is malformed.
    InvalidUri(String),
    /// A header name or value is rejected by `http`.
    InvalidHeader(String),
    /// The body could not be collected or is not UTF-8.
    Body(String),
    /// The body is not the expected JSON.
    Json(serde_json::Error),
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUri(msg) => write!(f, "bad request URI: {msg}"),
            Self::InvalidHeader(msg) => write!(f, "bad request header: {msg}"),
            Self::Body(msg) => write!(f, "unreadable response body: {msg}"),
            Self::Json(e) => write!(f, "response body is not the expected JSON: {e}"),
        }
    }
}

impl std::error::Error for TestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Self::Json(e) = self {
            Some(e)
        } else {
            None
        }
    }
}

impl From<serde_json::Error> for TestError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
