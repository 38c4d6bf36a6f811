//! The HTML page served at `/`.
//!
//! The page is read once when the server is built and then served verbatim.
//! Responses carry `ETag` and `Last-Modified`, and a matching
//! `If-None-Match` gets a 304.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use bytes::Bytes;
use http::{header, HeaderMap, Method, Response, StatusCode};
use http_body_util::Full;
use thiserror::Error;

use crate::server::HttpResponse;

const BUILTIN_PAGE: &str = include_str!("../static/index.html");

const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";

/// Errors loading a custom index page.
#[derive(Debug, Error)]
pub enum IndexPageError {
    /// The file could not be read.
    #[error("cannot read index page {}: {source}", path.display())]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// An in-memory HTML page with its cache validators.
///
/// # Example
///
/// ```rust
/// use storefront_server::IndexPage;
///
/// let page = IndexPage::from_html("<h1>hi</h1>");
/// assert_eq!(page.body(), b"<h1>hi</h1>".as_slice());
/// assert!(page.etag().starts_with('"'));
/// ```
#[derive(Debug, Clone)]
pub struct IndexPage {
    body: Bytes,
    etag: String,
    last_modified: SystemTime,
}

impl IndexPage {
    /// The page bundled with the server.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_html(BUILTIN_PAGE)
    }

    /// Wraps an HTML string. `Last-Modified` is the current time.
    #[must_use]
    pub fn from_html(html: impl Into<Bytes>) -> Self {
        Self::with_modified(html.into(), SystemTime::now())
    }

    /// Reads the page from disk. `Last-Modified` is the file's mtime when
    /// the platform reports one.
    ///
    /// # Errors
    ///
    /// Returns [`IndexPageError::Io`] if the file cannot be read.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, IndexPageError> {
        let path = path.as_ref();
        let io_err = |source| IndexPageError::Io {
            path: path.to_path_buf(),
            source,
        };

        let body = std::fs::read(path).map_err(io_err)?;
        let modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .unwrap_or_else(|_| SystemTime::now());

        tracing::debug!(path = %path.display(), bytes = body.len(), "loaded index page");
        Ok(Self::with_modified(Bytes::from(body), modified))
    }

    fn with_modified(body: Bytes, last_modified: SystemTime) -> Self {
        let mut hasher = DefaultHasher::new();
        body.hash(&mut hasher);
        let etag = format!("\"{:016x}-{:x}\"", hasher.finish(), body.len());

        Self {
            body,
            etag,
            last_modified,
        }
    }

    /// The page bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The strong `ETag`, quotes included.
    #[must_use]
    pub fn etag(&self) -> &str {
        &self.etag
    }

    /// Builds the response for a GET or HEAD of `/`.
    #[must_use]
    pub fn respond(&self, method: &Method, headers: &HeaderMap) -> HttpResponse {
        if self.is_not_modified(headers) {
            return Response::builder()
                .status(StatusCode::NOT_MODIFIED)
                .header(header::ETAG, self.etag.as_str())
                .body(Full::new(Bytes::new()))
                .unwrap_or_else(|_| Response::new(Full::new(Bytes::new())));
        }

        let body = if method == Method::HEAD {
            Bytes::new()
        } else {
            self.body.clone()
        };

        Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, CONTENT_TYPE_HTML)
            .header(header::CONTENT_LENGTH, self.body.len().to_string())
            .header(header::ETAG, self.etag.as_str())
            .header(
                header::LAST_MODIFIED,
                httpdate::fmt_http_date(self.last_modified),
            )
            .body(Full::new(body))
            .unwrap_or_else(|_| Response::new(Full::new(self.body.clone())))
    }

    fn is_not_modified(&self, headers: &HeaderMap) -> bool {
        let Some(value) = headers
            .get(header::IF_NONE_MATCH)
            .and_then(|v| v.to_str().ok())
        else {
            return false;
        };

        value
            .split(',')
            .map(str::trim)
            .any(|tag| tag == "*" || tag == self.etag)
    }
}

impl Default for IndexPage {
    fn default() -> Self {
        Self::builtin()
    }
}
