//! Test request building.

use http::{header, HeaderMap, HeaderName, HeaderValue, Method, Uri};

use crate::error::TestError;

/// A request ready to be dispatched by a [`TestClient`](crate::TestClient).
///
/// The storefront endpoints never read a request body, so there is none.
#[derive(Debug, Clone)]
pub struct TestRequest {
    /// HTTP method
    pub method: Method,
    /// Request URI
    pub uri: Uri,
    /// Request headers
    pub headers: HeaderMap,
}

impl TestRequest {
    /// Creates a GET request builder.
    pub fn get(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::GET, uri)
    }

    /// Creates a HEAD request builder.
    pub fn head(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::HEAD, uri)
    }

    /// Creates a POST request builder.
    pub fn post(uri: impl AsRef<str>) -> TestRequestBuilder {
        TestRequestBuilder::new(Method::POST, uri)
    }

    /// Creates a GET of `/api` with `listing_url` form-encoded as the `url`
    /// parameter.
    ///
    /// # Example
    ///
    /// ```rust
    /// use storefront_test::TestRequest;
    ///
    /// let request = TestRequest::api("https://instagram.en.aptoide.com/app")
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(
    ///     request.uri.query(),
    ///     Some("url=https%3A%2F%2Finstagram.en.aptoide.com%2Fapp")
    /// );
    /// ```
    pub fn api(listing_url: impl AsRef<str>) -> TestRequestBuilder {
        match serde_urlencoded::to_string([("url", listing_url.as_ref())]) {
            Ok(query) => TestRequestBuilder::new(Method::GET, format!("/api?{query}")),
            Err(e) => TestRequestBuilder::new(Method::GET, "/api")
                .fail(TestError::InvalidUri(format!("cannot encode url parameter: {e}"))),
        }
    }
}

/// Builder for constructing test requests.
///
/// Errors from individual steps are kept and reported by [`build`](Self::build).
#[must_use]
#[derive(Debug)]
pub struct TestRequestBuilder {
    method: Method,
    uri: String,
    headers: HeaderMap,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Creates a new request builder.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            headers: HeaderMap::new(),
            error: None,
        }
    }

    fn fail(mut self, error: TestError) -> Self {
        self.error.get_or_insert(error);
        self
    }

    /// Sets a header on the request.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = match HeaderName::try_from(name.as_ref()) {
            Ok(name) => name,
            Err(e) => return self.fail(TestError::InvalidHeader(e.to_string())),
        };
        let value = match HeaderValue::try_from(value.as_ref()) {
            Ok(value) => value,
            Err(e) => return self.fail(TestError::InvalidHeader(e.to_string())),
        };
        self.headers.insert(name, value);
        self
    }

    /// Sets the `If-None-Match` header.
    pub fn if_none_match(self, etag: impl AsRef<str>) -> Self {
        self.header(header::IF_NONE_MATCH.as_str(), etag)
    }

    /// Builds the test request.
    pub fn build(self) -> Result<TestRequest, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let uri = self
            .uri
            .parse::<Uri>()
            .map_err(|e| TestError::InvalidUri(e.to_string()))?;

        Ok(TestRequest {
            method: self.method,
            uri,
            headers: self.headers,
        })
    }
}
