//! Test client for in-memory HTTP testing.

use std::sync::Arc;

use http::Method;
use storefront_core::{PageFetcher, Scraper};
use storefront_server::{Server, ServerBuilder};

use crate::error::TestError;
use crate::request::{TestRequest, TestRequestBuilder};
use crate::response::TestResponse;

/// Drives a [`Server`]'s request dispatch without binding a port.
///
/// Requests take the same path as over the network: routing, the request
/// timeout, the `x-request-id` header and the error envelope are all real.
///
/// # Example
///
/// ```rust
/// use storefront_core::fixtures::{instagram_listing_html, StaticPageFetcher};
/// use storefront_test::TestClient;
///
/// # tokio_test::block_on(async {
/// let client = TestClient::with_fetcher(StaticPageFetcher::ok(instagram_listing_html()));
/// let response = client.api("https://instagram.en.aptoide.com/app").await;
///
/// response.assert_status(http::StatusCode::OK);
/// assert_eq!(response.json_value().unwrap()["app_name"], "Instagram");
/// # });
/// ```
#[must_use]
#[derive(Clone)]
pub struct TestClient {
    server: Arc<Server>,
}

impl TestClient {
    /// Wraps an already built server.
    pub fn new(server: Server) -> Self {
        Self {
            server: Arc::new(server),
        }
    }

    /// Builds a default server over `fetcher`.
    pub fn with_fetcher(fetcher: impl PageFetcher + 'static) -> Self {
        Self::configure(Scraper::new(Arc::new(fetcher)), |builder| builder)
    }

    /// Builds a server around `scraper`, letting `configure` adjust the
    /// builder first.
    pub fn configure<F>(scraper: Scraper, configure: F) -> Self
    where
        F: FnOnce(ServerBuilder) -> ServerBuilder,
    {
        Self::new(configure(Server::builder(scraper)).build())
    }

    /// The server under test.
    #[must_use]
    pub fn server(&self) -> &Server {
        &self.server
    }

    /// Creates a GET request.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Creates a HEAD request.
    pub fn head(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::HEAD, uri)
    }

    /// Creates a request with any method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest {
            client: self,
            builder: TestRequestBuilder::new(method, uri),
        }
    }

    /// Sends `GET /api?url=<listing_url>`.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    pub async fn api(&self, listing_url: impl AsRef<str>) -> TestResponse {
        TestClientRequest {
            client: self,
            builder: TestRequest::api(listing_url),
        }
        .send()
        .await
    }

    /// Dispatches a built request.
    pub async fn execute(&self, request: TestRequest) -> Result<TestResponse, TestError> {
        let response = self
            .server
            .handle(&request.method, &request.uri, &request.headers, None)
            .await;
        TestResponse::from_http(response).await
    }
}

impl std::fmt::Debug for TestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestClient")
            .field("http_addr", &self.server.config().http_addr())
            .finish_non_exhaustive()
    }
}

/// A request being built against a [`TestClient`].
#[must_use]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl TestClientRequest<'_> {
    /// Sets a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the `If-None-Match` header.
    pub fn if_none_match(mut self, etag: impl AsRef<str>) -> Self {
        self.builder = self.builder.if_none_match(etag);
        self
    }

    /// Sends the request.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(e) => panic!("test request failed: {e}"),
        }
    }

    /// Sends the request and returns a Result.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        self.client.execute(request).await
    }
}
