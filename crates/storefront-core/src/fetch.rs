//! Page retrieval.
//!
//! [`PageFetcher`] is the seam between the pipeline and the network. The
//! production implementation is [`HttpFetcher`]; tests plug in
//! [`StaticPageFetcher`](crate::fixtures::StaticPageFetcher).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::document::ParsedDocument;
use crate::error::FetchError;
use crate::validate::ValidatedUrl;

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default overall request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default `User-Agent` header value.
pub const DEFAULT_USER_AGENT: &str = concat!("storefront/", env!("CARGO_PKG_VERSION"));

/// The raw body of a page that answered 200.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    url: String,
    body: String,
}

impl FetchedPage {
    /// Create a page from its URL and body.
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
        }
    }

    /// The URL the page was fetched from.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The page body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Parse the body into a queryable tree.
    pub fn parse(&self) -> ParsedDocument {
        ParsedDocument::parse(&self.body)
    }
}

/// Retrieves listing pages.
///
/// Implementations perform exactly one request per call and never retry.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the page at `url`, failing on anything but a 200 answer.
    async fn fetch(&self, url: &ValidatedUrl) -> Result<FetchedPage, FetchError>;
}

/// Fetch a page and parse it.
///
/// The returned tree is not `Send`; call this as the last await of a task.
pub async fn fetch_document(
    fetcher: &dyn PageFetcher,
    url: &ValidatedUrl,
) -> Result<ParsedDocument, FetchError> {
    let page = fetcher.fetch(url).await?;
    Ok(page.parse())
}

/// Settings for [`HttpFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    connect_timeout: Duration,
    request_timeout: Duration,
    user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetchConfig {
    /// Creates a builder.
    pub fn builder() -> FetchConfigBuilder {
        FetchConfigBuilder::default()
    }

    /// Connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Overall request timeout.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// `User-Agent` header value.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

/// Builder for [`FetchConfig`].
#[derive(Debug, Default)]
pub struct FetchConfigBuilder {
    connect_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl FetchConfigBuilder {
    /// Sets the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the overall request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the `User-Agent` header value.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> FetchConfig {
        let defaults = FetchConfig::default();
        FetchConfig {
            connect_timeout: self.connect_timeout.unwrap_or(defaults.connect_timeout),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
        }
    }
}

/// Fetches pages over HTTPS with reqwest.
///
/// The client pools connections and is cheap to clone; one instance serves
/// all requests.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher with the given settings.
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| FetchError::setup(format!("failed to create client: {e}")))?;

        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn classify(url: &ValidatedUrl, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::transport(url.as_str(), err)
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &ValidatedUrl) -> Result<FetchedPage, FetchError> {
        debug!(url = %url, "fetching listing page");

        let response = self
            .client
            .get(url.as_url().clone())
            .send()
            .await
            .map_err(|e| Self::classify(url, e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| Self::classify(url, e))?;
        debug!(url = %url, bytes = body.len(), "listing page fetched");

        Ok(FetchedPage::new(url.as_str(), body))
    }
}
