//! HTTP server.
//!
//! Built on hyper and tokio. Each accepted connection is served on its own
//! task with HTTP/1.1. Every request goes through [`Server::handle`], which
//! routes it, bounds it with the request timeout and stamps it with an
//! `x-request-id`.
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront_core::{FetchConfig, Scraper};
//! use storefront_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scraper = Scraper::http(&FetchConfig::default())?;
//!     Server::builder(scraper)
//!         .http_addr("0.0.0.0:8080")
//!         .build()
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, Method, Request, Response, StatusCode, Uri};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use storefront_core::Scraper;
use storefront_telemetry::log_request_complete;
use tokio::net::{TcpListener, TcpStream};
use tracing::Instrument;
use uuid::Uuid;

use crate::api::{self, ApiError};
use crate::config::{ErrorStatus, ServerConfig, ServerConfigBuilder};
use crate::health::HealthCheck;
use crate::index::IndexPage;
use crate::router::{allow_header, Endpoint, RouteMatch, Router};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Type alias for HTTP response body.
pub type ResponseBody = Full<Bytes>;

/// Type alias for the HTTP response.
pub type HttpResponse = Response<ResponseBody>;

/// Header carrying the per-request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// The storefront HTTP server.
pub struct Server {
    config: ServerConfig,
    router: Router,
    scraper: Scraper,
    index: IndexPage,
    health: HealthCheck,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("routes", &self.router.len())
            .finish_non_exhaustive()
    }
}

impl Server {
    /// Creates a server with default configuration.
    #[must_use]
    pub fn new(config: ServerConfig, scraper: Scraper) -> Self {
        Self {
            config,
            router: Router::standard(),
            scraper,
            index: IndexPage::builtin(),
            health: HealthCheck::default(),
        }
    }

    /// Creates a server builder around `scraper`.
    #[must_use]
    pub fn builder(scraper: Scraper) -> ServerBuilder {
        ServerBuilder::new(scraper)
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the routing table.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Runs until SIGINT or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot bind to its address.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Runs until `shutdown` is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot bind to its address.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self.config.socket_addr().map_err(|e| {
            ServerError::BindError(format!("Invalid address '{}': {}", self.config.http_addr(), e))
        })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(format!("Failed to bind to {addr}: {e}")))?;

        self.serve(listener, shutdown).await
    }

    /// Serves connections from an already bound listener until `shutdown`
    /// is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener's address cannot be read.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let local = listener
            .local_addr()
            .map_err(|e| ServerError::IoError(e.to_string()))?;
        tracing::info!(addr = %local, "server listening");

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            let server = Arc::clone(&server);
                            let token = tracker.acquire();
                            let shutdown = shutdown.clone();

                            tokio::spawn(async move {
                                if let Err(e) = server.serve_connection(stream, peer, shutdown).await {
                                    tracing::debug!(peer = %peer, error = %e, "connection error");
                                }
                                drop(token);
                            });
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "failed to accept connection");
                        }
                    }
                }

                () = shutdown.recv() => {
                    tracing::info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        let drain = server.config.shutdown_timeout();
        tracing::info!(
            active = tracker.active_connections(),
            timeout = ?drain,
            "draining connections"
        );

        tokio::select! {
            () = tracker.wait_idle() => {
                tracing::info!("all connections closed");
            }
            () = tokio::time::sleep(drain) => {
                tracing::warn!(
                    active = tracker.active_connections(),
                    "shutdown timeout reached with connections still open"
                );
            }
        }

        tracing::info!("server stopped");
        Ok(())
    }

    async fn serve_connection(
        self: &Arc<Self>,
        stream: TcpStream,
        peer: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let server = Arc::clone(self);

        let service = service_fn(move |req: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move {
                let response = server
                    .handle(req.method(), req.uri(), req.headers(), Some(peer))
                    .await;
                Ok::<_, Infallible>(response)
            }
        });

        let conn = http1::Builder::new().serve_connection(io, service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown.recv() => {
                // Finish the in-flight request, then close.
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        }
    }

    /// Handles one request. The body is ignored; every endpoint is a GET.
    pub async fn handle(
        &self,
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        peer: Option<SocketAddr>,
    ) -> HttpResponse {
        let request_id = Uuid::now_v7();
        let started = Instant::now();
        let span = tracing::info_span!(
            "request",
            request_id = %request_id,
            http.method = %method,
            http.path = uri.path(),
            peer = ?peer,
        );

        async move {
            let timeout = self.config.request_timeout();
            let mut response =
                match tokio::time::timeout(timeout, self.dispatch(method, uri, headers)).await {
                    Ok(response) => response,
                    Err(_) => {
                        tracing::warn!(timeout = ?timeout, "handler timed out");
                        ApiError::HandlerTimeout(timeout).to_response(self.api_error_status(uri))
                    }
                };

            if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }

            let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            log_request_complete!(request_id, response.status().as_u16(), elapsed);
            response
        }
        .instrument(span)
        .await
    }

    async fn dispatch(&self, method: &Method, uri: &Uri, headers: &HeaderMap) -> HttpResponse {
        match self.router.match_route(method, uri.path()) {
            RouteMatch::Found(Endpoint::Index) => self.index.respond(method, headers),
            RouteMatch::Found(Endpoint::Health) => self.health_response(),
            RouteMatch::Found(Endpoint::Api) => {
                api::handle(&self.scraper, uri.query(), self.config.error_status()).await
            }
            RouteMatch::MethodNotAllowed(allowed) => method_not_allowed(method, allowed),
            RouteMatch::NotFound => not_found(uri.path()),
        }
    }

    fn api_error_status(&self, uri: &Uri) -> ErrorStatus {
        if uri.path() == "/api" {
            self.config.error_status()
        } else {
            ErrorStatus::Semantic
        }
    }

    fn health_response(&self) -> HttpResponse {
        let body = serde_json::to_string(&self.health.status())
            .unwrap_or_else(|_| r#"{"status":"healthy"}"#.to_string());
        api::json_response(StatusCode::OK, body)
    }
}

fn error_body(code: &str, message: &str) -> String {
    serde_json::json!({
        "error": {
            "code": code,
            "message": message,
        }
    })
    .to_string()
}

fn not_found(path: &str) -> HttpResponse {
    api::json_response(
        StatusCode::NOT_FOUND,
        error_body("NOT_FOUND", &format!("no route for {path}")),
    )
}

fn method_not_allowed(method: &Method, allowed: &[Method]) -> HttpResponse {
    let mut response = api::json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        error_body("METHOD_NOT_ALLOWED", &format!("method {method} not allowed")),
    );
    if let Ok(value) = HeaderValue::from_str(&allow_header(allowed)) {
        response.headers_mut().insert(header::ALLOW, value);
    }
    response
}

/// Builder for [`Server`].
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
/// use storefront_core::{fixtures::StaticPageFetcher, Scraper};
/// use storefront_server::Server;
///
/// let scraper = Scraper::new(Arc::new(StaticPageFetcher::ok("<html></html>")));
/// let server = Server::builder(scraper)
///     .http_addr("127.0.0.1:9090")
///     .request_timeout(Duration::from_secs(5))
///     .build();
///
/// assert_eq!(server.config().http_addr(), "127.0.0.1:9090");
/// ```
#[derive(Debug)]
pub struct ServerBuilder {
    config_builder: ServerConfigBuilder,
    scraper: Scraper,
    index: Option<IndexPage>,
    health_service: Option<String>,
    health_version: Option<String>,
}

impl ServerBuilder {
    /// Starts a builder with default settings.
    #[must_use]
    pub fn new(scraper: Scraper) -> Self {
        Self {
            config_builder: ServerConfig::builder(),
            scraper,
            index: None,
            health_service: None,
            health_version: None,
        }
    }

    /// Replaces the whole configuration.
    #[must_use]
    pub fn config(mut self, config: &ServerConfig) -> Self {
        self.config_builder = ServerConfig::builder()
            .http_addr(config.http_addr())
            .shutdown_timeout(config.shutdown_timeout())
            .request_timeout(config.request_timeout())
            .error_status(config.error_status());
        self
    }

    /// Sets the HTTP bind address.
    #[must_use]
    pub fn http_addr(mut self, addr: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.http_addr(addr);
        self
    }

    /// Sets the graceful shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config_builder = self.config_builder.shutdown_timeout(timeout);
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config_builder = self.config_builder.request_timeout(timeout);
        self
    }

    /// Sets the status code policy for `/api` failures.
    #[must_use]
    pub fn error_status(mut self, mode: ErrorStatus) -> Self {
        self.config_builder = self.config_builder.error_status(mode);
        self
    }

    /// Serves `page` at `/` instead of the built-in page.
    #[must_use]
    pub fn index_page(mut self, page: IndexPage) -> Self {
        self.index = Some(page);
        self
    }

    /// Sets the service name reported by `/health`.
    #[must_use]
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.health_service = Some(name.into());
        self
    }

    /// Sets the service version reported by `/health`.
    #[must_use]
    pub fn service_version(mut self, version: impl Into<String>) -> Self {
        self.health_version = Some(version.into());
        self
    }

    /// Builds the server.
    #[must_use]
    pub fn build(self) -> Server {
        let service = self.health_service.unwrap_or_else(|| "storefront".to_string());
        let version = self
            .health_version
            .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

        Server {
            config: self.config_builder.build(),
            router: Router::standard(),
            scraper: self.scraper,
            index: self.index.unwrap_or_default(),
            health: HealthCheck::new(service, version),
        }
    }
}

/// Server error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerError {
    /// Failed to bind to the configured address.
    BindError(String),

    /// I/O error during server operation.
    IoError(String),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BindError(msg) => write!(f, "Bind error: {msg}"),
            Self::IoError(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for ServerError {}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use storefront_core::fixtures::{instagram_listing_html, StaticPageFetcher};

    fn server_with(fetcher: StaticPageFetcher) -> Server {
        Server::builder(Scraper::new(Arc::new(fetcher)))
            .http_addr("127.0.0.1:0")
            .shutdown_timeout(Duration::from_secs(1))
            .build()
    }

    async fn get(server: &Server, uri: &str) -> HttpResponse {
        let uri: Uri = uri.parse().unwrap();
        server.handle(&Method::GET, &uri, &HeaderMap::new(), None).await
    }

    async fn body_json(response: HttpResponse) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_debug_shows_config() {
        let server = server_with(StaticPageFetcher::ok(""));
        let debug = format!("{server:?}");
        assert!(debug.starts_with("Server"));
        assert!(debug.contains("127.0.0.1:0"));
        assert!(debug.contains("routes: 3"));
    }

    #[tokio::test]
    async fn test_request_id_header() {
        let server = server_with(StaticPageFetcher::ok(instagram_listing_html()));
        let first = get(&server, "/health").await;
        let second = get(&server, "/health").await;

        let a = first.headers().get(REQUEST_ID_HEADER).unwrap().to_str().unwrap();
        let b = second.headers().get(REQUEST_ID_HEADER).unwrap().to_str().unwrap();
        assert_ne!(a, b);
        assert_eq!(Uuid::parse_str(a).unwrap().get_version_num(), 7);
    }

    #[tokio::test]
    async fn test_health() {
        let server = server_with(StaticPageFetcher::ok(""));
        let response = get(&server, "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_not_found_and_method_not_allowed() {
        let server = server_with(StaticPageFetcher::ok(""));

        let response = get(&server, "/nope").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"]["code"], "NOT_FOUND");

        let uri: Uri = "/api".parse().unwrap();
        let response = server
            .handle(&Method::POST, &uri, &HeaderMap::new(), None)
            .await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(header::ALLOW).unwrap(), "GET, HEAD");
    }

    #[tokio::test]
    async fn test_handler_timeout() {
        let fetcher = StaticPageFetcher::ok(instagram_listing_html())
            .with_delay(Duration::from_millis(500));
        let server = Server::builder(Scraper::new(Arc::new(fetcher)))
            .request_timeout(Duration::from_millis(20))
            .build();

        let response = get(&server, "/api?url=https://instagram.en.aptoide.com/app").await;
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        assert_eq!(body_json(response).await["error"]["code"], "HANDLER_TIMEOUT");
    }

    #[tokio::test]
    async fn test_invalid_address() {
        let server = Server::builder(Scraper::new(Arc::new(StaticPageFetcher::ok(""))))
            .http_addr("not an address")
            .build();

        let err = server
            .run_with_shutdown(ShutdownSignal::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::BindError(_)));
    }

    #[tokio::test]
    async fn test_serve_and_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = server_with(StaticPageFetcher::ok(instagram_listing_html()));
        let shutdown = ShutdownSignal::new();

        let handle = tokio::spawn(server.serve(listener, shutdown.clone()));

        let response = reqwest::get(format!(
            "http://{addr}/api?url=https://instagram.en.aptoide.com/app"
        ))
        .await
        .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["app_name"], "Instagram");

        shutdown.trigger();
        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("server should stop")
            .expect("task should not panic");
        assert!(result.is_ok());
    }
}
