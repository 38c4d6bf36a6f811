//! The `/api` endpoint.
//!
//! `GET /api?url=<listing URL>` runs one scrape and answers with the record
//! as JSON. Failures answer with an error envelope:
//!
//! ```json
//! {"error": {"code": "EXTRACTION_ERROR", "message": "...", "stage": "extraction", "field": "app_version"}}
//! ```

use std::time::Duration;

use bytes::Bytes;
use http::{header, Response, StatusCode};
use http_body_util::Full;
use serde::Deserialize;
use storefront_core::{Field, ScrapeError, Scraper};
use thiserror::Error;

use crate::config::ErrorStatus;
use crate::server::HttpResponse;

pub(crate) const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";

/// Query string of an `/api` request.
#[derive(Debug, Default, Deserialize)]
struct ApiQuery {
    url: Option<String>,
}

/// Everything that can make an `/api` request fail.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No `url` parameter was given.
    #[error("missing required query parameter `url`")]
    MissingParameter,

    /// The query string could not be decoded.
    #[error("invalid query string: {0}")]
    InvalidQuery(String),

    /// The scrape itself failed.
    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    /// The handler ran past the request timeout.
    #[error("request timed out after {}ms", .0.as_millis())]
    HandlerTimeout(Duration),

    /// The record could not be serialized.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Status code in semantic mode.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingParameter | Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Self::Scrape(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::HandlerTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingParameter => "MISSING_PARAMETER",
            Self::InvalidQuery(_) => "INVALID_QUERY",
            Self::Scrape(e) => e.code(),
            Self::HandlerTimeout(_) => "HANDLER_TIMEOUT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Where the request stopped.
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            Self::MissingParameter | Self::InvalidQuery(_) => "request",
            Self::Scrape(e) => e.stage().as_str(),
            Self::HandlerTimeout(_) | Self::Internal(_) => "handler",
        }
    }

    /// Builds the error response, with the status chosen by `mode`.
    #[must_use]
    pub fn to_response(&self, mode: ErrorStatus) -> HttpResponse {
        let mut error = serde_json::json!({
            "code": self.code(),
            "message": self.to_string(),
            "stage": self.stage(),
        });

        if let Self::Scrape(ScrapeError::Extraction(e)) = self {
            error["field"] = serde_json::Value::from(e.field().key());
            if !e.also_failed().is_empty() {
                let keys: Vec<&str> = e.also_failed().iter().copied().map(Field::key).collect();
                error["also_failed"] = serde_json::Value::from(keys);
            }
        }

        let body = serde_json::json!({ "error": error });
        json_response(mode.apply(self.status()), body.to_string())
    }
}

/// Handles one `/api` request. `query` is the raw query string, if any.
pub(crate) async fn handle(scraper: &Scraper, query: Option<&str>, mode: ErrorStatus) -> HttpResponse {
    match scrape(scraper, query).await {
        Ok(body) => json_response(StatusCode::OK, body),
        Err(e) => {
            tracing::debug!(code = e.code(), error = %e, "api request failed");
            e.to_response(mode)
        }
    }
}

async fn scrape(scraper: &Scraper, query: Option<&str>) -> Result<String, ApiError> {
    let query: ApiQuery = match query {
        Some(raw) => {
            serde_urlencoded::from_str(raw).map_err(|e| ApiError::InvalidQuery(e.to_string()))?
        }
        None => ApiQuery::default(),
    };
    let url = query.url.ok_or(ApiError::MissingParameter)?;

    let record = scraper.get_app_record(&url).await?;

    record.to_json().map_err(|e| {
        tracing::error!(error = %e, "cannot serialize app record");
        ApiError::Internal(e.to_string())
    })
}

/// A JSON response with the given status.
pub(crate) fn json_response(status: StatusCode, body: String) -> HttpResponse {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, CONTENT_TYPE_JSON)
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::new())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use storefront_core::fixtures::{instagram_listing_html, StaticPageFetcher};

    async fn json_body(response: HttpResponse) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn scraper(fetcher: StaticPageFetcher) -> Scraper {
        Scraper::new(Arc::new(fetcher))
    }

    #[tokio::test]
    async fn test_success() {
        let scraper = scraper(StaticPageFetcher::ok(instagram_listing_html()));
        let response = handle(
            &scraper,
            Some("url=https://instagram.en.aptoide.com/app"),
            ErrorStatus::Semantic,
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            CONTENT_TYPE_JSON
        );
        let body = json_body(response).await;
        assert_eq!(body["app_name"], "Instagram");
    }

    #[tokio::test]
    async fn test_percent_encoded_url() {
        let fetcher = StaticPageFetcher::ok(instagram_listing_html());
        let scraper = scraper(fetcher);
        let response = handle(
            &scraper,
            Some("url=https%3A%2F%2Finstagram.en.aptoide.com%2Fapp"),
            ErrorStatus::Semantic,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_parameter() {
        let scraper = scraper(StaticPageFetcher::ok(instagram_listing_html()));

        for query in [None, Some(""), Some("link=https://instagram.en.aptoide.com/app")] {
            let response = handle(&scraper, query, ErrorStatus::Semantic).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body = json_body(response).await;
            assert_eq!(body["error"]["code"], "MISSING_PARAMETER");
            assert_eq!(body["error"]["stage"], "request");
        }
    }

    #[tokio::test]
    async fn test_duplicate_parameter_is_invalid_query() {
        let scraper = scraper(StaticPageFetcher::ok(instagram_listing_html()));
        let response = handle(&scraper, Some("url=a&url=b"), ErrorStatus::Semantic).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], "INVALID_QUERY");
    }

    #[tokio::test]
    async fn test_validation_error_body() {
        let scraper = scraper(StaticPageFetcher::ok(instagram_listing_html()));
        let response = handle(
            &scraper,
            Some("url=https://www.google.com"),
            ErrorStatus::Semantic,
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["stage"], "validation");
        assert!(body["error"].get("field").is_none());
    }

    #[tokio::test]
    async fn test_extraction_error_names_field() {
        let html = instagram_listing_html().replace("DetailsMainSpan", "SomethingElse");
        let scraper = scraper(StaticPageFetcher::ok(html));
        let response = handle(
            &scraper,
            Some("url=https://instagram.en.aptoide.com/app"),
            ErrorStatus::Semantic,
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "EXTRACTION_ERROR");
        assert_eq!(body["error"]["field"], "app_downloads");
        assert!(body["error"].get("also_failed").is_none());
    }

    #[tokio::test]
    async fn test_legacy_mode() {
        let scraper = scraper(StaticPageFetcher::with_status(404, "gone"));
        let response = handle(
            &scraper,
            Some("url=https://nope.en.aptoide.com/app"),
            ErrorStatus::Legacy,
        )
        .await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(json_body(response).await["error"]["code"], "FETCH_ERROR");
    }

    #[test]
    fn test_handler_timeout() {
        let err = ApiError::HandlerTimeout(Duration::from_millis(1500));
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(err.code(), "HANDLER_TIMEOUT");
        assert_eq!(err.to_string(), "request timed out after 1500ms");
        assert_eq!(
            err.to_response(ErrorStatus::Legacy).status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
    }
}
