//! Record assembly: validate, fetch, extract.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::document::ParsedDocument;
use crate::error::{ExtractionError, Field, ScrapeError, ScrapeResult, Stage};
use crate::extract::{
    extract_description, extract_downloads, extract_name, extract_release_date, extract_version,
};
use crate::fetch::{FetchConfig, FetchedPage, HttpFetcher, PageFetcher};
use crate::record::AppRecord;
use crate::validate::ValidatedUrl;

/// Turns listing URLs into [`AppRecord`]s.
///
/// A scraper holds no per-request state and can be shared between tasks.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use storefront_core::{fixtures, Scraper, Stage};
///
/// # tokio_test::block_on(async {
/// let fetcher = Arc::new(fixtures::StaticPageFetcher::ok(fixtures::instagram_listing_html()));
/// let scraper = Scraper::new(fetcher.clone());
///
/// let record = scraper
///     .get_app_record("https://instagram.en.aptoide.com/app")
///     .await
///     .unwrap();
/// assert_eq!(record.name(), "Instagram");
///
/// let err = scraper.get_app_record("https://www.google.com").await.unwrap_err();
/// assert_eq!(err.stage(), Stage::Validation);
/// assert_eq!(fetcher.calls(), 1);
/// # });
/// ```
#[derive(Clone)]
pub struct Scraper {
    fetcher: Arc<dyn PageFetcher>,
}

impl Scraper {
    /// Create a scraper over any fetcher.
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    /// Create a scraper that fetches over HTTPS.
    pub fn http(config: &FetchConfig) -> ScrapeResult<Self> {
        let fetcher = HttpFetcher::new(config)?;
        Ok(Self::new(Arc::new(fetcher)))
    }

    /// Scrape one listing.
    ///
    /// The URL is validated before any network access. The page is fetched
    /// once, then all five extractors run. If any of them fails, the first
    /// failure in field order is returned and the rest are listed on it.
    pub async fn get_app_record(&self, raw_url: &str) -> ScrapeResult<AppRecord> {
        let url = ValidatedUrl::parse(raw_url).map_err(|e| {
            warn!(url = raw_url, stage = %Stage::Validation, error = %e, "listing URL rejected");
            ScrapeError::from(e)
        })?;
        debug!(url = %url, "listing URL validated");

        let page = self.fetcher.fetch(&url).await.map_err(|e| {
            warn!(url = %url, stage = %Stage::Fetch, error = %e, "listing fetch failed");
            ScrapeError::from(e)
        })?;
        debug!(url = %url, "listing page fetched");

        let record = extract_page(&page).map_err(|e| {
            warn!(
                url = %url,
                stage = %Stage::Extraction,
                field = %e.field(),
                error = %e,
                "listing extraction failed"
            );
            ScrapeError::from(e)
        })?;
        debug!(url = %url, app = record.name(), "listing assembled");

        Ok(record)
    }
}

impl fmt::Debug for Scraper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scraper").finish_non_exhaustive()
    }
}

/// Parse a fetched page and build a record from it.
pub fn extract_page(page: &FetchedPage) -> Result<AppRecord, ExtractionError> {
    assemble(&page.parse())
}

/// Build a record from a parsed page.
///
/// Every extractor runs even after one fails, so the returned error can
/// name every broken field.
pub fn assemble(doc: &ParsedDocument) -> Result<AppRecord, ExtractionError> {
    let outcome = (
        extract_name(doc),
        extract_version(doc),
        extract_downloads(doc),
        extract_release_date(doc),
        extract_description(doc),
    );

    match outcome {
        (Ok(name), Ok(version), Ok(downloads), Ok(release_date), Ok(description)) => Ok(
            AppRecord::new(name, version, downloads, release_date, description),
        ),
        (name, version, downloads, release_date, description) => {
            let mut errors = [
                name.err(),
                version.err(),
                downloads.err(),
                release_date.err(),
                description.err(),
            ]
            .into_iter()
            .flatten();

            // At least one slot is an error in this arm.
            let first = errors
                .next()
                .unwrap_or_else(|| ExtractionError::new(Field::Name, "unknown failure"));
            let others = errors.map(|e| e.field()).collect();
            Err(first.with_also_failed(others))
        }
    }
}
