//! Offline fixtures for tests across the workspace.
//!
//! [`StaticPageFetcher`] answers every request with the same canned page, so
//! the pipeline can be exercised without network access.
//!
//! # Example
//!
//! ```
//! use storefront_core::fixtures;
//!
//! let html = fixtures::instagram_listing_html();
//! assert!(html.contains("app-informations__Title"));
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::fetch::{FetchedPage, PageFetcher};
use crate::validate::ValidatedUrl;

#[derive(Debug, Clone)]
enum Canned {
    Page { status: u16, body: String },
    Timeout,
}

/// A fetcher that returns a fixed answer and counts its calls.
#[derive(Debug)]
pub struct StaticPageFetcher {
    canned: Canned,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StaticPageFetcher {
    /// Answer 200 with `body`.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::with_status(200, body)
    }

    /// Answer with the given status and body.
    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self::from_canned(Canned::Page {
            status,
            body: body.into(),
        })
    }

    /// Fail every request with a timeout.
    pub fn timeout() -> Self {
        Self::from_canned(Canned::Timeout)
    }

    fn from_canned(canned: Canned) -> Self {
        Self {
            canned,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Sleep before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of fetches performed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for StaticPageFetcher {
    async fn fetch(&self, url: &ValidatedUrl) -> Result<FetchedPage, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.canned {
            Canned::Page { status: 200, body } => Ok(FetchedPage::new(url.as_str(), body.clone())),
            Canned::Page { status, .. } => Err(FetchError::Status {
                url: url.to_string(),
                status: *status,
            }),
            Canned::Timeout => Err(FetchError::Timeout {
                url: url.to_string(),
            }),
        }
    }
}

/// A trimmed copy of the Instagram listing page.
///
/// Carries every anchor the extractors look for, with the generated class
/// suffixes the live site uses.
pub fn instagram_listing_html() -> String {
    r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Instagram - Download Instagram APK for Android | Aptoide</title>
</head>
<body>
  <header class="header__Header-sc-1oq2w1b-0"><span class="header__Logo">Aptoide</span></header>
  <main>
    <section class="app-informations__AppInformationsContainer-sc-1aolvnj-0">
      <img class="app-informations__Icon-sc-1aolvnj-1" src="icon.png" alt="Instagram">
      <div class="app-informations__Info-sc-1aolvnj-2">
        <h1 class="app-informations__Title-sc-1aolvnj-3 kvWIiP">Instagram</h1>
        <div class="app-informations__VersionsRatingRow-sc-1aolvnj-4 hRqXbM"><span class="app-informations__Version-sc-1aolvnj-5">323.0.0.35.65</span><span class="app-informations__Date-sc-1aolvnj-6">(07-03-2024)</span><div class="rating__Stars"><span class="rating__Value">4.4</span></div></div>
      </div>
    </section>
    <section class="details__DetailsContainer-sc-hgo0e3-0">
      <div class="details__DetailsBlock-sc-hgo0e3-1">
        <span class="details__DetailsMainSpan-sc-hgo0e3-2 fwLMvG">500M+</span>
        <span class="details__DetailsSecondarySpan-sc-hgo0e3-3">Downloads</span>
      </div>
      <div class="details__DetailsBlock-sc-hgo0e3-1">
        <span class="details__DetailsSecondarySpan-sc-hgo0e3-3">95.68 MB</span>
      </div>
    </section>
    <section class="description__DescriptionContainer-sc-17ck8sd-0">
      <div class="description__Text-sc-17ck8sd-1" itemprop="description"><h2>Instagram Description</h2><p>Bringing you closer to the people and things you love. Instagram from Meta.</p><p>Connect with friends, share what you’re up to, or see what's new from others all over the world. Explore our community where you can feel free to be yourself and share everything from your daily moments to life's highlights.</p><p>Express yourself and connect with friends: add photos and videos to your story that disappear after 24 hours, and bring them to life with fun creative tools.</p></div>
    </section>
  </main>
  <footer><span class="footer__Copyright">© Aptoide</span></footer>
</body>
</html>
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> ValidatedUrl {
        ValidatedUrl::parse("https://instagram.en.aptoide.com/app").unwrap()
    }

    #[tokio::test]
    async fn test_static_fetcher_counts_calls() {
        let fetcher = StaticPageFetcher::ok("<p>hi</p>");
        assert_eq!(fetcher.calls(), 0);
        let page = fetcher.fetch(&listing()).await.unwrap();
        assert_eq!(page.body(), "<p>hi</p>");
        fetcher.fetch(&listing()).await.unwrap();
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_static_fetcher_failures() {
        let err = StaticPageFetcher::with_status(503, "")
            .fetch(&listing())
            .await
            .unwrap_err();
        assert_eq!(err.upstream_status(), Some(503));

        let err = StaticPageFetcher::timeout()
            .fetch(&listing())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout { .. }));
    }
}
