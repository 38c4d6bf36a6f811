//! Listing URL validation.
//!
//! A [`ValidatedUrl`] can only be obtained through [`ValidatedUrl::parse`], so
//! holding one proves the checks below have passed. Fetchers accept nothing
//! else.

use std::fmt;

use ::url::Url;

use crate::error::ValidationError;

/// Required host suffix for listing pages.
pub const HOST_SUFFIX: &str = ".aptoide.com";

/// Required path for listing pages.
pub const APP_PATH: &str = "/app";

/// A URL that points at an app listing page.
///
/// # Example
///
/// ```
/// use storefront_core::ValidatedUrl;
///
/// let url = ValidatedUrl::parse("https://instagram.en.aptoide.com/app").unwrap();
/// assert_eq!(url.host(), "instagram.en.aptoide.com");
///
/// assert!(ValidatedUrl::parse("https://www.google.com").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUrl(Url);

impl ValidatedUrl {
    /// Validate a raw URL string.
    ///
    /// Checks run in order and stop at the first violation: the input must
    /// parse, the scheme must be `https`, the host must end with
    /// [`HOST_SUFFIX`], the path must be exactly [`APP_PATH`], and there must
    /// be no query component (a bare `?` counts as one).
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let url = Url::parse(raw).map_err(|e| ValidationError::Malformed {
            input: raw.to_string(),
            reason: e.to_string(),
        })?;

        if url.scheme() != "https" {
            return Err(ValidationError::Scheme {
                scheme: url.scheme().to_string(),
            });
        }

        let host = url.host_str().unwrap_or_default();
        if !host.ends_with(HOST_SUFFIX) {
            return Err(ValidationError::Host {
                host: host.to_string(),
                suffix: HOST_SUFFIX,
            });
        }

        if url.path() != APP_PATH {
            return Err(ValidationError::Path {
                path: url.path().to_string(),
                expected: APP_PATH,
            });
        }

        if let Some(query) = url.query() {
            return Err(ValidationError::Query {
                query: query.to_string(),
            });
        }

        Ok(Self(url))
    }

    /// The full URL as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The host, e.g. `instagram.en.aptoide.com`.
    pub fn host(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }

    /// The underlying parsed URL.
    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl fmt::Display for ValidatedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for ValidatedUrl {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_listing_url() {
        let url = ValidatedUrl::parse("https://instagram.en.aptoide.com/app").unwrap();
        assert_eq!(url.as_str(), "https://instagram.en.aptoide.com/app");
        assert_eq!(url.to_string(), url.as_str());
    }

    #[test]
    fn test_rejects_http_scheme() {
        let err = ValidatedUrl::parse("http://instagram.en.aptoide.com/app").unwrap_err();
        assert_eq!(
            err,
            ValidationError::Scheme {
                scheme: "http".into()
            }
        );
    }

    #[test]
    fn test_rejects_foreign_host() {
        let err = ValidatedUrl::parse("https://www.google.com").unwrap_err();
        assert!(matches!(err, ValidationError::Host { ref host, .. } if host == "www.google.com"));

        // The bare domain has no subdomain, so the suffix check fails.
        let err = ValidatedUrl::parse("https://aptoide.com/app").unwrap_err();
        assert!(matches!(err, ValidationError::Host { .. }));

        let err = ValidatedUrl::parse("https://evil-aptoide.com/app").unwrap_err();
        assert!(matches!(err, ValidationError::Host { .. }));
    }

    #[test]
    fn test_rejects_wrong_path() {
        for raw in [
            "https://instagram.en.aptoide.com",
            "https://instagram.en.aptoide.com/app/",
            "https://instagram.en.aptoide.com/apps",
            "https://instagram.en.aptoide.com/app/versions",
        ] {
            let err = ValidatedUrl::parse(raw).unwrap_err();
            assert!(matches!(err, ValidationError::Path { .. }), "{raw}: {err}");
        }
    }

    #[test]
    fn test_rejects_query() {
        let err = ValidatedUrl::parse("https://instagram.en.aptoide.com/app?lang=en").unwrap_err();
        assert_eq!(
            err,
            ValidationError::Query {
                query: "lang=en".into()
            }
        );

        let err = ValidatedUrl::parse("https://instagram.en.aptoide.com/app?").unwrap_err();
        assert!(matches!(err, ValidationError::Query { ref query } if query.is_empty()));
    }

    #[test]
    fn test_rejects_garbage() {
        for raw in ["", "instagram.en.aptoide.com/app", "not a url"] {
            let err = ValidatedUrl::parse(raw).unwrap_err();
            assert!(matches!(err, ValidationError::Malformed { .. }), "{raw}: {err}");
        }
    }

    #[test]
    fn test_scheme_checked_before_host() {
        let err = ValidatedUrl::parse("ftp://www.google.com/other?x=1").unwrap_err();
        assert!(matches!(err, ValidationError::Scheme { .. }));
    }
}
