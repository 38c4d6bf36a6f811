//! The assembled app record.

use serde::Serialize;

use crate::error::Field;

/// Structured data for one app listing.
///
/// Records come out of [`Scraper::get_app_record`](crate::Scraper::get_app_record)
/// with all five fields present and non-empty. Fields are read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppRecord {
    #[serde(rename = "app_name")]
    name: String,
    #[serde(rename = "app_version")]
    version: String,
    #[serde(rename = "app_downloads")]
    downloads: String,
    release_date: String,
    description: String,
}

impl AppRecord {
    pub(crate) fn new(
        name: String,
        version: String,
        downloads: String,
        release_date: String,
        description: String,
    ) -> Self {
        Self {
            name,
            version,
            downloads,
            release_date,
            description,
        }
    }

    /// App display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current version string.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Download bucket, e.g. `500M+`.
    pub fn downloads(&self) -> &str {
        &self.downloads
    }

    /// Release date, `DD-MM-YYYY` on current pages.
    pub fn release_date(&self) -> &str {
        &self.release_date
    }

    /// Long-form description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Value of a field by name.
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Version => &self.version,
            Field::Downloads => &self.downloads,
            Field::ReleaseDate => &self.release_date,
            Field::Description => &self.description,
        }
    }

    /// Serialize to JSON. Non-ASCII text is written as-is.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
