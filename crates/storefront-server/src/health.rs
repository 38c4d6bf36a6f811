//! Liveness endpoint.
//!
//! `/health` answers as long as the process is serving requests. It never
//! touches the upstream site.
//!
//! # Example
//!
//! ```rust
//! use storefront_server::HealthCheck;
//!
//! let health = HealthCheck::new("storefront", "1.2.3");
//! let status = health.status();
//!
//! assert!(status.is_healthy());
//! assert_eq!(status.version(), "1.2.3");
//! ```

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Body of a `/health` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    status: String,
    service: String,
    version: String,
    uptime_seconds: u64,
}

impl HealthStatus {
    /// A healthy status with the given uptime.
    #[must_use]
    pub fn healthy(service: impl Into<String>, version: impl Into<String>, uptime: Duration) -> Self {
        Self {
            status: "healthy".to_string(),
            service: service.into(),
            version: version.into(),
            uptime_seconds: uptime.as_secs(),
        }
    }

    /// Returns `true` if the status is "healthy".
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }

    /// Service name.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Service version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Whole seconds since the server started.
    #[must_use]
    pub fn uptime_seconds(&self) -> u64 {
        self.uptime_seconds
    }
}

/// Tracks identity and start time for `/health`.
#[derive(Debug, Clone)]
pub struct HealthCheck {
    service: String,
    version: String,
    started: Instant,
}

impl HealthCheck {
    /// Starts the uptime clock now.
    #[must_use]
    pub fn new(service: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            version: version.into(),
            started: Instant::now(),
        }
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> HealthStatus {
        HealthStatus::healthy(&self.service, &self.version, self.started.elapsed())
    }
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self::new("storefront", env!("CARGO_PKG_VERSION"))
    }
}
