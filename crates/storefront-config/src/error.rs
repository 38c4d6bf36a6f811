//! Configuration errors.

use std::path::PathBuf;

use thiserror::Error;

/// Why a configuration could not be produced.
///
/// Keys are reported in dotted form (`server.http_addr`) and environment
/// overrides by their full variable name.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `--config` pointed at a file that does not exist.
    #[error("config file {path} does not exist")]
    FileNotFound {
        /// Path as given.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("cannot read config file {path}: {source}")]
    Read {
        /// Path as given.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the schema.
    #[error("bad TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// The file is not valid JSON or does not match the schema.
    #[error("bad JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// Only `.toml` and `.json` files are read.
    #[error("config files must end in .toml or .json, got '{extension}'")]
    Format {
        /// Extension that was found, possibly empty.
        extension: String,
    },

    /// A value parsed but is out of range or malformed.
    #[error("{key}: {reason}")]
    Invalid {
        /// Dotted key, e.g. `scraper.request_timeout_ms`.
        key: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A `STOREFRONT__*` variable could not be applied.
    #[error("environment variable {var}: {reason}")]
    Env {
        /// Full variable name.
        var: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A `.env` file exists but could not be loaded.
    #[error("cannot load .env file: {0}")]
    Dotenv(String),
}

impl ConfigError {
    /// A missing config file.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// An unreadable config file.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// A file with an extension other than `.toml` or `.json`.
    pub fn format(extension: impl Into<String>) -> Self {
        Self::Format {
            extension: extension.into(),
        }
    }

    /// An invalid value under `key`.
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// A bad environment override.
    pub fn env(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Env {
            var: var.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_culprit() {
        let err = ConfigError::file_not_found("/etc/storefront/config.toml");
        assert_eq!(
            err.to_string(),
            "config file /etc/storefront/config.toml does not exist"
        );

        let err = ConfigError::invalid("server.http_addr", "not a socket address");
        assert_eq!(err.to_string(), "server.http_addr: not a socket address");

        let err = ConfigError::format("yaml");
        assert!(err.to_string().contains("'yaml'"));
    }

    #[test]
    fn test_env_error() {
        let err = ConfigError::env("STOREFRONT__SERVER__REQUEST_TIMEOUT_MS", "expected integer");
        let msg = err.to_string();
        assert!(msg.starts_with("environment variable STOREFRONT__SERVER__REQUEST_TIMEOUT_MS"));
        assert!(msg.ends_with("expected integer"));
    }

    #[test]
    fn test_read_error_keeps_source() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ConfigError::read("/root/secret.toml", io);
        assert!(err.source().is_some());
    }
}
