//! Layered configuration loading.
//!
//! Layers apply in order, each overriding the one before:
//! 1. Built-in defaults or a preset
//! 2. A TOML or JSON file
//! 3. Variables from a `.env` file, if loaded
//! 4. `PREFIX__SECTION__KEY` environment variables

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use storefront_telemetry::LogFormat;

use crate::{ConfigError, ErrorStatusMode, StorefrontConfig};

/// Default environment variable prefix.
pub const DEFAULT_ENV_PREFIX: &str = "STOREFRONT";

/// Configuration loader.
///
/// # Example
///
/// ```no_run
/// use storefront_config::ConfigLoader;
///
/// # fn main() -> Result<(), storefront_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_file("storefront.toml")?
///     .with_env_prefix("STOREFRONT")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: StorefrontConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a loader starting from default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: StorefrontConfig::default(),
            env_prefix: None,
        }
    }

    /// Start from the development preset.
    ///
    /// ```
    /// use storefront_config::{ConfigLoader, LogFormat};
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.logging.format, LogFormat::Pretty);
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = StorefrontConfig::development();
        self
    }

    /// Start from the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = StorefrontConfig::production();
        self
    }

    /// Load a file, picking the format from its extension (`.toml` or `.json`).
    ///
    /// The file replaces the current values; keys it leaves out take their
    /// defaults.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing, unreadable, malformed, has an
    /// unsupported extension, or contains unknown keys.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read(path, e))?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_string();

        self.config = parse(&content, &format)?;
        Ok(self)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is not an error.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in the named format.
    ///
    /// ```
    /// use storefront_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [server]
    ///     http_addr = "127.0.0.1:3000"
    ///     error_status = "legacy"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.server.http_addr, "127.0.0.1:3000");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, format)?;
        Ok(self)
    }

    /// Read `PREFIX__SECTION__KEY` environment variables on [`load`](Self::load).
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load variables from a `.env` file in the working directory or its
    /// parents into the process environment. A missing file is ignored.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(ConfigError::Dotenv(e.to_string())),
        }
    }

    /// Like [`with_dotenv`](Self::with_dotenv) for an explicit path.
    pub fn with_dotenv_file<P: Into<PathBuf>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.into();
        dotenvy::from_path(&path).map_err(|e| ConfigError::Dotenv(format!("{}: {e}", path.display())))?;
        Ok(self)
    }

    /// Apply environment overrides and validate.
    ///
    /// ```
    /// use storefront_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().load().unwrap();
    /// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
    /// ```
    pub fn load(mut self) -> Result<StorefrontConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let vars: HashMap<String, String> = env::vars()
                .filter(|(k, _)| k.starts_with(&prefix))
                .collect();
            self.apply_env_vars(&vars, &prefix)?;
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Return the configuration without env overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> StorefrontConfig {
        self.config
    }

    fn apply_env_vars(
        &mut self,
        vars: &HashMap<String, String>,
        prefix: &str,
    ) -> Result<(), ConfigError> {
        // Sorted so that failures are reported deterministically.
        let mut keys: Vec<&String> = vars.keys().collect();
        keys.sort();
        for key in keys {
            self.apply_env_var(key, &vars[key], prefix)?;
        }
        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(rest) = key.strip_prefix(prefix).and_then(|k| k.strip_prefix("__")) else {
            // Shares the prefix but is not one of ours, e.g. STOREFRONTS_HOME.
            return Ok(());
        };

        let parts: Vec<&str> = rest.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            ["SERVER", "HTTP_ADDR"] => config.server.http_addr = value.to_string(),
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                config.server.shutdown_timeout_secs = parse_u64(key, value)?;
            }
            ["SERVER", "REQUEST_TIMEOUT_MS"] => {
                config.server.request_timeout_ms = parse_u64(key, value)?;
            }
            ["SERVER", "INDEX_PAGE"] => {
                config.server.index_page = non_empty(value).map(PathBuf::from);
            }
            ["SERVER", "ERROR_STATUS"] => {
                config.server.error_status = match value.to_lowercase().as_str() {
                    "semantic" => ErrorStatusMode::Semantic,
                    "legacy" => ErrorStatusMode::Legacy,
                    _ => {
                        return Err(ConfigError::env(
                            key,
                            "expected 'semantic' or 'legacy'",
                        ))
                    }
                };
            }

            ["SCRAPER", "CONNECT_TIMEOUT_MS"] => {
                config.scraper.connect_timeout_ms = parse_u64(key, value)?;
            }
            ["SCRAPER", "REQUEST_TIMEOUT_MS"] => {
                config.scraper.request_timeout_ms = parse_u64(key, value)?;
            }
            ["SCRAPER", "USER_AGENT"] => config.scraper.user_agent = non_empty(value),

            ["LOGGING", "ENABLED"] => {
                config.logging.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env(key, "expected boolean"))?;
            }
            ["LOGGING", "LEVEL"] => config.logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["LOGGING", "INCLUDE_LOCATION"] => {
                config.logging.include_location = parse_bool(value)
                    .ok_or_else(|| ConfigError::env(key, "expected boolean"))?;
            }

            _ => return Err(ConfigError::env(key, "unknown configuration key")),
        }

        Ok(())
    }
}

fn parse(content: &str, format: &str) -> Result<StorefrontConfig, ConfigError> {
    match format.to_lowercase().as_str() {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::format(other)),
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env(key, "expected integer"))
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_loader_defaults() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, StorefrontConfig::default());
    }

    #[test]
    fn test_loader_with_production() {
        let config = ConfigLoader::new().with_production().load().unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{"scraper": {"user_agent": "bot/2"}, "logging": {"format": "pretty"}}"#;
        let config = ConfigLoader::new()
            .with_string(json, "json")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.scraper.user_agent.as_deref(), Some("bot/2"));
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.server.http_addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_loader_rejects_unknown_keys() {
        let toml = "[server]\nmax_connections = 10\n";
        assert!(matches!(
            ConfigLoader::new().with_string(toml, "toml"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_loader_rejects_unknown_format() {
        let err = ConfigLoader::new().with_string("a: b", "yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Format { .. }));
    }

    #[test]
    fn test_loader_with_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nrequest_timeout_ms = 5000\nerror_status = \"legacy\"\n\n[scraper]\nrequest_timeout_ms = 4000"
        )
        .unwrap();

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert_eq!(config.server.request_timeout_ms, 5000);
        assert_eq!(config.server.error_status, ErrorStatusMode::Legacy);
    }

    #[test]
    fn test_loader_missing_file() {
        let err = ConfigLoader::new()
            .with_file("/nonexistent/storefront.toml")
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));

        assert!(ConfigLoader::new()
            .with_optional_file("/nonexistent/storefront.toml")
            .is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_vars(
                &vars(&[
                    ("STOREFRONT__SERVER__HTTP_ADDR", "127.0.0.1:9000"),
                    ("STOREFRONT__SERVER__ERROR_STATUS", "LEGACY"),
                    ("STOREFRONT__SCRAPER__CONNECT_TIMEOUT_MS", "750"),
                    ("STOREFRONT__LOGGING__FORMAT", "pretty"),
                    ("STOREFRONT__LOGGING__ENABLED", "off"),
                ]),
                "STOREFRONT",
            )
            .unwrap();

        let config = loader.load_unvalidated();
        assert_eq!(config.server.http_addr, "127.0.0.1:9000");
        assert_eq!(config.server.error_status, ErrorStatusMode::Legacy);
        assert_eq!(config.scraper.connect_timeout_ms, 750);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(!config.logging.enabled);
    }

    #[test]
    fn test_env_override_errors() {
        let mut loader = ConfigLoader::new();
        let err = loader
            .apply_env_var("STOREFRONT__SERVER__REQUEST_TIMEOUT_MS", "soon", "STOREFRONT")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { .. }));

        let err = loader
            .apply_env_var("STOREFRONT__SERVER__MAX_CONNECTIONS", "5", "STOREFRONT")
            .unwrap_err();
        assert!(err.to_string().contains("unknown configuration key"));

        // Same prefix, different variable.
        assert!(loader
            .apply_env_var("STOREFRONTS_HOME", "/srv", "STOREFRONT")
            .is_ok());
    }

    #[test]
    fn test_env_clears_optional_values() {
        let mut loader = ConfigLoader::new();
        loader.config.scraper.user_agent = Some("old".to_string());
        loader
            .apply_env_var("STOREFRONT__SCRAPER__USER_AGENT", "", "STOREFRONT")
            .unwrap();
        assert!(loader.config.scraper.user_agent.is_none());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("Yes"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
