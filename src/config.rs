//! Service configuration loaded from TOML with environment overrides.
//!
//! Resolution order for [`ServiceConfig::load`]:
//! 1. an explicit path (from `--config`)
//! 2. the path in `SCOUT_CONFIG`
//! 3. [`ServiceConfig::default_config_path`] if that file exists
//! 4. built-in defaults
//!
//! `SCOUT_SEARXNG_URL`, `SCOUT_HOST`, `SCOUT_PORT` and `SCOUT_CHROME` are
//! applied on top of whichever source was used.

use crate::error::{Result, ServiceError};
use scout_search::{BrowserSettings, DEFAULT_MAX_RESULTS, SearchConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "SCOUT_CONFIG";

/// Top-level configuration for the search service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP listener and request limits.
    pub server: ServerConfig,
    /// Search pipeline settings.
    pub search: SearchConfig,
    /// Headless browser launch settings.
    pub browser: BrowserSettings,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Port to listen on (`0` = auto-assign).
    pub port: u16,
    /// Pages scraped when a request omits `max_results`.
    pub default_max_results: usize,
    /// Upper bound applied to a request's `max_results`.
    pub max_results_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 5069,
            default_max_results: DEFAULT_MAX_RESULTS,
            max_results_limit: 10,
        }
    }
}

impl ServerConfig {
    /// The number of pages to scrape for a request asking for `requested`.
    pub fn effective_max_results(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_max_results)
            .min(self.max_results_limit)
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ServiceError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ServiceError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/scout/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("scout").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("scout")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/scout-config/config.toml")
        }
    }

    /// Resolve, override and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a named config file is missing or invalid, an
    /// override cannot be parsed, or the result fails validation.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let named = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        let mut config = match named {
            Some(path) => {
                tracing::info!(path = %path.display(), "loading config");
                Self::from_file(&path)?
            }
            None => {
                let path = Self::default_config_path();
                if path.is_file() {
                    tracing::info!(path = %path.display(), "loading config");
                    Self::from_file(&path)?
                } else {
                    tracing::info!("no config file found, using defaults");
                    Self::default()
                }
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `SCOUT_*` overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Config`] if `SCOUT_PORT` is not a valid port.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("SCOUT_SEARXNG_URL") {
            self.search.resolver.searxng_url = url;
        }
        if let Some(host) = lookup("SCOUT_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SCOUT_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|e| ServiceError::Config(format!("SCOUT_PORT `{port}` is not a port: {e}")))?;
        }
        if let Some(chrome) = lookup("SCOUT_CHROME") {
            self.browser.chrome_executable = Some(PathBuf::from(chrome));
        }
        Ok(())
    }

    /// Validate server limits and the search pipeline settings.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.server.default_max_results == 0 {
            return Err(ServiceError::Config(
                "default_max_results must be greater than 0".into(),
            ));
        }
        if self.server.max_results_limit < self.server.default_max_results {
            return Err(ServiceError::Config(
                "max_results_limit must be >= default_max_results".into(),
            ));
        }
        if self.browser.request_timeout_seconds == 0 {
            return Err(ServiceError::Config(
                "browser request_timeout_seconds must be greater than 0".into(),
            ));
        }
        self.search.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = ServiceConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5069);
        assert_eq!(config.server.default_max_results, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn effective_max_results_defaults_and_clamps() {
        let server = ServerConfig::default();
        assert_eq!(server.effective_max_results(None), 3);
        assert_eq!(server.effective_max_results(Some(5)), 5);
        assert_eq!(server.effective_max_results(Some(50)), 10);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut config = ServiceConfig::default();
        config.server.port = 8088;
        config.search.resolver.searxng_url = "http://localhost:8888/".into();
        config.search.aggregator.deadline_seconds = 20;
        config.save_to_file(&path).expect("save");

        let loaded = ServiceConfig::from_file(&path).expect("load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[server]\nport = 9000\n\n[search.extractor]\nmax_content_chars = 2000\n",
        )
        .expect("write");

        let config = ServiceConfig::from_file(&path).expect("load");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.search.extractor.max_content_chars, 2000);
        assert_eq!(config.search.extractor.navigation_timeout_seconds, 30);
        assert!(config.browser.headless);
    }

    #[test]
    fn explicit_path_is_loaded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scout.toml");
        std::fs::write(&path, "[server]\nmax_results_limit = 4\n").expect("write");

        let config = ServiceConfig::load(Some(&path)).expect("load");
        assert_eq!(config.server.max_results_limit, 4);
    }

    #[test]
    fn from_file_nonexistent_returns_error() {
        let result = ServiceConfig::from_file(Path::new("/nonexistent/path/config.toml"));
        assert!(matches!(result, Err(ServiceError::Io(_))));
    }

    #[test]
    fn from_file_invalid_toml_returns_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").expect("write");

        let result = ServiceConfig::from_file(&path);
        assert!(matches!(result, Err(ServiceError::Config(_))));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = ServiceConfig::default();
        config
            .apply_overrides(lookup(&[
                ("SCOUT_SEARXNG_URL", "http://search.internal:8080/"),
                ("SCOUT_HOST", "127.0.0.1"),
                ("SCOUT_PORT", " 7000 "),
                ("SCOUT_CHROME", "/usr/bin/chromium"),
            ]))
            .expect("overrides");

        assert_eq!(config.search.resolver.searxng_url, "http://search.internal:8080/");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 7000);
        assert_eq!(
            config.browser.chrome_executable,
            Some(PathBuf::from("/usr/bin/chromium"))
        );
    }

    #[test]
    fn bad_port_override_is_rejected() {
        let mut config = ServiceConfig::default();
        let err = config
            .apply_overrides(lookup(&[("SCOUT_PORT", "http")]))
            .unwrap_err();
        assert!(err.to_string().contains("SCOUT_PORT"));
    }

    #[test]
    fn limit_below_default_is_rejected() {
        let mut config = ServiceConfig::default();
        config.server.max_results_limit = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_search_section_is_rejected() {
        let mut config = ServiceConfig::default();
        config.search.resolver.searxng_url = "not a url".into();
        assert!(matches!(config.validate(), Err(ServiceError::Search(_))));
    }

    #[test]
    fn default_config_path_ends_with_config_toml() {
        let path = ServiceConfig::default_config_path();
        let path_str = path.to_string_lossy();
        assert!(path_str.ends_with("config.toml"));
        assert!(path_str.contains("scout"));
    }
}
