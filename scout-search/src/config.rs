//! Pipeline configuration with sensible defaults.
//!
//! [`SearchConfig`] is built once, validated, and handed to the resolver,
//! extractor and aggregator at construction time. The defaults mirror the
//! budgets the service was tuned with: 15s for discovery, 30s per page
//! navigation and 45s for a whole scrape batch.

use crate::error::SearchError;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration for the search pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Search backend (URL discovery) settings.
    pub resolver: ResolverConfig,
    /// Per-page rendering and extraction settings.
    pub extractor: ExtractorConfig,
    /// Batch fan-out settings.
    pub aggregator: AggregatorConfig,
}

/// Settings for the SearXNG query resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Base URL of the SearXNG instance.
    pub searxng_url: String,
    /// HTTP timeout for the backend request in seconds.
    pub timeout_seconds: u64,
    /// SearXNG category to search.
    pub categories: String,
    /// Result locale sent as the `language` parameter.
    pub language: String,
    /// Whether to request safe search filtering.
    pub safe_search: bool,
    /// Custom User-Agent string. If `None`, rotates through a built-in list
    /// of realistic browser User-Agents.
    pub user_agent: Option<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            searxng_url: "http://searxng:8080/".to_owned(),
            timeout_seconds: 15,
            categories: "general".to_owned(),
            language: "en-US".to_owned(),
            safe_search: true,
            user_agent: None,
        }
    }
}

impl ResolverConfig {
    /// The backend timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Browser viewport dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Per-domain selectors tried before the generic extraction chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRule {
    /// Registrable domain the rule applies to. Subdomains match too.
    pub domain: String,
    /// Selector for the headline. Falls back to `<title>` when absent or unmatched.
    #[serde(default)]
    pub title_selector: Option<String>,
    /// Selector for the body text blocks; matched elements are joined with a space.
    pub content_selector: String,
}

/// Settings for rendering and extracting a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Navigation timeout in seconds (DOM-content-loaded readiness).
    pub navigation_timeout_seconds: u64,
    /// How long to wait for a `<body>` element after navigation, in seconds.
    pub body_wait_timeout_seconds: u64,
    /// Random delay range in milliseconds `(min, max)` before navigating.
    pub request_delay_ms: (u64, u64),
    /// Viewport of every browser session.
    pub viewport: Viewport,
    /// Whether pages may run JavaScript.
    pub javascript_enabled: bool,
    /// Whether TLS certificate errors are ignored.
    pub ignore_https_errors: bool,
    /// Maximum number of characters of extracted content.
    pub max_content_chars: usize,
    /// Custom User-Agent for browser sessions. If `None`, one is picked at
    /// random per session.
    pub user_agent: Option<String>,
    /// Site-specific extraction rules.
    pub site_rules: Vec<SiteRule>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_seconds: 30,
            body_wait_timeout_seconds: 10,
            request_delay_ms: (500, 1500),
            viewport: Viewport::default(),
            javascript_enabled: true,
            ignore_https_errors: true,
            max_content_chars: 5000,
            user_agent: None,
            site_rules: default_site_rules(),
        }
    }
}

impl ExtractorConfig {
    /// The navigation timeout as a [`Duration`].
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_seconds)
    }

    /// The body-wait timeout as a [`Duration`].
    pub fn body_wait_timeout(&self) -> Duration {
        Duration::from_secs(self.body_wait_timeout_seconds)
    }
}

fn default_site_rules() -> Vec<SiteRule> {
    vec![
        SiteRule {
            domain: "cnn.com".to_owned(),
            title_selector: Some("h1.headline__text, h1.pg-headline".to_owned()),
            content_selector: ".article__content p".to_owned(),
        },
        SiteRule {
            domain: "bbc.com".to_owned(),
            title_selector: Some("h1#main-heading".to_owned()),
            content_selector: "[data-component='text-block']".to_owned(),
        },
    ]
}

/// Settings for the concurrent scrape batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Global deadline for a whole batch in seconds, measured from batch start.
    pub deadline_seconds: u64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            deadline_seconds: 45,
        }
    }
}

impl AggregatorConfig {
    /// The batch deadline as a [`Duration`].
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_seconds)
    }
}

/// How the shared headless browser process is launched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Path to a Chrome/Chromium binary. `None` lets chromiumoxide detect one.
    pub chrome_executable: Option<std::path::PathBuf>,
    /// Run without a visible window.
    pub headless: bool,
    /// Extra command-line switches appended after the built-in ones.
    pub extra_args: Vec<String>,
    /// Timeout for CDP requests issued to the browser, in seconds.
    pub request_timeout_seconds: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            chrome_executable: None,
            headless: true,
            extra_args: Vec::new(),
            request_timeout_seconds: 20,
        }
    }
}

impl BrowserSettings {
    /// The CDP request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl SearchConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `resolver.searxng_url` is an absolute http(s) URL
    /// - every timeout and the batch deadline are greater than 0
    /// - `extractor.request_delay_ms.0` is <= `extractor.request_delay_ms.1`
    /// - `extractor.max_content_chars` and the viewport are non-zero
    /// - every site rule has a domain and parseable selectors
    pub fn validate(&self) -> Result<(), SearchError> {
        let parsed = url::Url::parse(&self.resolver.searxng_url)
            .map_err(|e| SearchError::Config(format!("searxng_url is not a valid URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SearchError::Config(
                "searxng_url must use http or https".into(),
            ));
        }
        if self.resolver.timeout_seconds == 0 {
            return Err(SearchError::Config(
                "resolver timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.extractor.navigation_timeout_seconds == 0 {
            return Err(SearchError::Config(
                "navigation_timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.extractor.body_wait_timeout_seconds == 0 {
            return Err(SearchError::Config(
                "body_wait_timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.extractor.request_delay_ms.0 > self.extractor.request_delay_ms.1 {
            return Err(SearchError::Config(
                "request_delay_ms min must be <= max".into(),
            ));
        }
        if self.extractor.max_content_chars == 0 {
            return Err(SearchError::Config(
                "max_content_chars must be greater than 0".into(),
            ));
        }
        if self.extractor.viewport.width == 0 || self.extractor.viewport.height == 0 {
            return Err(SearchError::Config(
                "viewport dimensions must be greater than 0".into(),
            ));
        }
        for rule in &self.extractor.site_rules {
            if rule.domain.trim().is_empty() {
                return Err(SearchError::Config("site rule domain must not be empty".into()));
            }
            let selectors = std::iter::once(rule.content_selector.as_str())
                .chain(rule.title_selector.as_deref());
            for selector in selectors {
                Selector::parse(selector).map_err(|e| {
                    SearchError::Config(format!(
                        "invalid selector `{selector}` for {}: {e:?}",
                        rule.domain
                    ))
                })?;
            }
        }
        if self.aggregator.deadline_seconds == 0 {
            return Err(SearchError::Config(
                "deadline_seconds must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sensible_values() {
        let config = SearchConfig::default();
        assert_eq!(config.resolver.searxng_url, "http://searxng:8080/");
        assert_eq!(config.resolver.timeout_seconds, 15);
        assert_eq!(config.resolver.language, "en-US");
        assert_eq!(config.resolver.categories, "general");
        assert!(config.resolver.safe_search);
        assert_eq!(config.extractor.navigation_timeout_seconds, 30);
        assert_eq!(config.extractor.body_wait_timeout_seconds, 10);
        assert_eq!(config.extractor.request_delay_ms, (500, 1500));
        assert_eq!(config.extractor.viewport, Viewport { width: 1280, height: 720 });
        assert_eq!(config.extractor.max_content_chars, 5000);
        assert_eq!(config.aggregator.deadline_seconds, 45);
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(SearchConfig::default().validate().is_ok());
    }

    #[test]
    fn durations_follow_seconds() {
        let config = SearchConfig::default();
        assert_eq!(config.resolver.timeout(), Duration::from_secs(15));
        assert_eq!(config.extractor.navigation_timeout(), Duration::from_secs(30));
        assert_eq!(config.extractor.body_wait_timeout(), Duration::from_secs(10));
        assert_eq!(config.aggregator.deadline(), Duration::from_secs(45));
    }

    #[test]
    fn non_http_backend_rejected() {
        let mut config = SearchConfig::default();
        config.resolver.searxng_url = "ftp://searxng:8080/".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("http"));
    }

    #[test]
    fn relative_backend_url_rejected() {
        let mut config = SearchConfig::default();
        config.resolver.searxng_url = "searxng:8080".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_deadline_rejected() {
        let mut config = SearchConfig::default();
        config.aggregator.deadline_seconds = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("deadline_seconds"));
    }

    #[test]
    fn zero_navigation_timeout_rejected() {
        let mut config = SearchConfig::default();
        config.extractor.navigation_timeout_seconds = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("navigation_timeout_seconds"));
    }

    #[test]
    fn invalid_delay_range_rejected() {
        let mut config = SearchConfig::default();
        config.extractor.request_delay_ms = (1500, 500);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("delay"));
    }

    #[test]
    fn zero_delay_range_valid() {
        let mut config = SearchConfig::default();
        config.extractor.request_delay_ms = (0, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_viewport_rejected() {
        let mut config = SearchConfig::default();
        config.extractor.viewport.width = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_site_rule_selector_rejected() {
        let mut config = SearchConfig::default();
        config.extractor.site_rules.push(SiteRule {
            domain: "example.com".into(),
            title_selector: None,
            content_selector: "p[".into(),
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("example.com"));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: SearchConfig =
            serde_json::from_str(r#"{"aggregator": {"deadline_seconds": 5}}"#).expect("parse");
        assert_eq!(config.aggregator.deadline_seconds, 5);
        assert_eq!(config.extractor.max_content_chars, 5000);
        assert_eq!(config.resolver.timeout_seconds, 15);
    }

    #[test]
    fn browser_settings_default_headless() {
        let settings = BrowserSettings::default();
        assert!(settings.headless);
        assert!(settings.chrome_executable.is_none());
        assert!(settings.extra_args.is_empty());
    }
}
