//! Single-page extraction in an isolated browser session.
//!
//! [`PageExtractor::extract`] always returns a [`ScrapeResult`]. Every
//! failure mode (session creation, navigation, HTTP status, timeouts) is
//! turned into a [`ScrapeResult::Failure`] carrying a readable cause.

use crate::config::ExtractorConfig;
use crate::content;
use crate::http;
use crate::render::{PageRenderer, RenderSession, SessionProfile};
use crate::types::ScrapeResult;
use rand::Rng;
use std::time::Duration;

/// Renders one URL and pulls out its title and main text.
pub struct PageExtractor<R> {
    renderer: R,
    config: ExtractorConfig,
}

impl<R: PageRenderer> PageExtractor<R> {
    /// Create an extractor drawing sessions from `renderer`.
    pub fn new(renderer: R, config: ExtractorConfig) -> Self {
        Self { renderer, config }
    }

    /// The renderer sessions are drawn from.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// The extraction settings.
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Scrape `url` in a fresh session.
    ///
    /// The session is closed on every path. If this future is dropped
    /// mid-flight, the session's own drop guard releases it.
    pub async fn extract(&self, url: &str) -> ScrapeResult {
        let profile = self.session_profile();
        let delay = self.pre_navigation_delay();

        let mut session = match self.renderer.open_session(&profile).await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(url, error = %e, "failed to open browser session");
                return ScrapeResult::failure(url, format!("Critical error: {e}"));
            }
        };

        let result = self.scrape(&mut session, url, delay).await;
        session.close().await;
        result
    }

    async fn scrape(&self, session: &mut R::Session, url: &str, delay: Duration) -> ScrapeResult {
        tracing::debug!(url, delay_ms = delay.as_millis() as u64, "waiting before navigation");
        tokio::time::sleep(delay).await;

        let navigation_timeout = self.config.navigation_timeout();
        let status = match tokio::time::timeout(navigation_timeout, session.navigate(url)).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                tracing::error!(url, error = %e, "error scraping page");
                return ScrapeResult::failure(url, e.to_string());
            }
            Err(_) => {
                tracing::error!(url, "navigation timed out");
                return ScrapeResult::failure(
                    url,
                    format!(
                        "Timeout: navigation to {url} exceeded {}s",
                        navigation_timeout.as_secs()
                    ),
                );
            }
        };

        match status {
            None => {
                tracing::warn!(url, "no response");
                return ScrapeResult::failure(url, "No response");
            }
            Some(code) if code >= 400 => {
                tracing::warn!(url, status = code, "error status code");
                return ScrapeResult::failure(url, format!("HTTP status {code}"));
            }
            Some(_) => {}
        }

        match tokio::time::timeout(self.config.body_wait_timeout(), session.wait_for_selector("body"))
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(url, error = %e, "waiting for body failed"),
            Err(_) => tracing::warn!(url, "timeout waiting for body"),
        }

        let html = match session.content().await {
            Ok(html) => html,
            Err(e) => {
                tracing::error!(url, error = %e, "failed to read page content");
                return ScrapeResult::failure(url, e.to_string());
            }
        };

        let text = content::extract_text(&html, url, &self.config);
        tracing::info!(url, chars = text.content.chars().count(), "scraped page");
        ScrapeResult::success(url, text.title, text.content)
    }

    fn session_profile(&self) -> SessionProfile {
        SessionProfile {
            user_agent: http::user_agent_or_random(self.config.user_agent.as_deref()),
            viewport: self.config.viewport,
            javascript_enabled: self.config.javascript_enabled,
            ignore_https_errors: self.config.ignore_https_errors,
        }
    }

    fn pre_navigation_delay(&self) -> Duration {
        let (min, max) = self.config.request_delay_ms;
        if max <= min {
            return Duration::from_millis(min);
        }
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}
