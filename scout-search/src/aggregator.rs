//! Concurrent fan-out of page extractions under one batch deadline.
//!
//! All extractions of a batch are polled together inside the calling task
//! with [`futures::future::join_all`], so results come back in input order
//! regardless of completion order. When the deadline fires the whole batch
//! future is dropped, which cancels every in-flight extraction and lets each
//! session's drop guard release its browser context.

use crate::config::AggregatorConfig;
use crate::error::SearchError;
use crate::extractor::PageExtractor;
use crate::render::PageRenderer;
use crate::types::{ScrapeResult, ScrapedPage};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;

/// Result of one scrape batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The batch finished in time. Holds successful pages with non-empty
    /// content, in input order.
    Completed(Vec<ScrapedPage>),
    /// The batch deadline elapsed; all partial results were discarded.
    DeadlineExceeded,
}

impl BatchOutcome {
    /// The scraped pages, or nothing if the deadline was exceeded.
    pub fn into_pages(self) -> Vec<ScrapedPage> {
        match self {
            Self::Completed(pages) => pages,
            Self::DeadlineExceeded => Vec::new(),
        }
    }
}

/// Runs one [`PageExtractor`] invocation per URL, concurrently.
pub struct ResultAggregator<R> {
    extractor: PageExtractor<R>,
    config: AggregatorConfig,
}

impl<R: PageRenderer> ResultAggregator<R> {
    /// Create an aggregator around `extractor`.
    pub fn new(extractor: PageExtractor<R>, config: AggregatorConfig) -> Self {
        Self { extractor, config }
    }

    /// The extractor each URL is handed to.
    pub fn extractor(&self) -> &PageExtractor<R> {
        &self.extractor
    }

    /// Scrape every URL and return exactly one outcome per URL, in input order.
    ///
    /// A panicking extraction becomes a [`ScrapeResult::Failure`] carrying the
    /// panic message; its siblings are unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Timeout`] if the batch deadline elapses before
    /// every extraction has finished.
    pub async fn scrape_all(&self, urls: &[String]) -> Result<Vec<ScrapeResult>, SearchError> {
        let deadline = self.config.deadline();
        tracing::info!(count = urls.len(), deadline_secs = deadline.as_secs(), "scraping batch");

        let tasks = urls.iter().map(|url| self.extract_guarded(url));
        tokio::time::timeout(deadline, futures::future::join_all(tasks))
            .await
            .map_err(|_| {
                SearchError::Timeout(format!("scrape batch exceeded {}s", deadline.as_secs()))
            })
    }

    /// Scrape every URL and keep the successful pages with content.
    pub async fn aggregate(&self, urls: &[String]) -> BatchOutcome {
        match self.scrape_all(urls).await {
            Ok(results) => {
                let pages: Vec<ScrapedPage> = results
                    .into_iter()
                    .filter_map(ScrapeResult::into_valid_page)
                    .collect();
                tracing::info!(
                    total = urls.len(),
                    successful = pages.len(),
                    "scrape batch finished"
                );
                BatchOutcome::Completed(pages)
            }
            Err(e) => {
                tracing::error!(error = %e, "timeout while scraping URLs");
                BatchOutcome::DeadlineExceeded
            }
        }
    }

    async fn extract_guarded(&self, url: &str) -> ScrapeResult {
        match AssertUnwindSafe(self.extractor.extract(url)).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(url, error = %message, "extraction panicked");
                ScrapeResult::failure(url, message)
            }
        }
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "task panicked".to_owned()
    }
}
