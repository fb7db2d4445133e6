//! Request entry point: resolve candidate URLs, scrape them, shape the response.

use crate::aggregator::{panic_message, BatchOutcome, ResultAggregator};
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::extractor::PageExtractor;
use crate::render::PageRenderer;
use crate::resolver::QueryResolver;
use crate::types::{Query, SearchResponse};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;

/// Sequences [`QueryResolver`] and [`ResultAggregator`] for one query at a time.
///
/// Holds no per-request state, so one orchestrator can serve concurrent
/// requests behind an `Arc`.
pub struct SearchOrchestrator<R> {
    resolver: QueryResolver,
    aggregator: ResultAggregator<R>,
}

impl<R: PageRenderer> SearchOrchestrator<R> {
    /// Build the pipeline from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `config` fails validation, or
    /// [`SearchError::Http`] if the backend client cannot be built.
    pub fn new(config: SearchConfig, renderer: R) -> Result<Self, SearchError> {
        config.validate()?;
        let SearchConfig {
            resolver,
            extractor,
            aggregator,
        } = config;

        Ok(Self {
            resolver: QueryResolver::new(resolver)?,
            aggregator: ResultAggregator::new(PageExtractor::new(renderer, extractor), aggregator),
        })
    }

    /// The renderer pages are scraped with.
    pub fn renderer(&self) -> &R {
        self.aggregator.extractor().renderer()
    }

    /// Run the whole pipeline for `query`.
    ///
    /// Never fails: backend problems, per-page failures, the batch deadline
    /// and unexpected panics all map to a [`SearchResponse`].
    pub async fn handle(&self, query: &Query) -> SearchResponse {
        catch_internal_errors(query, self.run(query)).await
    }

    async fn run(&self, query: &Query) -> SearchResponse {
        let urls = self.resolver.resolve(&query.text, query.max_results).await;
        if urls.is_empty() {
            tracing::warn!("no URLs found from search");
            return SearchResponse::no_urls(query);
        }

        match self.aggregator.aggregate(&urls).await {
            BatchOutcome::Completed(pages) => {
                if pages.is_empty() {
                    tracing::warn!(total_urls = urls.len(), "no valid content scraped");
                }
                SearchResponse::completed(query, urls.len(), pages)
            }
            BatchOutcome::DeadlineExceeded => SearchResponse::timed_out(query, urls.len()),
        }
    }
}

async fn catch_internal_errors<F>(query: &Query, pipeline: F) -> SearchResponse
where
    F: Future<Output = SearchResponse>,
{
    match AssertUnwindSafe(pipeline).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(error = %message, "unexpected error while handling search");
            SearchResponse::internal_error(query, message)
        }
    }
}
