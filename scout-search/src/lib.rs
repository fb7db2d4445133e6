//! # scout-search
//!
//! Query → URL discovery → bounded concurrent scrape → partial-failure-tolerant
//! aggregation.
//!
//! A text query is sent to a SearXNG instance, the top result URLs are
//! rendered concurrently in isolated headless-browser sessions, and the
//! readable content of every page that could be scraped is returned, even
//! when some pages fail or the batch runs out of time.
//!
//! ## Design
//!
//! - [`QueryResolver`] talks to SearXNG and absorbs every backend failure
//!   into an empty candidate list
//! - [`PageExtractor`] renders one URL through a [`PageRenderer`] and turns
//!   every failure into a [`ScrapeResult::Failure`]
//! - [`ResultAggregator`] runs all extractions concurrently under one batch
//!   deadline and keeps input order
//! - [`SearchOrchestrator`] sequences the stages and never fails outward
//!
//! Configuration is passed in explicitly; there is no global state.
//!
//! ## Examples
//!
//! ```no_run
//! # async fn example() -> scout_search::Result<()> {
//! use scout_search::{BrowserSettings, ChromiumRenderer, Query, SearchConfig, SearchOrchestrator};
//!
//! let renderer = ChromiumRenderer::new(BrowserSettings::default());
//! let orchestrator = SearchOrchestrator::new(SearchConfig::default(), renderer)?;
//! let response = orchestrator.handle(&Query::new("capital of France", 3)).await;
//! for page in &response.results {
//!     println!("{}: {}", page.title, page.url);
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod config;
pub mod content;
pub mod error;
pub mod extractor;
pub mod http;
pub mod orchestrator;
pub mod render;
pub mod resolver;
pub mod types;

pub use aggregator::{BatchOutcome, ResultAggregator};
pub use config::{
    AggregatorConfig, BrowserSettings, ExtractorConfig, ResolverConfig, SearchConfig, SiteRule,
    Viewport,
};
pub use error::{Result, SearchError};
pub use extractor::PageExtractor;
pub use orchestrator::SearchOrchestrator;
pub use render::{
    ChromiumRenderer, FixturePage, FixtureRenderer, PageRenderer, RenderSession, SessionProfile,
};
pub use resolver::QueryResolver;
pub use types::{Query, ScrapeFailure, ScrapeResult, ScrapedPage, SearchResponse, DEFAULT_MAX_RESULTS};
