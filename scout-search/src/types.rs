//! Core types for queries, per-page scrape outcomes and the response envelope.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Number of URLs scraped when a request does not say otherwise.
pub const DEFAULT_MAX_RESULTS: usize = 3;

/// Message returned when the search backend yields no candidate URLs.
pub const NO_URLS_MESSAGE: &str = "No URLs found from search";

/// Message returned when the scrape batch exceeds its global deadline.
pub const TIMEOUT_MESSAGE: &str = "Timeout while scraping URLs";

/// Message returned when an unexpected fault is caught at the orchestrator boundary.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "Unexpected error while handling search";

/// A search request: query text plus how many result pages to scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// The text sent to the search backend.
    pub text: String,
    /// Maximum number of candidate URLs to scrape. Always at least 1.
    pub max_results: usize,
}

impl Query {
    /// Create a query. A `max_results` of 0 is raised to 1.
    pub fn new(text: impl Into<String>, max_results: usize) -> Self {
        Self {
            text: text.into(),
            max_results: max_results.max(1),
        }
    }
}

/// Readable content extracted from one rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScrapedPage {
    /// The URL that was rendered.
    pub url: String,
    /// Text of the page's `<title>` (or site-specific headline); may be empty.
    pub title: String,
    /// Main-content text, truncated to the configured limit; may be empty.
    pub content: String,
}

/// Why a page could not be scraped.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScrapeFailure {
    /// The URL that was attempted.
    pub url: String,
    /// Human-readable cause.
    pub error: String,
}

/// Outcome of scraping a single candidate URL.
///
/// Serialises as the flat `{url, title, content, success: true}` or
/// `{url, error, success: false}` shape consumed by chat front-ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeResult {
    /// The page rendered and its content was extracted (possibly empty).
    Success(ScrapedPage),
    /// The page could not be rendered or extracted.
    Failure(ScrapeFailure),
}

impl ScrapeResult {
    /// Build a success outcome.
    pub fn success(
        url: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::Success(ScrapedPage {
            url: url.into(),
            title: title.into(),
            content: content.into(),
        })
    }

    /// Build a failure outcome.
    pub fn failure(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Failure(ScrapeFailure {
            url: url.into(),
            error: error.into(),
        })
    }

    /// The URL this outcome belongs to.
    pub fn url(&self) -> &str {
        match self {
            Self::Success(page) => &page.url,
            Self::Failure(failure) => &failure.url,
        }
    }

    /// Whether the page was scraped successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The scraped page if it succeeded with non-empty content.
    pub fn into_valid_page(self) -> Option<ScrapedPage> {
        match self {
            Self::Success(page) if !page.content.is_empty() => Some(page),
            Self::Success(_) | Self::Failure(_) => None,
        }
    }
}

impl Serialize for ScrapedPage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ScrapedPage", 4)?;
        state.serialize_field("url", &self.url)?;
        state.serialize_field("title", &self.title)?;
        state.serialize_field("content", &self.content)?;
        state.serialize_field("success", &true)?;
        state.end()
    }
}

impl Serialize for ScrapeFailure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ScrapeFailure", 3)?;
        state.serialize_field("url", &self.url)?;
        state.serialize_field("error", &self.error)?;
        state.serialize_field("success", &false)?;
        state.end()
    }
}

impl Serialize for ScrapeResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Success(page) => page.serialize(serializer),
            Self::Failure(failure) => failure.serialize(serializer),
        }
    }
}

/// The terminal envelope returned for every search request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// The query text as received.
    pub query: String,
    /// Successfully scraped pages with non-empty content, in backend rank order.
    pub results: Vec<ScrapedPage>,
    /// Number of candidate URLs returned by the search backend.
    pub total_urls: usize,
    /// Number of entries in `results`.
    pub successful_scrapes: usize,
    /// True iff at least one page was scraped.
    pub success: bool,
    /// Explanation when nothing could be scraped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Diagnostic for an unexpected internal fault.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResponse {
    /// Envelope for a batch that finished within its deadline.
    pub fn completed(query: &Query, total_urls: usize, results: Vec<ScrapedPage>) -> Self {
        let successful_scrapes = results.len();
        Self {
            query: query.text.clone(),
            results,
            total_urls,
            successful_scrapes,
            success: successful_scrapes > 0,
            message: None,
            error: None,
        }
    }

    /// Envelope for a query the backend returned no URLs for.
    pub fn no_urls(query: &Query) -> Self {
        Self::unsuccessful(query, 0, NO_URLS_MESSAGE)
    }

    /// Envelope for a batch that exceeded the global deadline.
    pub fn timed_out(query: &Query, total_urls: usize) -> Self {
        Self::unsuccessful(query, total_urls, TIMEOUT_MESSAGE)
    }

    /// Envelope for an unexpected internal fault.
    pub fn internal_error(query: &Query, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::unsuccessful(query, 0, UNEXPECTED_ERROR_MESSAGE)
        }
    }

    fn unsuccessful(query: &Query, total_urls: usize, message: &str) -> Self {
        Self {
            query: query.text.clone(),
            results: Vec::new(),
            total_urls,
            successful_scrapes: 0,
            success: false,
            message: Some(message.to_owned()),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_clamps_zero_to_one() {
        let query = Query::new("rust", 0);
        assert_eq!(query.max_results, 1);
        assert_eq!(query.text, "rust");
    }

    #[test]
    fn success_serialises_with_flag() {
        let result = ScrapeResult::success("https://a.com", "A", "body text");
        let value = serde_json::to_value(&result).expect("serialize");
        assert_eq!(
            value,
            json!({"url": "https://a.com", "title": "A", "content": "body text", "success": true})
        );
    }

    #[test]
    fn failure_serialises_with_flag() {
        let result = ScrapeResult::failure("https://b.com", "HTTP status 404");
        let value = serde_json::to_value(&result).expect("serialize");
        assert_eq!(
            value,
            json!({"url": "https://b.com", "error": "HTTP status 404", "success": false})
        );
    }

    #[test]
    fn valid_page_requires_success_and_content() {
        assert!(ScrapeResult::success("u", "t", "c").into_valid_page().is_some());
        assert!(ScrapeResult::success("u", "t", "").into_valid_page().is_none());
        assert!(ScrapeResult::failure("u", "boom").into_valid_page().is_none());
    }

    #[test]
    fn url_accessor_covers_both_variants() {
        assert_eq!(ScrapeResult::success("https://a.com", "", "").url(), "https://a.com");
        assert_eq!(ScrapeResult::failure("https://b.com", "x").url(), "https://b.com");
    }

    #[test]
    fn completed_envelope_counts() {
        let query = Query::new("capital of France", 3);
        let pages = vec![ScrapedPage {
            url: "https://a.com".into(),
            title: "A".into(),
            content: "Paris".into(),
        }];
        let response = SearchResponse::completed(&query, 3, pages);
        assert_eq!(response.total_urls, 3);
        assert_eq!(response.successful_scrapes, 1);
        assert!(response.success);
        assert!(response.message.is_none());
    }

    #[test]
    fn completed_with_nothing_is_unsuccessful() {
        let query = Query::new("q", 3);
        let response = SearchResponse::completed(&query, 2, Vec::new());
        assert!(!response.success);
        assert_eq!(response.total_urls, 2);
    }

    #[test]
    fn no_urls_envelope_shape() {
        let response = SearchResponse::no_urls(&Query::new("nothing", 3));
        let value = serde_json::to_value(&response).expect("serialize");
        assert_eq!(
            value,
            json!({
                "query": "nothing",
                "results": [],
                "total_urls": 0,
                "successful_scrapes": 0,
                "success": false,
                "message": "No URLs found from search"
            })
        );
    }

    #[test]
    fn timed_out_envelope_keeps_url_count() {
        let response = SearchResponse::timed_out(&Query::new("slow", 3), 3);
        assert_eq!(response.total_urls, 3);
        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some(TIMEOUT_MESSAGE));
    }

    #[test]
    fn internal_error_carries_message() {
        let response = SearchResponse::internal_error(&Query::new("q", 1), "boom");
        assert_eq!(response.error.as_deref(), Some("boom"));
        assert!(!response.success);
        assert!(response.results.is_empty());
    }

    #[test]
    fn response_deserialises_from_wire_shape() {
        let raw = r#"{"query":"q","results":[{"url":"u","title":"t","content":"c","success":true}],
            "total_urls":1,"successful_scrapes":1,"success":true}"#;
        let response: SearchResponse = serde_json::from_str(raw).expect("deserialize");
        assert_eq!(response.results[0].content, "c");
        assert!(response.message.is_none());
    }
}
