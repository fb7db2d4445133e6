//! URL discovery through a SearXNG instance's JSON API.
//!
//! [`QueryResolver::resolve`] never fails: an unreachable backend, a timeout,
//! a non-2xx status or a malformed body are logged and turned into an empty
//! candidate list so the orchestrator can short-circuit.

use crate::config::ResolverConfig;
use crate::error::SearchError;
use crate::http;
use serde::Deserialize;
use serde_json::Value;

/// Shape of the SearXNG JSON response. Only `results` is read; each record
/// is kept as raw JSON so one malformed record cannot fail the whole page.
#[derive(Debug, Deserialize)]
struct SearxngResponse {
    #[serde(default)]
    results: Vec<Value>,
}

/// Resolves a text query into ranked candidate URLs.
pub struct QueryResolver {
    client: reqwest::Client,
    config: ResolverConfig,
}

impl QueryResolver {
    /// Create a resolver with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new(config: ResolverConfig) -> Result<Self, SearchError> {
        let client = http::build_client(&config)?;
        Ok(Self { client, config })
    }

    /// The backend settings this resolver was built with.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Return up to `max_results` URLs for `query`, in backend rank order.
    ///
    /// Duplicates are passed through. Any backend problem yields an empty list.
    pub async fn resolve(&self, query: &str, max_results: usize) -> Vec<String> {
        tracing::info!(query, max_results, "searching");

        let body = match self.fetch(query).await {
            Ok(body) => body,
            Err(SearchError::Timeout(reason)) => {
                tracing::error!(%reason, "SearXNG request timed out");
                return Vec::new();
            }
            Err(err) => {
                tracing::error!(error = %err, "SearXNG lookup failed");
                return Vec::new();
            }
        };

        match parse_result_urls(&body, max_results) {
            Ok(urls) => {
                tracing::info!(count = urls.len(), "found URLs");
                urls
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to parse JSON from SearXNG");
                Vec::new()
            }
        }
    }

    /// Issue the backend request and return the raw body of a 2xx response.
    async fn fetch(&self, query: &str) -> Result<String, SearchError> {
        let safesearch = if self.config.safe_search { "1" } else { "0" };
        let params = [
            ("q", query),
            ("format", "json"),
            ("categories", self.config.categories.as_str()),
            ("language", self.config.language.as_str()),
            ("safesearch", safesearch),
            ("pageno", "1"),
        ];
        let user_agent = http::user_agent_or_random(self.config.user_agent.as_deref());

        let response = self
            .client
            .get(&self.config.searxng_url)
            .query(&params)
            .header(reqwest::header::USER_AGENT, user_agent)
            .send()
            .await
            .map_err(|e| classify_request_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Http(format!(
                "SearXNG returned status code {}",
                status.as_u16()
            )));
        }

        response.text().await.map_err(|e| classify_request_error(&e))
    }
}

fn classify_request_error(err: &reqwest::Error) -> SearchError {
    if err.is_timeout() {
        SearchError::Timeout(format!("SearXNG request: {err}"))
    } else if err.is_connect() {
        SearchError::Http(format!("connection error to SearXNG: {err}"))
    } else {
        SearchError::Http(format!("SearXNG request failed: {err}"))
    }
}

/// Extract the `url` of each of the first `max_results` result records.
///
/// Records without a string `url` are skipped, so fewer than `max_results`
/// URLs may come back even when the backend had more results.
pub(crate) fn parse_result_urls(body: &str, max_results: usize) -> Result<Vec<String>, SearchError> {
    let response: SearxngResponse =
        serde_json::from_str(body).map_err(|e| SearchError::Parse(e.to_string()))?;

    let urls = response
        .results
        .iter()
        .take(max_results)
        .enumerate()
        .filter_map(|(rank, record)| match record.get("url").and_then(Value::as_str) {
            Some(url) => Some(url.to_owned()),
            None => {
                tracing::debug!(rank, "skipping result record without a url");
                None
            }
        })
        .collect();

    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver_for(server: &MockServer) -> QueryResolver {
        let config = ResolverConfig {
            searxng_url: format!("{}/", server.uri()),
            timeout_seconds: 1,
            ..Default::default()
        };
        QueryResolver::new(config).expect("client")
    }

    #[test]
    fn parse_takes_top_k_in_order() {
        let body = json!({"results": [
            {"url": "https://a.com", "title": "A"},
            {"url": "https://b.com"},
            {"url": "https://c.com"},
            {"url": "https://d.com"}
        ]})
        .to_string();
        let urls = parse_result_urls(&body, 3).expect("parse");
        assert_eq!(urls, vec!["https://a.com", "https://b.com", "https://c.com"]);
    }

    #[test]
    fn parse_skips_records_without_url() {
        let body = json!({"results": [
            {"title": "no url"},
            {"url": 42},
            {"url": "https://ok.com"}
        ]})
        .to_string();
        let urls = parse_result_urls(&body, 3).expect("parse");
        assert_eq!(urls, vec!["https://ok.com"]);
    }

    #[test]
    fn parse_keeps_duplicates() {
        let body = json!({"results": [{"url": "https://a.com"}, {"url": "https://a.com"}]}).to_string();
        let urls = parse_result_urls(&body, 5).expect("parse");
        assert_eq!(urls.len(), 2);
    }

    #[test]
    fn parse_missing_results_is_empty() {
        let urls = parse_result_urls("{}", 3).expect("parse");
        assert!(urls.is_empty());
    }

    #[test]
    fn parse_rejects_non_json() {
        let err = parse_result_urls("<html>rate limited</html>", 3).unwrap_err();
        assert!(matches!(err, SearchError::Parse(_)));
    }

    #[tokio::test]
    async fn resolve_sends_expected_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("q", "capital of France"))
            .and(query_param("format", "json"))
            .and(query_param("categories", "general"))
            .and(query_param("language", "en-US"))
            .and(query_param("safesearch", "1"))
            .and(query_param("pageno", "1"))
            .and(header_exists("user-agent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"url": "https://en.wikipedia.org/wiki/Paris"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let urls = resolver_for(&server).resolve("capital of France", 3).await;
        assert_eq!(urls, vec!["https://en.wikipedia.org/wiki/Paris"]);
    }

    #[tokio::test]
    async fn resolve_non_success_status_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        assert!(resolver_for(&server).resolve("q", 3).await.is_empty());
    }

    #[tokio::test]
    async fn resolve_malformed_body_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        assert!(resolver_for(&server).resolve("q", 3).await.is_empty());
    }

    #[tokio::test]
    async fn resolve_timeout_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"results": [{"url": "https://late.com"}]}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        assert!(resolver_for(&server).resolve("q", 3).await.is_empty());
    }

    #[tokio::test]
    async fn resolve_unreachable_backend_is_empty() {
        let config = ResolverConfig {
            searxng_url: "http://127.0.0.1:9/".into(),
            timeout_seconds: 1,
            ..Default::default()
        };
        let resolver = QueryResolver::new(config).expect("client");
        assert!(resolver.resolve("q", 3).await.is_empty());
    }

    #[tokio::test]
    async fn resolve_honours_custom_user_agent_and_safe_search_off() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("safesearch", "0"))
            .and(wiremock::matchers::header("user-agent", "ScoutTest/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .expect(1)
            .mount(&server)
            .await;

        let config = ResolverConfig {
            searxng_url: format!("{}/", server.uri()),
            safe_search: false,
            user_agent: Some("ScoutTest/1.0".into()),
            ..Default::default()
        };
        let resolver = QueryResolver::new(config).expect("client");
        assert!(resolver.resolve("q", 3).await.is_empty());
    }
}
