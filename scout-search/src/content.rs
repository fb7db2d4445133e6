//! HTML content extraction: page title plus main-content text.
//!
//! Extraction is a pure function of the markup, the page URL and the
//! extractor settings, so the same document always yields the same output.
//! Site rules are tried first for matching hosts; otherwise the first
//! container found in [`CONTENT_CONTAINERS`] supplies the text.

use crate::config::{ExtractorConfig, SiteRule};
use scraper::{ElementRef, Html, Selector};

/// Containers tried in priority order; the first one present wins.
pub const CONTENT_CONTAINERS: &[&str] = &["article", "main", "div#content", "div.content", "body"];

/// Elements whose text never counts as readable content.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Title and body text pulled out of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    /// Page headline, trimmed. Empty when the document has none.
    pub title: String,
    /// Main-content text, truncated to the configured character limit.
    pub content: String,
}

/// Extract the title and main-content text of `html`, fetched from `url`.
pub fn extract_text(html: &str, url: &str, config: &ExtractorConfig) -> ExtractedText {
    let document = Html::parse_document(html);

    let rule = matching_site_rule(url, &config.site_rules);
    let ruled = rule.map(|rule| apply_site_rule(&document, rule));

    let title = ruled
        .as_ref()
        .and_then(|(title, _)| title.clone())
        .unwrap_or_else(|| extract_title(&document));
    let content = match ruled.and_then(|(_, content)| content) {
        Some(content) => content,
        None => extract_main_text(&document),
    };

    ExtractedText {
        title,
        content: truncate_chars(&content, config.max_content_chars),
    }
}

/// First `<title>` text, trimmed.
fn extract_title(document: &Html) -> String {
    let Ok(selector) = Selector::parse("title") else {
        return String::new();
    };
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>())
        .unwrap_or_default()
        .trim()
        .to_owned()
}

/// Text of the first container present in the document.
///
/// Non-empty `<p>` texts inside the container are joined with a single
/// space. A container without paragraphs contributes all its visible text.
fn extract_main_text(document: &Html) -> String {
    let Ok(paragraph) = Selector::parse("p") else {
        return String::new();
    };

    for selector_str in CONTENT_CONTAINERS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        let Some(container) = document.select(&selector).next() else {
            continue;
        };

        let mut paragraphs = container.select(&paragraph).peekable();
        if paragraphs.peek().is_none() {
            return visible_text(container);
        }
        return join_non_empty(paragraphs.map(visible_text));
    }

    String::new()
}

/// Trimmed text nodes under `element`, joined by single spaces, skipping
/// anything inside [`HIDDEN_ELEMENTS`].
fn visible_text(element: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    push_visible_text(element, &mut parts);
    parts.join(" ")
}

fn push_visible_text<'a>(element: ElementRef<'a>, parts: &mut Vec<&'a str>) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed);
            }
        } else if let Some(child_element) = ElementRef::wrap(child) {
            if !HIDDEN_ELEMENTS.contains(&child_element.value().name()) {
                push_visible_text(child_element, parts);
            }
        }
    }
}

fn join_non_empty(texts: impl Iterator<Item = String>) -> String {
    texts
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// The site rule whose domain equals the URL's host or is a parent of it.
fn matching_site_rule<'a>(url: &str, rules: &'a [SiteRule]) -> Option<&'a SiteRule> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    rules.iter().find(|rule| {
        let domain = rule.domain.trim().to_ascii_lowercase();
        host == domain || host.ends_with(&format!(".{domain}"))
    })
}

/// Apply a site rule, returning whichever of `(title, content)` matched.
fn apply_site_rule(document: &Html, rule: &SiteRule) -> (Option<String>, Option<String>) {
    let title = rule
        .title_selector
        .as_deref()
        .and_then(|sel| Selector::parse(sel).ok())
        .and_then(|selector| {
            document
                .select(&selector)
                .map(visible_text)
                .find(|text| !text.is_empty())
        });

    let content = Selector::parse(&rule.content_selector)
        .ok()
        .map(|selector| join_non_empty(document.select(&selector).map(visible_text)))
        .filter(|text| !text.is_empty());

    if content.is_none() {
        tracing::debug!(domain = %rule.domain, "site rule matched no content, using generic extraction");
    }
    (title, content)
}

/// The first `max_chars` Unicode scalar values of `text`.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_owned(),
        None => text.to_owned(),
    }
}
