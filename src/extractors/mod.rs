//! HTML structured-data extraction
//!
//! Each module handles one syntax. [`extract`] resolves the page's base URL,
//! runs the requested ones and returns the raw per-syntax output consumed by
//! the normalizer.

mod jsonld_extractor;
mod microdata_extractor;
mod rdfa_extractor;

pub use jsonld_extractor::*;
pub use microdata_extractor::*;
pub use rdfa_extractor::*;

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::error::ParseError;
use crate::normalize::Syntax;

static BASE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("base[href]").expect("Failed to parse base selector - this is a bug"));

/// Base URL for resolving relative links in a page.
///
/// The first `<base href>` wins when it resolves against the response URL,
/// otherwise the response URL itself is used.
pub fn resolve_base_url(document: &Html, final_url: &str) -> Result<Url, ParseError> {
    let page_url = Url::parse(final_url).map_err(|e| ParseError::InvalidUrl {
        url: final_url.to_string(),
        message: e.to_string(),
    })?;

    let declared = document
        .select(&BASE_SELECTOR)
        .next()
        .and_then(|el| el.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .and_then(|href| page_url.join(href).ok());

    Ok(declared.unwrap_or(page_url))
}

/// Extract the requested syntaxes from the HTML served at `page_url`
pub fn extract(html: &str, page_url: &str, syntaxes: &[Syntax]) -> Result<Map<String, Value>, ParseError> {
    let document = Html::parse_document(html);
    let base_url = resolve_base_url(&document, page_url)?;
    extract_document(&document, &base_url, syntaxes)
}

/// Extract the requested syntaxes from an already parsed document.
///
/// Each requested syntax maps to a JSON array of items.
pub fn extract_document(
    document: &Html,
    base_url: &Url,
    syntaxes: &[Syntax],
) -> Result<Map<String, Value>, ParseError> {
    let mut result = Map::new();

    for syntax in syntaxes {
        let items = match syntax {
            Syntax::JsonLd => extract_jsonld(document)?,
            Syntax::Microdata => extract_microdata(document, base_url),
            Syntax::Rdfa => extract_rdfa(document, base_url),
        };
        debug!(syntax = %syntax, items = items.len(), "extracted");
        result.insert(syntax.as_str().to_string(), Value::Array(items));
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_defaults_to_response_url() {
        let document = Html::parse_document("<html><head></head></html>");
        let base = resolve_base_url(&document, "https://example.com/a/b?q=1").unwrap();
        assert_eq!(base.as_str(), "https://example.com/a/b?q=1");
    }

    #[test]
    fn test_base_href_is_resolved_against_response_url() {
        let document = Html::parse_document(r#"<html><head><base href="/shop/"></head></html>"#);
        let base = resolve_base_url(&document, "https://example.com/a/b").unwrap();
        assert_eq!(base.as_str(), "https://example.com/shop/");
    }

    #[test]
    fn test_invalid_response_url() {
        let document = Html::parse_document("");
        let err = resolve_base_url(&document, "not a url").unwrap_err();
        assert!(matches!(err, ParseError::InvalidUrl { .. }));
    }

    #[test]
    fn test_only_requested_syntaxes_are_returned() {
        let html = r#"
        <script type="application/ld+json">{"@type": "Thing"}</script>
        <div itemscope itemtype="https://schema.org/Person"><span itemprop="name">Ann</span></div>
        "#;
        let result = extract(html, "https://example.com/", &[Syntax::JsonLd]).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result["json-ld"][0]["@type"], "Thing");

        let all = extract(html, "https://example.com/", &Syntax::ALL).unwrap();
        let keys: Vec<&str> = all.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["json-ld", "microdata", "rdfa"]);
        assert_eq!(all["microdata"][0]["name"], "Ann");
        assert_eq!(all["rdfa"], Value::Array(vec![]));
    }
}
