//! JSON-LD extraction from HTML
//!
//! Reads every <script type="application/ld+json"> block. A block holding an
//! array contributes each element as its own item; anything else (including
//! `@graph` containers) is one item.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

use crate::error::ParseError;

static JSONLD_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#)
        .expect("Failed to parse JSON-LD selector - this is a bug")
});

// Whole-line `//` comments, as left behind by CMS templates
static COMMENT_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*//.*$").expect("Failed to compile comment regex"));

static HTML_COMMENT_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!--|-->").expect("Failed to compile comment marker regex"));

/// Extract JSON-LD items in document order
pub fn extract_jsonld(document: &Html) -> Result<Vec<Value>, ParseError> {
    let mut items = Vec::new();

    for (block, element) in document.select(&JSONLD_SELECTOR).enumerate() {
        let content = element.text().collect::<String>();
        let trimmed = content.trim();

        if trimmed.is_empty() {
            continue;
        }

        let json = parse_block(trimmed).map_err(|e| ParseError::JsonLd {
            block,
            message: e.to_string(),
        })?;

        match json {
            Value::Array(arr) => items.extend(arr),
            other => items.push(other),
        }
    }

    Ok(items)
}

/// Parse one script body, retrying once on a cleaned-up copy
fn parse_block(raw: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(raw).or_else(|first_err| {
        let cleaned = clean_block(raw);
        match serde_json::from_str(&cleaned) {
            Ok(value) => {
                debug!("JSON-LD block parsed after cleanup");
                Ok(value)
            }
            Err(_) => Err(first_err),
        }
    })
}

fn clean_block(raw: &str) -> String {
    let without_markers = HTML_COMMENT_MARKER_RE.replace_all(raw, "");
    let without_comments = COMMENT_LINE_RE.replace_all(&without_markers, "");
    escape_control_chars(&without_comments)
}

/// Escape raw control characters inside string literals so they survive
/// parsing unchanged; outside strings they become plain spaces
fn escape_control_chars(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in json.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            } else if c.is_control() {
                match c {
                    '\n' => out.push_str("\\n"),
                    '\r' => out.push_str("\\r"),
                    '\t' => out.push_str("\\t"),
                    other => out.push_str(&format!("\\u{:04x}", other as u32)),
                }
                continue;
            }
        } else if c == '"' {
            in_string = true;
        } else if c.is_control() && !c.is_ascii_whitespace() {
            out.push(' ');
            continue;
        }
        out.push(c);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> Result<Vec<Value>, ParseError> {
        extract_jsonld(&Html::parse_document(html))
    }

    #[test]
    fn test_extract_simple_jsonld() {
        let html = r#"
        <html>
        <head>
            <script type="application/ld+json">
            {
                "@context": "https://schema.org",
                "@type": "Product",
                "name": "Test Product",
                "price": "19.99"
            }
            </script>
        </head>
        </html>
        "#;

        let items = extract(html).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["@type"], "Product");
        assert_eq!(items[0]["name"], "Test Product");
    }

    #[test]
    fn test_array_block_and_graph() {
        let html = r#"
        <script type="application/ld+json">
        [{"@type": "Organization", "name": "Org"}, {"@type": "WebSite"}]
        </script>
        <script type="application/ld+json">
        {
            "@context": "https://schema.org",
            "@graph": [
                {"@type": "Product", "name": "Product 1"},
                {"@type": "Organization", "name": "Org 1"}
            ]
        }
        </script>
        "#;

        let items = extract(html).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0]["name"], "Org");
        assert_eq!(items[1]["@type"], "WebSite");
        assert_eq!(items[2]["@graph"][1]["name"], "Org 1");
    }

    #[test]
    fn test_empty_and_other_scripts_ignored() {
        let html = r#"
        <script type="application/ld+json">   </script>
        <script type="text/javascript">var x = {"@type": "Nope"};</script>
        "#;
        assert!(extract(html).unwrap().is_empty());
    }

    #[test]
    fn test_commented_block_is_recovered() {
        let html = "<script type=\"application/ld+json\">\n<!--\n// generated\n{\"@type\": \"Event\", \"name\": \"Line\nbreak\"}\n-->\n</script>";

        let items = extract(html).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["@type"], "Event");
        assert_eq!(items[0]["name"], "Line\nbreak");
    }

    #[test]
    fn test_raw_control_chars_in_strings_are_kept() {
        let html = "<script type=\"application/ld+json\">{\"name\": \"a\tb\", \"note\": \"x\u{1}y\"}</script>";

        let items = extract(html).unwrap();
        assert_eq!(items[0]["name"], "a\tb");
        assert_eq!(items[0]["note"], "x\u{1}y");
    }

    #[test]
    fn test_escape_control_chars() {
        assert_eq!(escape_control_chars("{\"a\":\n\"x\ty\"}"), "{\"a\":\n\"x\\ty\"}");
        assert_eq!(escape_control_chars(r#"{"q":"say \"hi\"\t"}"#), r#"{"q":"say \"hi\"\t"}"#);
        assert_eq!(escape_control_chars("{\"b\":\"\u{7f}\"}"), "{\"b\":\"\\u007f\"}");
    }

    #[test]
    fn test_invalid_block_is_an_error() {
        let html = r#"
        <script type="application/ld+json">{"@type": "Fine"}</script>
        <script type="application/ld+json">{"@type": "Broken",</script>
        "#;

        match extract(html) {
            Err(ParseError::JsonLd { block, .. }) => assert_eq!(block, 1),
            other => panic!("expected JSON-LD error, got {:?}", other),
        }
    }
}
