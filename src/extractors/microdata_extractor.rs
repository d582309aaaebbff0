//! Microdata (itemscope/itemprop/itemtype) extraction
//!
//! Items come out in the uniform JSON-LD-like shape: `@context` and `@type`
//! derived from the itemtype IRI, `@id` from itemid, then the properties.
//! Reference: https://html.spec.whatwg.org/multipage/microdata.html

use std::collections::HashSet;
use std::sync::LazyLock;

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

const DEFAULT_CONTEXT: &str = "http://schema.org";

static ITEMSCOPE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[itemscope]").expect("Failed to parse itemscope selector - this is a bug")
});

static ID_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[id]").expect("Failed to parse id selector - this is a bug"));

/// Elements already claimed while extracting one item
struct ItemWalk<'s> {
    /// Item scopes currently being extracted, outermost first
    scopes: &'s mut Vec<NodeId>,
    /// Elements whose properties already went into this item
    seen: HashSet<NodeId>,
}

/// Extract top-level microdata items in document order.
///
/// Top-level items are `itemscope` elements that are not themselves the value
/// of an `itemprop`.
pub fn extract_microdata(document: &Html, base_url: &Url) -> Vec<Value> {
    let mut scopes = Vec::new();
    document
        .select(&ITEMSCOPE_SELECTOR)
        .filter(|el| el.value().attr("itemprop").is_none())
        .map(|el| extract_item(document, &el, base_url, true, &mut scopes))
        .collect()
}

fn extract_item(
    document: &Html,
    element: &ElementRef,
    base_url: &Url,
    top_level: bool,
    scopes: &mut Vec<NodeId>,
) -> Value {
    let mut item: Map<String, Value> = Map::new();

    let types: Vec<&str> = element
        .value()
        .attr("itemtype")
        .map(|t| t.split_whitespace().collect())
        .unwrap_or_default();

    let mut context = DEFAULT_CONTEXT.to_string();
    let mut type_names = Vec::with_capacity(types.len());
    for (i, itemtype) in types.iter().enumerate() {
        let (type_context, name) = split_itemtype(itemtype);
        if i == 0 {
            if let Some(c) = type_context {
                context = c;
            }
        }
        type_names.push(Value::String(name));
    }

    if top_level {
        item.insert("@context".to_string(), Value::String(context));
    }
    match type_names.len() {
        0 => {}
        1 => {
            item.insert("@type".to_string(), type_names.remove(0));
        }
        _ => {
            item.insert("@type".to_string(), Value::Array(type_names));
        }
    }

    if let Some(itemid) = element.value().attr("itemid") {
        item.insert("@id".to_string(), Value::String(resolve(itemid.trim(), base_url)));
    }

    scopes.push(element.id());
    let mut walk = ItemWalk {
        scopes,
        seen: HashSet::from([element.id()]),
    };

    let mut props: Vec<(String, Value)> = Vec::new();
    collect_properties(document, element, base_url, &mut walk, &mut props);

    // itemref pulls in properties from elements elsewhere in the page
    if let Some(refs) = element.value().attr("itemref") {
        for id in refs.split_whitespace() {
            let referenced = document
                .select(&ID_SELECTOR)
                .find(|el| el.value().id() == Some(id));
            let Some(referenced) = referenced else {
                continue;
            };
            // An ancestor's subtree contains this item again
            if element.ancestors().any(|a| a.id() == referenced.id()) {
                debug!(itemref = id, "skipping itemref to an enclosing element");
                continue;
            }
            visit_property_element(document, &referenced, base_url, &mut walk, &mut props);
        }
    }

    walk.scopes.pop();

    for (name, value) in props {
        insert_property(&mut item, name, value);
    }

    Value::Object(item)
}

/// Walk descendants of an item, stopping at nested item scopes
fn collect_properties(
    document: &Html,
    scope: &ElementRef,
    base_url: &Url,
    walk: &mut ItemWalk<'_>,
    props: &mut Vec<(String, Value)>,
) {
    for child in scope.children().filter_map(ElementRef::wrap) {
        visit_property_element(document, &child, base_url, walk, props);
    }
}

fn visit_property_element(
    document: &Html,
    element: &ElementRef,
    base_url: &Url,
    walk: &mut ItemWalk<'_>,
    props: &mut Vec<(String, Value)>,
) {
    if !walk.seen.insert(element.id()) {
        return;
    }

    if let Some(names) = element.value().attr("itemprop") {
        if let Some(value) = property_value(document, element, base_url, walk.scopes) {
            for name in names.split_whitespace() {
                props.push((name.to_string(), value.clone()));
            }
        }
    }

    // Properties below a nested scope belong to that item
    if element.value().attr("itemscope").is_none() {
        collect_properties(document, element, base_url, walk, props);
    }
}

/// Value of one itemprop element, `None` when it would nest an item inside itself
fn property_value(
    document: &Html,
    element: &ElementRef,
    base_url: &Url,
    scopes: &mut Vec<NodeId>,
) -> Option<Value> {
    if element.value().attr("itemscope").is_some() {
        if scopes.contains(&element.id()) {
            debug!("skipping item that contains itself");
            return None;
        }
        return Some(extract_item(document, element, base_url, false, scopes));
    }

    let el = element.value();
    let value = match el.name() {
        "meta" => el.attr("content").unwrap_or("").to_string(),
        "a" | "link" | "area" => resolve(el.attr("href").unwrap_or(""), base_url),
        "img" | "audio" | "video" | "source" | "iframe" | "embed" | "track" => {
            resolve(el.attr("src").unwrap_or(""), base_url)
        }
        "object" => resolve(el.attr("data").unwrap_or(""), base_url),
        "time" => el
            .attr("datetime")
            .map(str::to_string)
            .unwrap_or_else(|| element.text().collect::<String>()),
        "data" | "meter" => el.attr("value").unwrap_or("").to_string(),
        _ => element.text().collect::<String>(),
    };

    Some(Value::String(value.trim().to_string()))
}

/// Repeated properties turn into arrays
fn insert_property(item: &mut Map<String, Value>, name: String, value: Value) {
    if let Some(existing) = item.get_mut(&name) {
        match existing {
            Value::Array(arr) => arr.push(value),
            _ => {
                let old = existing.take();
                *existing = Value::Array(vec![old, value]);
            }
        }
    } else {
        item.insert(name, value);
    }
}

fn resolve(raw: &str, base_url: &Url) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    base_url
        .join(trimmed)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| trimmed.to_string())
}

/// Split an itemtype IRI into (context, type name).
///
/// `https://schema.org/Product` gives `("https://schema.org", "Product")`;
/// a fragment wins over the path, as in `http://purl.org/goodrelations/v1#Offering`.
/// Values that are not absolute IRIs are returned unchanged with no context.
fn split_itemtype(itemtype: &str) -> (Option<String>, String) {
    let parsed = match Url::parse(itemtype) {
        Ok(u) if u.host_str().is_some() => u,
        _ => return (None, itemtype.to_string()),
    };

    let origin = parsed.origin().ascii_serialization();
    let path = parsed.path();
    if path.is_empty() || path == "/" {
        return (None, itemtype.to_string());
    }

    match parsed.fragment().filter(|f| !f.is_empty()) {
        Some(fragment) => (
            Some(format!("{}{}", origin, path)),
            fragment.trim_matches('/').to_string(),
        ),
        None => (Some(origin), path.trim_matches('/').to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> Vec<Value> {
        let base = Url::parse("https://shop.example.com/products/widget").unwrap();
        extract_microdata(&Html::parse_document(html), &base)
    }

    #[test]
    fn test_extract_simple_microdata() {
        let html = r#"
        <div itemscope itemtype="https://schema.org/Product">
            <span itemprop="name">Test Product</span>
            <meta itemprop="gtin13" content="1234567890123">
            <span itemprop="price">19.99</span>
        </div>
        "#;

        let items = extract(html);
        assert_eq!(items.len(), 1);
        let product = &items[0];
        assert_eq!(product["@context"], "https://schema.org");
        assert_eq!(product["@type"], "Product");
        assert_eq!(product["name"], "Test Product");
        assert_eq!(product["gtin13"], "1234567890123");

        let keys: Vec<&str> = product.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["@context", "@type", "name", "gtin13", "price"]);
    }

    #[test]
    fn test_nested_microdata() {
        let html = r#"
        <div itemscope itemtype="https://schema.org/Product">
            <span itemprop="name">Product</span>
            <div itemprop="offers" itemscope itemtype="https://schema.org/Offer">
                <span itemprop="price">19.99</span>
                <link itemprop="availability" href="https://schema.org/InStock">
            </div>
        </div>
        "#;

        let items = extract(html);
        assert_eq!(items.len(), 1);
        let product = &items[0];
        assert!(product.get("price").is_none());
        let offer = &product["offers"];
        assert!(offer.get("@context").is_none());
        assert_eq!(offer["@type"], "Offer");
        assert_eq!(offer["price"], "19.99");
        assert_eq!(offer["availability"], "https://schema.org/InStock");
    }

    #[test]
    fn test_repeated_properties_and_urls() {
        let html = r##"
        <div itemscope itemtype="http://schema.org/Recipe" itemid="#recipe">
            <img itemprop="image" src="/img/a.jpg">
            <img itemprop="image" src="b.jpg">
            <a itemprop="url author" href="../about">About</a>
            <time itemprop="datePublished" datetime="2024-01-15">Jan 15</time>
        </div>
        "##;

        let items = extract(html);
        let recipe = &items[0];
        assert_eq!(recipe["@context"], "http://schema.org");
        assert_eq!(recipe["@id"], "https://shop.example.com/products/widget#recipe");
        assert_eq!(
            recipe["image"],
            serde_json::json!([
                "https://shop.example.com/img/a.jpg",
                "https://shop.example.com/products/b.jpg"
            ])
        );
        assert_eq!(recipe["url"], "https://shop.example.com/about");
        assert_eq!(recipe["author"], "https://shop.example.com/about");
        assert_eq!(recipe["datePublished"], "2024-01-15");
    }

    #[test]
    fn test_multiple_top_level_items_and_itemref() {
        let html = r#"
        <div itemscope itemtype="https://schema.org/Person" itemref="extra">
            <span itemprop="name">Ann</span>
        </div>
        <p id="extra"><span itemprop="jobTitle">Engineer</span></p>
        <div itemscope itemtype="https://schema.org/Organization https://schema.org/Brand">
            <span itemprop="name">ACME</span>
        </div>
        "#;

        let items = extract(html);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["jobTitle"], "Engineer");
        assert_eq!(items[1]["@type"], serde_json::json!(["Organization", "Brand"]));
    }

    #[test]
    fn test_self_referencing_itemref_terminates() {
        let html = r#"
        <div itemscope itemref="x">
            <div id="x" itemprop="p" itemscope itemref="x">
                <span itemprop="q">v</span>
            </div>
        </div>
        "#;

        let items = extract(html);
        assert_eq!(items.len(), 1);
        // Reached both as a child and through itemref, counted once
        assert_eq!(items[0]["p"], serde_json::json!({"q": "v"}));
    }

    #[test]
    fn test_itemref_to_enclosing_item_terminates() {
        let html = r#"
        <div itemscope>
            <div id="mid" itemprop="a" itemscope>
                <div itemprop="b" itemscope itemref="mid">
                    <span itemprop="c">v</span>
                </div>
                <span itemprop="d">w</span>
            </div>
        </div>
        <div itemscope itemref="loop">
            <div id="loop"><span itemprop="e">x</span></div>
        </div>
        "#;

        let items = extract(html);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["a"]["b"], serde_json::json!({"c": "v"}));
        assert_eq!(items[0]["a"]["d"], "w");
        assert_eq!(items[1]["e"], "x");
    }

    #[test]
    fn test_split_itemtype() {
        assert_eq!(
            split_itemtype("https://schema.org/Product"),
            (Some("https://schema.org".to_string()), "Product".to_string())
        );
        assert_eq!(
            split_itemtype("http://purl.org/goodrelations/v1#Offering"),
            (Some("http://purl.org/goodrelations/v1".to_string()), "Offering".to_string())
        );
        assert_eq!(split_itemtype("Product"), (None, "Product".to_string()));
        assert_eq!(
            split_itemtype("http://schema.org"),
            (None, "http://schema.org".to_string())
        );
    }

    #[test]
    fn test_untyped_item_gets_default_context() {
        let items = extract(r#"<div itemscope><span itemprop="name">x</span></div>"#);
        assert_eq!(items[0]["@context"], DEFAULT_CONTEXT);
        assert!(items[0].get("@type").is_none());
    }
}
