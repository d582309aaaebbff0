//! Flattening of nested items into (path, value) pairs
//!
//! Paths descend through mappings with `.key` and through sequences with
//! `[index]`, e.g. `offers[0].price`. Only leaves produce output; empty
//! mappings and sequences vanish.

use crate::value::ItemValue;

/// One leaf of a flattened item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathValue {
    pub path: String,
    pub value: String,
}

/// Flatten `value` under `prefix`, appending one entry per leaf to `out`
pub fn flatten_item(prefix: &str, value: &ItemValue, out: &mut Vec<PathValue>) {
    match value {
        ItemValue::Mapping(entries) => {
            for (key, child) in entries {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_item(&path, child, out);
            }
        }
        ItemValue::Sequence(items) => {
            for (i, child) in items.iter().enumerate() {
                flatten_item(&format!("{}[{}]", prefix, i), child, out);
            }
        }
        ItemValue::Null | ItemValue::Scalar(_) => out.push(PathValue {
            path: prefix.to_string(),
            value: value.render(),
        }),
    }
}

/// Convenience wrapper flattening from the item root
pub fn flatten(value: &ItemValue) -> Vec<PathValue> {
    let mut out = Vec::new();
    flatten_item("", value, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(value: serde_json::Value) -> Vec<(String, String)> {
        flatten(&ItemValue::from(value))
            .into_iter()
            .map(|pv| (pv.path, pv.value))
            .collect()
    }

    #[test]
    fn test_nested_paths() {
        assert_eq!(
            pairs(json!({"a": {"b": [1, 2]}})),
            vec![
                ("a.b[0]".to_string(), "1".to_string()),
                ("a.b[1]".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_root_scalar() {
        assert_eq!(pairs(json!("hello")), vec![(String::new(), "hello".to_string())]);
    }

    #[test]
    fn test_null_is_empty_string() {
        assert_eq!(pairs(json!({"x": null})), vec![("x".to_string(), String::new())]);
    }

    #[test]
    fn test_empty_containers_produce_nothing() {
        assert!(pairs(json!({})).is_empty());
        assert!(pairs(json!([])).is_empty());
        assert_eq!(
            pairs(json!({"a": {}, "b": [], "c": [[], {"d": {}}], "e": 0})),
            vec![("e".to_string(), "0".to_string())]
        );
    }

    #[test]
    fn test_one_row_per_leaf() {
        let product = json!({
            "@context": "https://schema.org",
            "@type": ["Product", "Thing"],
            "name": "Widget",
            "offers": [
                {"@type": "Offer", "price": 19.99, "available": true},
                {"@type": "Offer", "price": "21", "seller": {"name": "ACME"}}
            ]
        });
        let rows = pairs(product);
        assert_eq!(rows.len(), 10);
        assert!(rows.contains(&("@type[1]".to_string(), "Thing".to_string())));
        assert!(rows.contains(&("offers[0].price".to_string(), "19.99".to_string())));
        assert!(rows.contains(&("offers[0].available".to_string(), "true".to_string())));
        assert!(rows.contains(&("offers[1].seller.name".to_string(), "ACME".to_string())));
    }

    #[test]
    fn test_prefix_applies_to_sequences_at_root() {
        let mut out = Vec::new();
        flatten_item("", &ItemValue::from(json!(["a", "b"])), &mut out);
        assert_eq!(out[0].path, "[0]");
        assert_eq!(out[1].path, "[1]");

        out.clear();
        flatten_item("root", &ItemValue::from(json!({"k": "v"})), &mut out);
        assert_eq!(out[0].path, "root.k");
    }
}
