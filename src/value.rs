//! Closed value model for extracted items
//!
//! Extraction hands back loosely shaped JSON. Everything downstream of the
//! normalizer works on [`ItemValue`] instead, so the flattener and classifier
//! match on a fixed set of shapes rather than probing `serde_json::Value`.

use std::fmt;

use serde_json::{Map, Number, Value};

/// Leaf value of an item
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Number(Number),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

/// One node of an extracted item
#[derive(Debug, Clone, PartialEq)]
pub enum ItemValue {
    Null,
    Scalar(Scalar),
    Sequence(Vec<ItemValue>),
    /// Key/value pairs in extraction order
    Mapping(Vec<(String, ItemValue)>),
}

impl ItemValue {
    pub fn text(s: impl Into<String>) -> Self {
        ItemValue::Scalar(Scalar::Text(s.into()))
    }

    /// Look up a key when this value is a mapping
    pub fn get(&self, key: &str) -> Option<&ItemValue> {
        match self {
            ItemValue::Mapping(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// `false` for null, `false`, zero, and empty strings, sequences or mappings
    pub fn is_truthy(&self) -> bool {
        match self {
            ItemValue::Null => false,
            ItemValue::Scalar(Scalar::Bool(b)) => *b,
            ItemValue::Scalar(Scalar::Number(n)) => n.as_f64().map_or(true, |f| f != 0.0),
            ItemValue::Scalar(Scalar::Text(s)) => !s.is_empty(),
            ItemValue::Sequence(items) => !items.is_empty(),
            ItemValue::Mapping(entries) => !entries.is_empty(),
        }
    }

    /// Text form used in flat rows and type labels.
    ///
    /// Null renders as the empty string and containers as compact JSON.
    pub fn render(&self) -> String {
        match self {
            ItemValue::Null => String::new(),
            ItemValue::Scalar(s) => s.to_string(),
            ItemValue::Sequence(_) | ItemValue::Mapping(_) => self.to_compact_json(),
        }
    }

    pub fn to_compact_json(&self) -> String {
        Value::from(self).to_string()
    }
}

impl From<Value> for ItemValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ItemValue::Null,
            Value::Bool(b) => ItemValue::Scalar(Scalar::Bool(b)),
            Value::Number(n) => ItemValue::Scalar(Scalar::Number(n)),
            Value::String(s) => ItemValue::Scalar(Scalar::Text(s)),
            Value::Array(arr) => ItemValue::Sequence(arr.into_iter().map(ItemValue::from).collect()),
            Value::Object(obj) => {
                ItemValue::Mapping(obj.into_iter().map(|(k, v)| (k, ItemValue::from(v))).collect())
            }
        }
    }
}

impl From<&ItemValue> for Value {
    fn from(value: &ItemValue) -> Self {
        match value {
            ItemValue::Null => Value::Null,
            ItemValue::Scalar(Scalar::Bool(b)) => Value::Bool(*b),
            ItemValue::Scalar(Scalar::Number(n)) => Value::Number(n.clone()),
            ItemValue::Scalar(Scalar::Text(s)) => Value::String(s.clone()),
            ItemValue::Sequence(items) => Value::Array(items.iter().map(Value::from).collect()),
            ItemValue::Mapping(entries) => {
                let mut map = Map::new();
                for (k, v) in entries {
                    map.insert(k.clone(), Value::from(v));
                }
                Value::Object(map)
            }
        }
    }
}
