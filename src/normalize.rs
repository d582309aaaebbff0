//! Per-syntax result normalization

use std::fmt;

use serde_json::{Map, Value};

use crate::value::ItemValue;

/// Structured-data syntaxes the extractor understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Syntax {
    JsonLd,
    Microdata,
    Rdfa,
}

impl Syntax {
    /// All syntaxes in output order
    pub const ALL: [Syntax; 3] = [Syntax::JsonLd, Syntax::Microdata, Syntax::Rdfa];

    pub fn as_str(&self) -> &'static str {
        match self {
            Syntax::JsonLd => "json-ld",
            Syntax::Microdata => "microdata",
            Syntax::Rdfa => "rdfa",
        }
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Items found on one page, grouped by syntax.
///
/// Every syntax is always present, possibly with no items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyntaxResultSet {
    pub json_ld: Vec<ItemValue>,
    pub microdata: Vec<ItemValue>,
    pub rdfa: Vec<ItemValue>,
}

impl SyntaxResultSet {
    pub fn get(&self, syntax: Syntax) -> &[ItemValue] {
        match syntax {
            Syntax::JsonLd => &self.json_ld,
            Syntax::Microdata => &self.microdata,
            Syntax::Rdfa => &self.rdfa,
        }
    }

    fn get_mut(&mut self, syntax: Syntax) -> &mut Vec<ItemValue> {
        match syntax {
            Syntax::JsonLd => &mut self.json_ld,
            Syntax::Microdata => &mut self.microdata,
            Syntax::Rdfa => &mut self.rdfa,
        }
    }

    /// Iterate `(syntax, items)` in output order
    pub fn iter(&self) -> impl Iterator<Item = (Syntax, &[ItemValue])> + '_ {
        Syntax::ALL.into_iter().map(move |syntax| (syntax, self.get(syntax)))
    }

    pub fn item_count(&self) -> usize {
        self.json_ld.len() + self.microdata.len() + self.rdfa.len()
    }

    /// Compact JSON object keyed by syntax name
    pub fn to_compact_json(&self) -> String {
        let mut map = Map::new();
        for (syntax, items) in self.iter() {
            map.insert(
                syntax.as_str().to_string(),
                Value::Array(items.iter().map(Value::from).collect()),
            );
        }
        Value::Object(map).to_string()
    }
}

/// Coerce raw extraction output into a [`SyntaxResultSet`].
///
/// Missing or falsy entries become empty lists, a lone item is wrapped in a
/// list and keys other than the three known syntaxes are dropped.
pub fn normalize_items(extracted: &Map<String, Value>) -> SyntaxResultSet {
    let mut out = SyntaxResultSet::default();

    for syntax in Syntax::ALL {
        let raw = match extracted.get(syntax.as_str()) {
            Some(v) => ItemValue::from(v.clone()),
            None => continue,
        };
        if !raw.is_truthy() {
            continue;
        }
        let items = out.get_mut(syntax);
        match raw {
            ItemValue::Sequence(list) => items.extend(list),
            single => items.push(single),
        }
    }

    out
}
