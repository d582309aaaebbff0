//! RDFa extraction
//!
//! Covers the RDFa 1.1 Lite attributes (vocab, prefix, typeof, property,
//! resource) plus about/href/src/content/datetime/datatype/lang from RDFa
//! Core. rel/rev chaining is not interpreted.
//!
//! Output is one expanded JSON-LD node per subject:
//! `{"@id": ..., "@type": [...], "<property IRI>": [{"@value": ...} | {"@id": ...}]}`

use std::collections::HashMap;
use std::rc::Rc;

use scraper::{ElementRef, Html};
use serde_json::{Map, Value};
use url::Url;

/// Prefixes available without declaration (subset of the RDFa initial context)
const INITIAL_PREFIXES: &[(&str, &str)] = &[
    ("cc", "http://creativecommons.org/ns#"),
    ("ctag", "http://commontag.org/ns#"),
    ("dc", "http://purl.org/dc/terms/"),
    ("dcterms", "http://purl.org/dc/terms/"),
    ("dc11", "http://purl.org/dc/elements/1.1/"),
    ("foaf", "http://xmlns.com/foaf/0.1/"),
    ("gr", "http://purl.org/goodrelations/v1#"),
    ("og", "http://ogp.me/ns#"),
    ("owl", "http://www.w3.org/2002/07/owl#"),
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("schema", "http://schema.org/"),
    ("sioc", "http://rdfs.org/sioc/ns#"),
    ("skos", "http://www.w3.org/2004/02/skos/core#"),
    ("v", "http://rdf.data-vocabulary.org/#"),
    ("vcard", "http://www.w3.org/2006/vcard/ns#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
];

/// Evaluation context inherited from parent to child elements
///
/// The prefix map is shared with the parent until an element declares its own.
#[derive(Debug, Clone)]
struct EvalContext<'a> {
    base: &'a Url,
    subject: String,
    vocab: Option<String>,
    prefixes: Rc<HashMap<String, String>>,
    lang: Option<String>,
}

#[derive(Debug)]
enum Object {
    Resource(String),
    Literal {
        value: String,
        lang: Option<String>,
        datatype: Option<String>,
    },
}

impl Object {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        match self {
            Object::Resource(iri) => {
                map.insert("@id".to_string(), Value::String(iri.clone()));
            }
            Object::Literal { value, lang, datatype } => {
                map.insert("@value".to_string(), Value::String(value.clone()));
                if let Some(dt) = datatype {
                    map.insert("@type".to_string(), Value::String(dt.clone()));
                } else if let Some(l) = lang {
                    map.insert("@language".to_string(), Value::String(l.clone()));
                }
            }
        }
        Value::Object(map)
    }
}

#[derive(Debug, Default)]
struct Node {
    types: Vec<String>,
    properties: Vec<(String, Vec<Object>)>,
}

/// Triples grouped by subject in first-seen order
#[derive(Debug, Default)]
struct Graph {
    order: Vec<String>,
    nodes: HashMap<String, Node>,
    next_blank: usize,
}

impl Graph {
    fn blank_node(&mut self) -> String {
        let id = format!("_:b{}", self.next_blank);
        self.next_blank += 1;
        id
    }

    fn node(&mut self, subject: &str) -> &mut Node {
        if !self.nodes.contains_key(subject) {
            self.order.push(subject.to_string());
        }
        self.nodes.entry(subject.to_string()).or_default()
    }

    fn add_type(&mut self, subject: &str, type_iri: String) {
        let node = self.node(subject);
        if !node.types.contains(&type_iri) {
            node.types.push(type_iri);
        }
    }

    fn add_property(&mut self, subject: &str, predicate: String, object: Object) {
        let node = self.node(subject);
        match node.properties.iter_mut().find(|(p, _)| *p == predicate) {
            Some((_, objects)) => objects.push(object),
            None => node.properties.push((predicate, vec![object])),
        }
    }

    fn into_items(mut self) -> Vec<Value> {
        let mut items = Vec::with_capacity(self.order.len());
        for subject in &self.order {
            let Some(node) = self.nodes.remove(subject) else {
                continue;
            };
            let mut item = Map::new();
            item.insert("@id".to_string(), Value::String(subject.clone()));
            if !node.types.is_empty() {
                item.insert(
                    "@type".to_string(),
                    Value::Array(node.types.into_iter().map(Value::String).collect()),
                );
            }
            for (predicate, objects) in node.properties {
                item.insert(predicate, Value::Array(objects.iter().map(Object::to_json).collect()));
            }
            items.push(Value::Object(item));
        }
        items
    }
}

/// Extract RDFa statements as expanded JSON-LD nodes.
///
/// The document itself is the initial subject, so page-level properties
/// such as `og:title` attach to `base_url`.
pub fn extract_rdfa(document: &Html, base_url: &Url) -> Vec<Value> {
    let context = Rc::new(EvalContext {
        base: base_url,
        subject: base_url.to_string(),
        vocab: None,
        prefixes: Rc::new(
            INITIAL_PREFIXES
                .iter()
                .map(|(p, iri)| (p.to_string(), iri.to_string()))
                .collect(),
        ),
        lang: None,
    });

    let mut graph = Graph::default();

    // Depth-first in document order without recursing per DOM level
    let mut pending = vec![(document.root_element(), context)];
    while let Some((element, parent)) = pending.pop() {
        let ctx = Rc::new(process_element(&element, &parent, &mut graph));
        let children: Vec<ElementRef> = element.children().filter_map(ElementRef::wrap).collect();
        for child in children.into_iter().rev() {
            pending.push((child, Rc::clone(&ctx)));
        }
    }

    graph.into_items()
}

/// Record the statements made by one element and return the context its
/// children inherit
fn process_element<'a>(
    element: &ElementRef,
    parent: &EvalContext<'a>,
    graph: &mut Graph,
) -> EvalContext<'a> {
    let el = element.value();
    let mut ctx = parent.clone();

    if let Some(vocab) = el.attr("vocab") {
        let vocab = vocab.trim();
        ctx.vocab = if vocab.is_empty() {
            None
        } else {
            Some(resolve_iri(vocab, ctx.base))
        };
    }
    for (name, value) in el.attrs() {
        if let Some(prefix) = name.strip_prefix("xmlns:") {
            Rc::make_mut(&mut ctx.prefixes)
                .insert(prefix.to_ascii_lowercase(), value.trim().to_string());
        }
    }
    if let Some(declared) = el.attr("prefix") {
        let prefixes = Rc::make_mut(&mut ctx.prefixes);
        for (prefix, iri) in parse_prefix_attr(declared) {
            prefixes.insert(prefix, iri);
        }
    }
    if let Some(lang) = el.attr("lang").or_else(|| el.attr("xml:lang")) {
        let lang = lang.trim();
        ctx.lang = (!lang.is_empty()).then(|| lang.to_string());
    }

    let about = el.attr("about").map(|v| resolve_resource(v, &ctx));
    let resource = el
        .attr("resource")
        .or_else(|| el.attr("href"))
        .or_else(|| el.attr("src"))
        .map(|v| resolve_resource(v, &ctx));
    let types: Vec<String> = el
        .attr("typeof")
        .map(|t| t.split_whitespace().filter_map(|term| expand_term(term, &ctx)).collect())
        .unwrap_or_default();
    let has_typeof = el.attr("typeof").is_some();
    let predicates: Vec<String> = el
        .attr("property")
        .map(|p| p.split_whitespace().filter_map(|term| expand_term(term, &ctx)).collect())
        .unwrap_or_default();
    let has_property = el.attr("property").is_some();

    let mut child_subject = None;

    if has_property {
        let subject = about.clone().unwrap_or_else(|| ctx.subject.clone());

        // typeof without about types a new resource that becomes the value
        let typed = match (&about, has_typeof) {
            (None, true) => Some(resource.clone().unwrap_or_else(|| graph.blank_node())),
            (Some(_), true) => Some(subject.clone()),
            _ => None,
        };
        if let Some(typed) = &typed {
            for t in &types {
                graph.add_type(typed, t.clone());
            }
        }

        let value_resource = if about.is_none() { typed.as_ref() } else { None };
        for predicate in predicates {
            let object = property_object(element, &ctx, value_resource, resource.as_ref());
            graph.add_property(&subject, predicate, object);
        }

        child_subject = match (&about, &typed) {
            (None, Some(t)) => Some(t.clone()),
            (Some(a), _) => Some(a.clone()),
            _ => None,
        };
    } else {
        let subject = about
            .clone()
            .or_else(|| resource.clone())
            .or_else(|| has_typeof.then(|| graph.blank_node()));
        if let Some(subject) = &subject {
            if has_typeof {
                for t in &types {
                    graph.add_type(subject, t.clone());
                }
            }
        }
        // A bare href/src without RDFa attributes does not start a new subject
        if about.is_some() || has_typeof || el.attr("resource").is_some() {
            child_subject = subject;
        }
    }

    if let Some(subject) = child_subject {
        ctx.subject = subject;
    }

    ctx
}

fn property_object(
    element: &ElementRef,
    ctx: &EvalContext,
    typed_resource: Option<&String>,
    resource: Option<&String>,
) -> Object {
    let el = element.value();
    let datatype = el
        .attr("datatype")
        .map(str::trim)
        .filter(|dt| !dt.is_empty())
        .and_then(|dt| expand_term(dt, ctx));

    if let Some(typed) = typed_resource {
        return Object::Resource(typed.clone());
    }
    if let Some(content) = el.attr("content") {
        return Object::Literal {
            value: content.to_string(),
            lang: ctx.lang.clone(),
            datatype,
        };
    }
    if el.name() == "time" {
        if let Some(datetime) = el.attr("datetime") {
            return Object::Literal {
                value: datetime.to_string(),
                lang: None,
                datatype,
            };
        }
    }
    if let (Some(iri), None) = (resource, &datatype) {
        return Object::Resource(iri.clone());
    }

    Object::Literal {
        value: element.text().collect::<String>(),
        lang: ctx.lang.clone(),
        datatype,
    }
}

/// Parse `prefix="og: http://ogp.me/ns# fb: http://ogp.me/ns/fb#"`
fn parse_prefix_attr(value: &str) -> Vec<(String, String)> {
    let tokens: Vec<&str> = value.split_whitespace().collect();
    tokens
        .chunks(2)
        .filter_map(|pair| match pair {
            [prefix, iri] => prefix
                .strip_suffix(':')
                .filter(|p| !p.is_empty())
                .map(|p| (p.to_ascii_lowercase(), iri.to_string())),
            _ => None,
        })
        .collect()
}

/// Expand a term or CURIE from typeof/property/datatype to a full IRI
fn expand_term(term: &str, ctx: &EvalContext) -> Option<String> {
    if let Some((prefix, reference)) = term.split_once(':') {
        if let Some(ns) = ctx.prefixes.get(&prefix.to_ascii_lowercase()) {
            return Some(format!("{}{}", ns, reference));
        }
        return Url::parse(term).ok().map(|_| term.to_string());
    }
    ctx.vocab.as_ref().map(|vocab| format!("{}{}", vocab, term))
}

/// Resolve about/resource/href/src values to an IRI or blank node id
fn resolve_resource(value: &str, ctx: &EvalContext) -> String {
    let value = value.trim();
    if let Some(curie) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
        if curie.starts_with("_:") {
            return curie.to_string();
        }
        return expand_term(curie, ctx).unwrap_or_else(|| resolve_iri(curie, ctx.base));
    }
    if value.starts_with("_:") {
        return value.to_string();
    }
    resolve_iri(value, ctx.base)
}

fn resolve_iri(value: &str, base: &Url) -> String {
    base.join(value)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| value.to_string())
}
