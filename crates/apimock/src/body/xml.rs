//! XML bodies converted into nested mappings.
//!
//! Request bodies are often bare sequences of sibling elements with no single
//! document root, so the raw text is wrapped in a synthetic root element
//! before parsing. Conversion rules:
//!
//! - a leaf element becomes its trimmed text (`<a>1</a>` -> `"1"`);
//! - an empty element becomes `""`;
//! - repeated sibling tags become a sequence;
//! - attributes become keys of the element's mapping, and non-blank text of
//!   such an element is kept under `content`.

use super::BodyError;
use serde_json::{Map, Value};
use sxd_document::dom::{ChildOfElement, ChildOfRoot, Element};
use sxd_document::parser;

const FRAGMENT_ROOT: &str = "apimock-fragment";
const MAX_DEPTH: usize = 128;

/// Parse an XML body into a mapping.
pub(super) fn parse_xml(raw: &str) -> Result<Value, BodyError> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    let wrapped = format!("<{FRAGMENT_ROOT}>{}</{FRAGMENT_ROOT}>", strip_declaration(raw));
    let package = parser::parse(&wrapped).map_err(|_| BodyError::InvalidXml)?;
    let document = package.as_document();

    let root = document
        .root()
        .children()
        .into_iter()
        .find_map(|child| match child {
            ChildOfRoot::Element(element) => Some(element),
            _ => None,
        })
        .ok_or(BodyError::InvalidXml)?;

    // The raw text was non-blank, so an empty mapping means the parser found
    // nothing it could turn into elements (plain text, comments only).
    match element_value(root, 0)? {
        Value::Object(map) if !map.is_empty() => Ok(Value::Object(map)),
        _ => Err(BodyError::InvalidXml),
    }
}

fn strip_declaration(raw: &str) -> &str {
    let trimmed = raw.trim_start();
    if trimmed.starts_with("<?xml") {
        if let Some(end) = trimmed.find("?>") {
            return &trimmed[end + 2..];
        }
    }
    raw
}

fn element_value(element: Element<'_>, depth: usize) -> Result<Value, BodyError> {
    if depth > MAX_DEPTH {
        return Err(BodyError::InvalidXml);
    }

    let mut map = Map::new();
    for attribute in element.attributes() {
        insert_child(
            &mut map,
            attribute.name().local_part().to_string(),
            Value::String(attribute.value().to_string()),
        );
    }

    let mut text = String::new();
    for child in element.children() {
        match child {
            ChildOfElement::Element(child) => {
                let name = child.name().local_part().to_string();
                let value = element_value(child, depth + 1)?;
                insert_child(&mut map, name, value);
            }
            ChildOfElement::Text(t) => text.push_str(t.text()),
            _ => {}
        }
    }

    let text = text.trim();
    if map.is_empty() {
        return Ok(Value::String(text.to_string()));
    }
    if !text.is_empty() {
        insert_child(&mut map, "content".to_string(), Value::String(text.to_string()));
    }
    Ok(Value::Object(map))
}

/// Insert a child value, turning repeated keys into a sequence.
fn insert_child(map: &mut Map<String, Value>, key: String, value: Value) {
    match map.get_mut(&key) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            map.insert(key, value);
        }
    }
}
