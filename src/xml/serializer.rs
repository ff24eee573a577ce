//! JSON to XML conversion.
//!
//! The output shape is fixed by the templates that consume it:
//! - object keys become elements named by the sanitized key;
//! - objects inside arrays become `<item>` elements;
//! - arrays inside arrays are spliced flat, their scalars named `item`;
//! - scalars inside arrays repeat the array's own name;
//! - anything that isn't an object at the top level is wrapped as `list-items`.
//!
//! Scalar text is written as-is. `<`, `>` and `&` are not escaped, so a value
//! containing markup yields a document that downstream parsing may reject.

use serde_json::{Map, Number, Value};

use super::sanitize::sanitize;

/// Prefix of every generated document, including the opening root element.
pub const DOCUMENT_PREFIX: &str = r#"<?xml version="1.0" encoding="UTF-8" ?><json>"#;

/// Closing root element.
pub const DOCUMENT_SUFFIX: &str = "</json>";

/// Name of the element objects inside arrays are wrapped in.
pub const ITEM_NAME: &str = "item";

/// Key a non-object top-level value is wrapped under.
pub const LIST_ITEMS_NAME: &str = "list-items";

/// Convert a JSON value into a complete XML document string.
pub fn to_document_string(json: &Value) -> String {
  let children = match json {
    Value::Object(obj) => serialize_object(obj),
    other => {
      let mut wrapper = Map::new();
      wrapper.insert(LIST_ITEMS_NAME.to_string(), other.clone());
      serialize_object(&wrapper)
    }
  };

  envelope(&children.concat())
}

/// Wrap already serialized content in the document envelope.
pub fn envelope(content: &str) -> String {
  let mut doc = String::with_capacity(DOCUMENT_PREFIX.len() + content.len() + DOCUMENT_SUFFIX.len());
  doc.push_str(DOCUMENT_PREFIX);
  doc.push_str(content);
  doc.push_str(DOCUMENT_SUFFIX);
  doc
}

/// Serialize every entry of an object, in key order, one element per key.
pub fn serialize_object(obj: &Map<String, Value>) -> Vec<String> {
  obj
    .iter()
    .map(|(key, value)| match value {
      Value::Object(inner) => element(key, &serialize_object(inner).concat()),
      Value::Array(items) => element(key, &serialize_array(key, items).concat()),
      scalar => element(key, &scalar_text(scalar)),
    })
    .collect()
}

/// Serialize the members of an array that lives under `name`.
///
/// Nested arrays don't get a wrapping element of their own; their members are
/// spliced into the returned list directly.
pub fn serialize_array(name: &str, items: &[Value]) -> Vec<String> {
  let mut list = Vec::with_capacity(items.len());

  for value in items {
    match value {
      Value::Object(inner) => list.push(element(ITEM_NAME, &serialize_object(inner).concat())),
      Value::Array(nested) => list.extend(serialize_array(ITEM_NAME, nested)),
      scalar => list.push(element(name, &scalar_text(scalar))),
    }
  }

  list
}

/// Render `<name>content</name>` with the name sanitized.
fn element(name: &str, content: &str) -> String {
  let name = sanitize(name);
  format!("<{name}>{content}</{name}>")
}

/// String form of a scalar: strings verbatim, everything else in JSON text form.
fn scalar_text(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    Value::Null => "null".to_string(),
    Value::Bool(b) => b.to_string(),
    Value::Number(n) => number_text(n),
    // Containers are handled by the callers
    Value::Array(_) | Value::Object(_) => value.to_string(),
  }
}

/// Number text as templates expect it: integral floats print without a
/// fraction below 1e21, and `-0` prints as `0`.
fn number_text(n: &Number) -> String {
  if n.is_i64() || n.is_u64() {
    return n.to_string();
  }

  match n.as_f64() {
    Some(f) if f == 0.0 => "0".to_string(),
    Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
    _ => n.to_string(),
  }
}
