//! Resource identity utilities: the canonical `type-id` key, the shallow
//! validity predicates used on the hot path, and small JSON object helpers
//! shared by the validator and the resolver.
//!
//! The composite `type` + `id` pair is a resource's identity within a
//! document; [`resource_key`] is the single place that renders it into the
//! lookup-table key so map inserts and circular-guard entries can never
//! disagree on format.

use serde_json::{Map, Value};

/// Render a resource or resource identifier into its canonical lookup key.
///
/// Returns `None` when the value fails the identity predicate: it must be
/// an object carrying a non-empty string `type` and a non-empty string or
/// number `id`. Number ids are coerced to their decimal string form, so
/// `{type: "user", id: 7}` and `{type: "user", id: "7"}` share a key.
pub fn resource_key(value: &Value) -> Option<String> {
    let object = value.as_object()?;
    let ty = object.get("type")?.as_str()?;
    if ty.is_empty() {
        return None;
    }
    let id = coerced_id(object.get("id")?)?;
    Some(format!("{ty}-{id}"))
}

/// Shallow identity check: non-empty string `type`, non-empty string or
/// number `id`. This is the hot-path predicate; full structural validation
/// lives in [`crate::validate`].
pub fn is_valid_resource(value: &Value) -> bool {
    resource_key(value).is_some()
}

/// Shallow relationship check: an object with at least one of `data`,
/// `links`, or `meta` present.
pub fn is_valid_relationship(value: &Value) -> bool {
    match value.as_object() {
        Some(object) => {
            object.contains_key("data")
                || object.contains_key("links")
                || object.contains_key("meta")
        }
        None => false,
    }
}

/// Reduce a resource to its bare identifier: `{type, id}`, plus `meta`
/// when the resource carries one. Used to truncate a revisited resource on
/// a cyclic resolution path without losing the fact that the relationship
/// existed.
pub fn extract_identifier(resource: &Value) -> Value {
    let mut identifier = Map::new();
    if let Some(object) = resource.as_object() {
        for field in ["type", "id", "meta"] {
            if let Some(value) = object.get(field) {
                identifier.insert(field.to_string(), value.clone());
            }
        }
    }
    Value::Object(identifier)
}

/// Emptiness in the relationship-field-filtering sense: null, empty
/// string, empty array, or empty object. Booleans and numbers are never
/// empty.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(object) => object.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Copy every entry of `source` (when it is a JSON object) into `target`.
/// Last write wins on key collisions.
pub fn merge_object_into(target: &mut Map<String, Value>, source: Option<&Value>) {
    if let Some(Value::Object(entries)) = source {
        for (key, value) in entries {
            target.insert(key.clone(), value.clone());
        }
    }
}

fn coerced_id(id: &Value) -> Option<String> {
    match id {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
