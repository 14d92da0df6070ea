//! Structural validation against the JSON:API document grammar.
//!
//! Two tiers, matching the strict/lenient split in
//! [`Mode`](crate::config::Mode):
//!
//! - [`validate_document`] runs the full grammar: top-level invariants,
//!   every resource in `data` and `included`, every relationship and
//!   resource identifier, every error object. Violations accumulate into a
//!   flat, path-prefixed message list — the caller gets the complete
//!   diagnostic set, never just the first failure.
//! - [`base_check`] is the cheap production gate: object-ness, at least one
//!   top-level member, and the `jsonapi.parsed` re-entry guard.
//!
//! The per-resource predicates used during flattening live in
//! [`crate::identity`]; they are intentionally shallower than the rules
//! here so the hot path never re-runs full validation.

use serde_json::Value;

/// Outcome of full document validation. An empty error list means the
/// document conforms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    pub errors: Vec<String>,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Cheap structural gate used in lenient mode and as the strict-mode
/// re-entry guard.
///
/// Returns false when the value is not a JSON object, when `data`,
/// `errors`, and `meta` are all absent, or when `jsonapi.parsed` is `true`
/// (a document this parser already produced; re-parsing it would corrupt
/// the flattened shape). Intentionally permissive otherwise.
pub fn base_check(document: &Value) -> bool {
    let Some(object) = document.as_object() else {
        return false;
    };
    if !object.contains_key("data") && !object.contains_key("errors") && !object.contains_key("meta")
    {
        return false;
    }
    !already_parsed(document)
}

/// True when the document carries the `jsonapi.parsed` flag stamped onto
/// every successful parse result.
pub fn already_parsed(document: &Value) -> bool {
    document
        .get("jsonapi")
        .and_then(|jsonapi| jsonapi.get("parsed"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Validate a complete document against the JSON:API grammar, accumulating
/// every violation.
pub fn validate_document(document: &Value) -> Validation {
    let mut errors = Vec::new();

    let Some(object) = document.as_object() else {
        return Validation {
            errors: vec!["Document must be an object".to_string()],
        };
    };

    let data = object.get("data");
    let doc_errors = object.get("errors");
    let meta = object.get("meta");

    if data.is_none() && doc_errors.is_none() && meta.is_none() {
        errors.push("Document must contain at least one of: data, errors, or meta".to_string());
    }
    if data.is_some() && doc_errors.is_some() {
        errors.push("Document cannot contain both data and errors".to_string());
    }

    if let Some(jsonapi) = object.get("jsonapi") {
        match jsonapi.as_object() {
            None => errors.push("jsonapi member must be an object".to_string()),
            Some(jsonapi) => {
                if let Some(version) = jsonapi.get("version") {
                    if !version.is_string() {
                        errors.push("jsonapi.version must be a string".to_string());
                    }
                }
                if let Some(jsonapi_meta) = jsonapi.get("meta") {
                    if !jsonapi_meta.is_object() {
                        errors.push("jsonapi.meta must be an object".to_string());
                    }
                }
            }
        }
    }

    if let Some(links) = object.get("links") {
        if !links.is_object() {
            errors.push("links must be an object".to_string());
        }
    }
    if let Some(meta) = meta {
        if !meta.is_object() {
            errors.push("meta must be an object".to_string());
        }
    }

    match data {
        Some(Value::Array(resources)) => {
            for (index, resource) in resources.iter().enumerate() {
                push_prefixed(&mut errors, &format!("data[{index}]"), validate_resource(resource));
            }
        }
        Some(Value::Null) | None => {}
        Some(resource) => {
            push_prefixed(&mut errors, "data", validate_resource(resource));
        }
    }

    if let Some(included) = object.get("included") {
        match included.as_array() {
            None => errors.push("included must be an array".to_string()),
            Some(resources) => {
                for (index, resource) in resources.iter().enumerate() {
                    push_prefixed(
                        &mut errors,
                        &format!("included[{index}]"),
                        validate_resource(resource),
                    );
                }
            }
        }
    }

    if let Some(doc_errors) = doc_errors {
        match doc_errors.as_array() {
            None => errors.push("errors must be an array".to_string()),
            Some(error_objects) => {
                for (index, error_object) in error_objects.iter().enumerate() {
                    push_prefixed(
                        &mut errors,
                        &format!("errors[{index}]"),
                        validate_error_object(error_object),
                    );
                }
            }
        }
    }

    Validation { errors }
}

/// Validate one resource object, returning its violations unprefixed.
pub fn validate_resource(resource: &Value) -> Vec<String> {
    let Some(object) = resource.as_object() else {
        return vec!["Resource must be an object".to_string()];
    };
    let mut errors = Vec::new();

    if !is_nonempty_string(object.get("type")) {
        errors.push("Resource must have a non-empty string type".to_string());
    }
    if !is_nonempty_string(object.get("id")) {
        errors.push("Resource must have a non-empty string id".to_string());
    }

    for field in ["attributes", "links", "meta"] {
        if let Some(value) = object.get(field) {
            if !value.is_object() {
                errors.push(format!("{field} must be an object"));
            }
        }
    }

    if let Some(relationships) = object.get("relationships") {
        match relationships.as_object() {
            None => errors.push("relationships must be an object".to_string()),
            Some(relationships) => {
                for (key, relationship) in relationships {
                    push_prefixed(
                        &mut errors,
                        &format!("relationships.{key}"),
                        validate_relationship(relationship),
                    );
                }
            }
        }
    }

    errors
}

/// Validate one relationship object, returning its violations unprefixed.
pub fn validate_relationship(relationship: &Value) -> Vec<String> {
    let Some(object) = relationship.as_object() else {
        return vec!["Relationship must be an object".to_string()];
    };
    let mut errors = Vec::new();

    if !object.contains_key("data") && !object.contains_key("links") && !object.contains_key("meta")
    {
        errors.push("Relationship must contain at least one of: data, links, or meta".to_string());
    }

    match object.get("data") {
        // Null is a valid empty to-one relationship.
        Some(Value::Null) | None => {}
        Some(Value::Array(identifiers)) => {
            for (index, identifier) in identifiers.iter().enumerate() {
                push_prefixed(
                    &mut errors,
                    &format!("data[{index}]"),
                    validate_resource_identifier(identifier),
                );
            }
        }
        Some(identifier) => {
            push_prefixed(&mut errors, "data", validate_resource_identifier(identifier));
        }
    }

    for field in ["links", "meta"] {
        if let Some(value) = object.get(field) {
            if !value.is_object() {
                errors.push(format!("{field} must be an object"));
            }
        }
    }

    errors
}

/// Validate one resource identifier, returning its violations unprefixed.
pub fn validate_resource_identifier(identifier: &Value) -> Vec<String> {
    let Some(object) = identifier.as_object() else {
        return vec!["Resource identifier must be an object".to_string()];
    };
    let mut errors = Vec::new();

    if !is_nonempty_string(object.get("type")) {
        errors.push("Resource identifier must have a non-empty string type".to_string());
    }
    if !is_nonempty_string(object.get("id")) {
        errors.push("Resource identifier must have a non-empty string id".to_string());
    }
    if let Some(meta) = object.get("meta") {
        if !meta.is_object() {
            errors.push("meta must be an object".to_string());
        }
    }

    errors
}

/// Validate one error object's field types, returning violations
/// unprefixed.
pub fn validate_error_object(error_object: &Value) -> Vec<String> {
    let Some(object) = error_object.as_object() else {
        return vec!["Error must be an object".to_string()];
    };
    let mut errors = Vec::new();

    for field in ["id", "status", "code", "title", "detail"] {
        if let Some(value) = object.get(field) {
            if !value.is_string() {
                errors.push(format!("error.{field} must be a string"));
            }
        }
    }
    for field in ["links", "source", "meta"] {
        if let Some(value) = object.get(field) {
            if !value.is_object() {
                errors.push(format!("error.{field} must be an object"));
            }
        }
    }

    errors
}

fn is_nonempty_string(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::String(s)) if !s.trim().is_empty())
}

fn push_prefixed(errors: &mut Vec<String>, prefix: &str, violations: Vec<String>) {
    for violation in violations {
        errors.push(format!("{prefix}: {violation}"));
    }
}
