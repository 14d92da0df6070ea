//! The recursive core: relationship resolution against the included-resource
//! lookup table, and per-resource flattening.
//!
//! Depth accounting increments once per relationship hop. At
//! `call_level` the resolver stops expanding and copies raw relationship
//! `data` through verbatim, which bounds recursion on arbitrarily chained
//! or malformed graphs. Cycles are broken by a path-scoped guard set:
//! a key is held only while the matched resource is being resolved higher
//! on the current call stack, so the same resource may still appear fully
//! expanded in separate, non-overlapping branches of the graph.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};

use crate::{
    config::ParseConfig,
    error::ParseError,
    identity::{
        extract_identifier, is_empty_value, is_valid_relationship, merge_object_into, resource_key,
    },
};

/// Reserved output key holding a deep copy of the source resource's `meta`.
pub const META_KEY: &str = "_meta";

/// Per-parse resolution state. Borrows the pooled lookup table and guard
/// set from the parser facade; both are scoped to one parse call.
pub(crate) struct Resolver<'a> {
    pub config: &'a ParseConfig,
    /// The document's `included` array; lookup values index into it.
    pub included: &'a [Value],
    /// Canonical key → index into `included`. Empty when the document had
    /// no usable `included` side-table.
    pub lookup: &'a HashMap<String, usize>,
    /// Keys currently being resolved on the active recursion path.
    pub guard: &'a mut HashSet<String>,
}

impl Resolver<'_> {
    /// Flatten one primary-data resource, resolving its relationships when
    /// configured.
    ///
    /// Resolution runs even with an empty lookup table: every reference
    /// then misses and passes through as its bare identifier, which keeps
    /// relationship keys in the output when `included` is absent.
    pub fn flatten_root(&mut self, resource: &Value) -> Result<Value, ParseError> {
        let attributes = if self.config.parse_included {
            self.resolve_relationships(resource, 0)?
        } else {
            attributes_of(resource)
        };
        flatten(resource, attributes, None)
    }

    /// Return the resource's attribute map augmented with resolved
    /// relationship values.
    fn resolve_relationships(
        &mut self,
        resource: &Value,
        depth: usize,
    ) -> Result<Map<String, Value>, ParseError> {
        let mut attributes = attributes_of(resource);
        let Some(relationships) = resource.get("relationships").and_then(Value::as_object) else {
            return Ok(attributes);
        };

        if depth >= self.config.call_level {
            // Terminal case: raw identifiers pass through unresolved.
            for (key, relationship) in relationships {
                if let Some(data) = relationship.get("data") {
                    if !data.is_null() {
                        attributes.insert(key.clone(), data.clone());
                    }
                }
            }
            return Ok(attributes);
        }

        for (key, relationship) in relationships {
            if !is_valid_relationship(relationship) {
                continue;
            }
            match relationship.get("data") {
                Some(Value::Array(identifiers)) => {
                    let resolved = identifiers
                        .iter()
                        .map(|identifier| self.resolve_reference(identifier, depth + 1))
                        .collect::<Result<Vec<_>, _>>()?;
                    attributes.insert(key.clone(), Value::Array(resolved));
                }
                Some(identifier) if !identifier.is_null() => {
                    let resolved = self.resolve_reference(identifier, depth + 1)?;
                    attributes.insert(key.clone(), resolved);
                }
                // Null or absent data: keep the relationship's remaining
                // non-empty fields, links excluded. Omit the key entirely
                // when nothing remains.
                _ => {
                    if let Some(fields) = relationship.as_object() {
                        let mut kept = Map::new();
                        for (field, value) in fields {
                            if field != "links" && !is_empty_value(value) {
                                kept.insert(field.clone(), value.clone());
                            }
                        }
                        if !kept.is_empty() {
                            attributes.insert(key.clone(), Value::Object(kept));
                        }
                    }
                }
            }
        }

        Ok(attributes)
    }

    /// Resolve one resource identifier against the lookup table.
    ///
    /// A miss is not an error: the identifier is returned verbatim. A key
    /// already on the active resolution path is returned as the matched
    /// resource's bare identifier, breaking the cycle.
    fn resolve_reference(&mut self, identifier: &Value, depth: usize) -> Result<Value, ParseError> {
        let Some(key) = resource_key(identifier) else {
            return Ok(identifier.clone());
        };
        let Some(&index) = self.lookup.get(&key) else {
            return Ok(identifier.clone());
        };
        let matched = &self.included[index];

        if self.guard.contains(&key) {
            return Ok(extract_identifier(matched));
        }

        self.guard.insert(key.clone());
        let outcome = self.flatten_matched(matched, identifier, depth);
        // Symmetric exit on every path; only same-path recursion is
        // blocked, not repeats across sibling branches.
        self.guard.remove(&key);
        outcome
    }

    fn flatten_matched(
        &mut self,
        matched: &Value,
        identifier: &Value,
        depth: usize,
    ) -> Result<Value, ParseError> {
        let attributes = if self.config.flat_included_related {
            self.resolve_relationships(matched, depth)?
        } else {
            attributes_of(matched)
        };

        // The identifier's own meta wins over the matched resource's.
        let mut extra_meta = Map::new();
        merge_object_into(&mut extra_meta, matched.get("meta"));
        merge_object_into(&mut extra_meta, identifier.get("meta"));

        flatten(matched, attributes, Some(extra_meta))
    }
}

/// Build the flat output record for one resource.
///
/// Merge order is extra meta, then attributes, then the injected `id` and
/// `type` — identity always wins over same-named attribute or relationship
/// keys. Non-empty resource `meta` is copied under [`META_KEY`].
pub(crate) fn flatten(
    resource: &Value,
    attributes: Map<String, Value>,
    extra_meta: Option<Map<String, Value>>,
) -> Result<Value, ParseError> {
    let Some(object) = resource.as_object() else {
        return Err(ParseError::InvalidResource(
            "resource must be an object".to_string(),
        ));
    };
    if resource_key(resource).is_none() {
        return Err(ParseError::InvalidResource(format!(
            "type={:?} id={:?}",
            object.get("type"),
            object.get("id"),
        )));
    }

    let mut flattened = extra_meta.unwrap_or_default();
    for (key, value) in attributes {
        flattened.insert(key, value);
    }
    for field in ["id", "type"] {
        if let Some(value) = object.get(field) {
            flattened.insert(field.to_string(), value.clone());
        }
    }
    if let Some(meta) = object.get("meta") {
        if !is_empty_value(meta) {
            flattened.insert(META_KEY.to_string(), meta.clone());
        }
    }

    Ok(Value::Object(flattened))
}

/// Flatten a resource without any relationship resolution. Used for the
/// eager `collect_is_parse` path.
pub(crate) fn flatten_raw(resource: &Value) -> Result<Value, ParseError> {
    flatten(resource, attributes_of(resource), None)
}

fn attributes_of(resource: &Value) -> Map<String, Value> {
    match resource.get("attributes").and_then(Value::as_object) {
        Some(attributes) => attributes.clone(),
        None => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolver<'a>(
        config: &'a ParseConfig,
        included: &'a [Value],
        lookup: &'a HashMap<String, usize>,
        guard: &'a mut HashSet<String>,
    ) -> Resolver<'a> {
        Resolver {
            config,
            included,
            lookup,
            guard,
        }
    }

    fn index(included: &[Value]) -> HashMap<String, usize> {
        included
            .iter()
            .enumerate()
            .filter_map(|(i, r)| resource_key(r).map(|k| (k, i)))
            .collect()
    }

    #[test]
    fn test_flatten_identity_wins_over_attributes() {
        let resource = json!({
            "type": "user",
            "id": "1",
            "attributes": {"id": "shadow", "type": "shadow", "name": "Li"}
        });
        let flat = flatten_raw(&resource).unwrap();
        assert_eq!(flat["id"], "1");
        assert_eq!(flat["type"], "user");
        assert_eq!(flat["name"], "Li");
    }

    #[test]
    fn test_flatten_preserves_meta_under_reserved_key() {
        let resource = json!({
            "type": "user",
            "id": "1",
            "attributes": {"name": "Li"},
            "meta": {"ts": "2024-01-01"}
        });
        let flat = flatten_raw(&resource).unwrap();
        assert_eq!(flat[META_KEY], json!({"ts": "2024-01-01"}));
    }

    #[test]
    fn test_flatten_rejects_missing_identity() {
        let resource = json!({"attributes": {"name": "Li"}});
        assert!(matches!(
            flatten_raw(&resource),
            Err(ParseError::InvalidResource(_))
        ));
    }

    #[test]
    fn test_unresolved_reference_passes_through() {
        // The author key misses the lookup: the raw identifier must
        // appear verbatim.
        let config = ParseConfig::default();
        let included = vec![json!({"type": "tag", "id": "1", "attributes": {}})];
        let lookup = index(&included);
        let mut guard = HashSet::new();
        let mut r = resolver(&config, &included, &lookup, &mut guard);
        let article = json!({
            "type": "article",
            "id": "1",
            "attributes": {"title": "T"},
            "relationships": {"author": {"data": {"type": "user", "id": "101"}}}
        });
        let flat = r.flatten_root(&article).unwrap();
        assert_eq!(flat["author"], json!({"type": "user", "id": "101"}));
    }

    #[test]
    fn test_empty_lookup_keeps_relationship_keys() {
        // No usable `included` at all: every reference misses, and the
        // relationship keys must still appear as bare identifiers rather
        // than being dropped from the output.
        let config = ParseConfig::default();
        let included: Vec<Value> = vec![];
        let lookup = HashMap::new();
        let mut guard = HashSet::new();
        let mut r = resolver(&config, &included, &lookup, &mut guard);
        let article = json!({
            "type": "article",
            "id": "1",
            "attributes": {"title": "T"},
            "relationships": {
                "author": {"data": {"type": "user", "id": "101"}},
                "tags": {"data": [{"type": "tag", "id": "201"}]}
            }
        });
        let flat = r.flatten_root(&article).unwrap();
        assert_eq!(flat["author"], json!({"type": "user", "id": "101"}));
        assert_eq!(flat["tags"], json!([{"type": "tag", "id": "201"}]));
    }

    #[test]
    fn test_to_many_preserves_array_shape() {
        let included = vec![
            json!({"type": "tag", "id": "201", "attributes": {"name": "Vue.js"}}),
            json!({"type": "tag", "id": "202", "attributes": {"name": "TypeScript"}}),
        ];
        let lookup = index(&included);
        let config = ParseConfig::default();
        let mut guard = HashSet::new();
        let mut r = resolver(&config, &included, &lookup, &mut guard);
        let article = json!({
            "type": "article",
            "id": "1",
            "attributes": {},
            "relationships": {
                "tags": {"data": [
                    {"type": "tag", "id": "201"},
                    {"type": "tag", "id": "202"}
                ]},
                "drafts": {"data": []}
            }
        });
        let flat = r.flatten_root(&article).unwrap();
        let tags = flat["tags"].as_array().unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0]["name"], "Vue.js");
        assert_eq!(tags[1]["name"], "TypeScript");
        // Empty to-many stays an empty array.
        assert_eq!(flat["drafts"], json!([]));
    }

    #[test]
    fn test_null_data_relationship_keeps_nonempty_fields() {
        let config = ParseConfig::default();
        let included = vec![json!({"type": "tag", "id": "1", "attributes": {}})];
        let lookup = index(&included);
        let mut guard = HashSet::new();
        let mut r = resolver(&config, &included, &lookup, &mut guard);
        let article = json!({
            "type": "article",
            "id": "1",
            "attributes": {},
            "relationships": {
                "editor": {"data": null, "meta": {"pending": true}, "links": {"self": "x"}},
                "reviewer": {"data": null, "links": {"self": "y"}}
            }
        });
        let flat = r.flatten_root(&article).unwrap();
        // Null data and links are filtered; surviving meta is kept.
        assert_eq!(flat["editor"], json!({"meta": {"pending": true}}));
        // Nothing survives filtering: the key is omitted entirely.
        assert!(flat.get("reviewer").is_none());
    }

    #[test]
    fn test_depth_bound_copies_raw_identifiers() {
        // Chain a -> b -> c with call_level 1: b flattens inside a, but
        // b's own relationship to c stays a raw identifier.
        let included = vec![
            json!({
                "type": "category", "id": "b",
                "attributes": {"name": "B"},
                "relationships": {"parent": {"data": {"type": "category", "id": "c"}}}
            }),
            json!({"type": "category", "id": "c", "attributes": {"name": "C"}}),
        ];
        let lookup = index(&included);
        let config = ParseConfig {
            call_level: 1,
            ..ParseConfig::default()
        };
        let mut guard = HashSet::new();
        let mut r = resolver(&config, &included, &lookup, &mut guard);
        let root = json!({
            "type": "category", "id": "a",
            "attributes": {},
            "relationships": {"parent": {"data": {"type": "category", "id": "b"}}}
        });
        let flat = r.flatten_root(&root).unwrap();
        assert_eq!(flat["parent"]["name"], "B");
        assert_eq!(flat["parent"]["parent"], json!({"type": "category", "id": "c"}));
    }

    #[test]
    fn test_cycle_truncates_to_bare_identifier() {
        let included = vec![
            json!({
                "type": "parent", "id": "1",
                "attributes": {"name": "Parent"},
                "relationships": {"child": {"data": {"type": "child", "id": "2"}}}
            }),
            json!({
                "type": "child", "id": "2",
                "attributes": {"name": "Child"},
                "relationships": {"parent": {"data": {"type": "parent", "id": "1"}}}
            }),
        ];
        let lookup = index(&included);
        let config = ParseConfig::default();
        let mut guard = HashSet::new();
        let mut r = resolver(&config, &included, &lookup, &mut guard);
        let root = json!({
            "type": "article", "id": "9",
            "attributes": {},
            "relationships": {"topic": {"data": {"type": "parent", "id": "1"}}}
        });
        let flat = r.flatten_root(&root).unwrap();
        // parent expands, its child expands, and the child's back-reference
        // to parent truncates to the bare identifier.
        assert_eq!(flat["topic"]["name"], "Parent");
        assert_eq!(flat["topic"]["child"]["name"], "Child");
        assert_eq!(
            flat["topic"]["child"]["parent"],
            json!({"type": "parent", "id": "1"})
        );
        // Guard is fully unwound after the parse.
        assert!(r.guard.is_empty());
    }

    #[test]
    fn test_shared_resource_expands_in_sibling_branches() {
        // The same author hangs off two different relationships; both
        // branches must expand it fully since the paths do not overlap.
        let included = vec![json!({
            "type": "user", "id": "101", "attributes": {"name": "Zhang"}
        })];
        let lookup = index(&included);
        let config = ParseConfig::default();
        let mut guard = HashSet::new();
        let mut r = resolver(&config, &included, &lookup, &mut guard);
        let article = json!({
            "type": "article", "id": "1",
            "attributes": {},
            "relationships": {
                "author": {"data": {"type": "user", "id": "101"}},
                "editor": {"data": {"type": "user", "id": "101"}}
            }
        });
        let flat = r.flatten_root(&article).unwrap();
        assert_eq!(flat["author"]["name"], "Zhang");
        assert_eq!(flat["editor"]["name"], "Zhang");
    }

    #[test]
    fn test_identifier_meta_wins_over_resource_meta() {
        let included = vec![json!({
            "type": "user", "id": "101",
            "attributes": {"name": "Zhang"},
            "meta": {"role": "author", "shared": "resource"}
        })];
        let lookup = index(&included);
        let config = ParseConfig::default();
        let mut guard = HashSet::new();
        let mut r = resolver(&config, &included, &lookup, &mut guard);
        let article = json!({
            "type": "article", "id": "1",
            "attributes": {},
            "relationships": {"author": {
                "data": {"type": "user", "id": "101", "meta": {"role": "primary"}}
            }}
        });
        let flat = r.flatten_root(&article).unwrap();
        assert_eq!(flat["author"]["role"], "primary");
        assert_eq!(flat["author"]["shared"], "resource");
        // The matched resource's own meta is also preserved verbatim.
        assert_eq!(
            flat["author"][META_KEY],
            json!({"role": "author", "shared": "resource"})
        );
    }

    #[test]
    fn test_flat_included_related_false_keeps_nested_raw() {
        let included = vec![
            json!({
                "type": "user", "id": "101",
                "attributes": {"name": "Zhang"},
                "relationships": {"company": {"data": {"type": "company", "id": "7"}}}
            }),
            json!({"type": "company", "id": "7", "attributes": {"name": "Acme"}}),
        ];
        let lookup = index(&included);
        let config = ParseConfig {
            flat_included_related: false,
            ..ParseConfig::default()
        };
        let mut guard = HashSet::new();
        let mut r = resolver(&config, &included, &lookup, &mut guard);
        let article = json!({
            "type": "article", "id": "1",
            "attributes": {},
            "relationships": {"author": {"data": {"type": "user", "id": "101"}}}
        });
        let flat = r.flatten_root(&article).unwrap();
        assert_eq!(flat["author"]["name"], "Zhang");
        // The matched resource's own relationships are not resolved.
        assert!(flat["author"].get("company").is_none());
    }
}
