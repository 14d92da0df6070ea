//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use serde_json::{json, Value};

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times — subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// A representative blog response: one article with a to-one author and a
/// to-many tag list, all present in `included`.
#[allow(dead_code)]
pub fn article_document() -> Value {
    json!({
        "data": {
            "type": "article",
            "id": "1",
            "attributes": {
                "title": "JSON:API normalizer",
                "content": "Example article body...",
                "publishedAt": "2024-01-01T00:00:00.000Z"
            },
            "relationships": {
                "author": {"data": {"type": "user", "id": "101"}},
                "tags": {"data": [
                    {"type": "tag", "id": "201"},
                    {"type": "tag", "id": "202"}
                ]}
            }
        },
        "included": [
            {"type": "user", "id": "101",
             "attributes": {"name": "Zhang", "email": "zhang@example.com"}},
            {"type": "tag", "id": "201",
             "attributes": {"name": "Vue.js", "color": "#4FC08D"}},
            {"type": "tag", "id": "202",
             "attributes": {"name": "TypeScript", "color": "#007ACC"}}
        ]
    })
}

/// A document whose primary resource heads a linked chain of `length`
/// resources: node0 -> node1 -> ... -> node(length-1), each hop through a
/// `next` relationship, all but the head side-loaded in `included`.
#[allow(dead_code)]
pub fn chain_document(length: usize) -> Value {
    let node = |i: usize| {
        let mut resource = json!({
            "type": "node",
            "id": i.to_string(),
            "attributes": {"ordinal": i}
        });
        if i + 1 < length {
            resource["relationships"] = json!({
                "next": {"data": {"type": "node", "id": (i + 1).to_string()}}
            });
        }
        resource
    };
    let included: Vec<Value> = (1..length).map(node).collect();
    json!({"data": node(0), "included": included})
}

/// A document with a two-resource reference cycle, both sides included.
#[allow(dead_code)]
pub fn cyclic_document() -> Value {
    json!({
        "data": {
            "type": "parent", "id": "1",
            "attributes": {"name": "Parent"},
            "relationships": {"child": {"data": {"type": "child", "id": "2"}}}
        },
        "included": [
            {
                "type": "parent", "id": "1",
                "attributes": {"name": "Parent"},
                "relationships": {"child": {"data": {"type": "child", "id": "2"}}}
            },
            {
                "type": "child", "id": "2",
                "attributes": {"name": "Child"},
                "relationships": {"parent": {"data": {"type": "parent", "id": "1"}}}
            }
        ]
    })
}
