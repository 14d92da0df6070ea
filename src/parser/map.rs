//! Builds the per-parse lookup table over `included`, and the optional
//! collected-resources side-channel.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::{config::ParseConfig, error::ParseError, identity::resource_key, parser::resolve};

/// Initialize the collection buckets for the configured resource types.
///
/// Returns `None` when collection is not requested (or requested with an
/// empty type list, which collects nothing). Every requested type gets a
/// bucket up front, so types with zero matches still appear as empty
/// arrays in the result.
pub(crate) fn init_collections(config: &ParseConfig) -> Option<Map<String, Value>> {
    let types = config.collect.as_deref().filter(|types| !types.is_empty())?;
    let mut buckets = Map::new();
    for ty in types {
        buckets.insert(ty.clone(), Value::Array(Vec::new()));
    }
    Some(buckets)
}

/// Scan `included` into the canonical-key lookup table, filling collection
/// buckets along the way.
///
/// Invalid entries are skipped, not fatal: a malformed included resource
/// is a data-quality problem on the caller's side and must not take down
/// the whole parse. Duplicate keys resolve last-write-wins at this layer
/// for the same reason.
pub(crate) fn build_lookup(
    included: &[Value],
    config: &ParseConfig,
    lookup: &mut HashMap<String, usize>,
    collections: &mut Option<Map<String, Value>>,
) -> Result<(), ParseError> {
    for (index, resource) in included.iter().enumerate() {
        let Some(key) = resource_key(resource) else {
            tracing::debug!(index, "skipping included resource without a valid type/id pair");
            continue;
        };

        if let Some(buckets) = collections {
            collect_resource(resource, config, buckets)?;
        }

        lookup.insert(key, index);
    }
    Ok(())
}

fn collect_resource(
    resource: &Value,
    config: &ParseConfig,
    buckets: &mut Map<String, Value>,
) -> Result<(), ParseError> {
    let Some(ty) = resource.get("type").and_then(Value::as_str) else {
        return Ok(());
    };
    let Some(Value::Array(bucket)) = buckets.get_mut(ty) else {
        return Ok(());
    };
    let collected = if config.collect_is_parse {
        resolve::flatten_raw(resource)?
    } else {
        resource.clone()
    };
    bucket.push(collected);
    Ok(())
}
