//! The parse pipeline: validate → configure → build map → flatten → build
//! result → cleanup.
//!
//! [`Parser`] is the facade driving every other piece of the crate. One
//! `parse` call is fully self-contained: the included-resource lookup
//! table and the circular-reference guard are checked out of the parser's
//! pools at the start of the call and returned on every exit path, so no
//! state leaks between calls. The pools make a single `Parser` cheap to
//! reuse across many documents, but they also make it `&mut`-exclusive:
//! for concurrent parsing use one `Parser` per caller (or the static
//! entry points, which construct a fresh instance per call).
//!
//! Error policy is selected by [`Mode`](crate::config::Mode) on the
//! config: strict propagates [`ParseError`], lenient degrades to returning
//! the original input unchanged.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};

use crate::{
    config::ParseConfig,
    error::ParseError,
    pool::{MapPool, Pool, SetPool},
    validate,
};

mod map;
mod resolve;

pub use resolve::META_KEY;

use resolve::Resolver;

/// Retained lookup-table instances across parse calls.
const MAP_POOL_SIZE: usize = 20;
/// Retained guard-set instances across parse calls.
const SET_POOL_SIZE: usize = 10;

/// JSON:API document normalizer.
///
/// ```
/// use jsonapi_flat::Parser;
/// use serde_json::json;
///
/// let document = json!({
///     "data": {
///         "type": "article", "id": "1",
///         "attributes": {"title": "T"},
///         "relationships": {"author": {"data": {"type": "user", "id": "101"}}}
///     },
///     "included": [
///         {"type": "user", "id": "101", "attributes": {"name": "Zhang"}}
///     ]
/// });
///
/// let result = Parser::parse_value(&document).unwrap();
/// assert_eq!(result["data"]["title"], "T");
/// assert_eq!(result["data"]["author"]["name"], "Zhang");
/// assert_eq!(result["jsonapi"]["parsed"], true);
/// ```
#[derive(Debug)]
pub struct Parser {
    config: ParseConfig,
    maps: MapPool,
    sets: SetPool,
}

impl Default for Parser {
    fn default() -> Self {
        Parser::new(ParseConfig::default())
    }
}

impl Parser {
    pub fn new(config: ParseConfig) -> Self {
        Parser {
            config,
            maps: Pool::new(MAP_POOL_SIZE),
            sets: Pool::new(SET_POOL_SIZE),
        }
    }

    pub fn config(&self) -> &ParseConfig {
        &self.config
    }

    /// Parse one document with this parser's configuration.
    ///
    /// Strict mode returns `Err` on configuration, validation, or flatten
    /// failures. Lenient mode never fails: any such condition returns the
    /// original input unchanged. Documents with nothing to parse (absent,
    /// null, or empty-array `data`, or an already-parsed document) pass
    /// through structurally unchanged in both modes.
    pub fn parse(&mut self, document: &Value) -> Result<Value, ParseError> {
        let config = self.config.clone();
        self.parse_with(document, &config)
    }

    fn parse_with(&mut self, document: &Value, config: &ParseConfig) -> Result<Value, ParseError> {
        match self.try_parse(document, config) {
            Ok(result) => Ok(result),
            Err(error) if config.is_strict() => {
                tracing::error!(%error, "document parse failed");
                Err(error)
            }
            Err(error) => {
                tracing::warn!(%error, "document parse failed, returning input unchanged");
                Ok(document.clone())
            }
        }
    }

    /// Parse with a fresh parser instance, for callers that do not want to
    /// manage parser lifetimes. No configuration or pooled state is shared
    /// with any other call.
    pub fn parse_document(document: &Value, config: ParseConfig) -> Result<Value, ParseError> {
        Parser::new(config).parse(document)
    }

    /// Parse with a fresh parser instance and default configuration.
    pub fn parse_value(document: &Value) -> Result<Value, ParseError> {
        Parser::default().parse(document)
    }

    fn try_parse(&mut self, document: &Value, config: &ParseConfig) -> Result<Value, ParseError> {
        config.validate()?;

        // Re-entry guard in both modes: a document this parser produced
        // must round-trip unchanged, not be flattened twice.
        if validate::already_parsed(document) {
            tracing::debug!("document already parsed, passing through");
            return Ok(document.clone());
        }
        if config.is_strict() {
            let validation = validate::validate_document(document);
            if !validation.is_valid() {
                return Err(ParseError::validation(validation.errors));
            }
        } else if !validate::base_check(document) {
            tracing::debug!("base check failed, passing through");
            return Ok(document.clone());
        }

        let Some(data) = parseable_data(document) else {
            return Ok(document.clone());
        };

        let included = document
            .get("included")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let mut collections = map::init_collections(config);

        let mut lookup = self.maps.acquire();
        let mut guard = self.sets.acquire();
        let outcome = run_parse(
            document,
            data,
            config,
            included,
            &mut lookup,
            &mut guard,
            &mut collections,
        );
        // Released on success and failure alike; the pools only ever see
        // reset instances.
        self.sets.release(guard);
        self.maps.release(lookup);
        outcome
    }
}

fn run_parse(
    document: &Value,
    data: &Value,
    config: &ParseConfig,
    included: &[Value],
    lookup: &mut HashMap<String, usize>,
    guard: &mut HashSet<String>,
    collections: &mut Option<Map<String, Value>>,
) -> Result<Value, ParseError> {
    map::build_lookup(included, config, lookup, collections)?;

    let mut resolver = Resolver {
        config,
        included,
        lookup: &*lookup,
        guard,
    };
    let parsed = match data {
        Value::Array(resources) => Value::Array(
            resources
                .iter()
                .map(|resource| resolver.flatten_root(resource))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        resource => resolver.flatten_root(resource)?,
    };

    Ok(build_result(document, parsed, collections.take()))
}

/// Assemble the top-level result. The `jsonapi.parsed` flag stamped here
/// is what [`validate::base_check`] later uses to refuse re-parsing.
fn build_result(document: &Value, data: Value, collections: Option<Map<String, Value>>) -> Value {
    let mut jsonapi = document
        .get("jsonapi")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    jsonapi.insert("parsed".to_string(), Value::Bool(true));

    let mut result = Map::new();
    result.insert("data".to_string(), data);
    result.insert("jsonapi".to_string(), Value::Object(jsonapi));
    result.insert(
        "meta".to_string(),
        document.get("meta").cloned().unwrap_or(Value::Null),
    );
    result.insert(
        "links".to_string(),
        document.get("links").cloned().unwrap_or(Value::Null),
    );
    if let Some(buckets) = collections {
        if !buckets.is_empty() {
            result.insert("collect".to_string(), Value::Object(buckets));
        }
    }
    Value::Object(result)
}

/// `data` worth flattening: present, non-null, and not an empty array.
/// Anything else passes the document through unchanged.
fn parseable_data(document: &Value) -> Option<&Value> {
    match document.get("data")? {
        Value::Null => None,
        Value::Array(resources) if resources.is_empty() => None,
        data => Some(data),
    }
}
