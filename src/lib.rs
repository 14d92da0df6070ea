//! # jsonapi-flat
//!
//! A Rust library for normalizing [JSON:API](https://jsonapi.org/) documents into flat,
//! denormalized records with relationships resolved inline.
//!
//! ## Overview
//!
//! A JSON:API response separates a primary `data` section from an `included` side-table
//! of related resources, linked through lightweight `{type, id}` resource identifiers.
//! That shape is convenient on the wire and awkward everywhere else. jsonapi-flat takes
//! the already-deserialized document (a [`serde_json::Value`]) and produces one nested
//! record per primary resource: every attribute hoisted to the top level, every
//! relationship replaced by the flattened related resource it points at, recursively,
//! up to a configurable depth.
//!
//! ### Key Features
//!
//! - **Recursive resolution**: relationships of included resources resolve through the
//!   same lookup table, bounded by a configurable depth limit
//! - **Cycle detection**: a path-scoped guard truncates circular references to bare
//!   `{type, id}` identifiers instead of recursing forever
//! - **Structural validation**: full JSON:API grammar checks with exhaustive,
//!   path-prefixed diagnostics, plus a cheap production-mode base check
//! - **Strict/lenient error policy**: an explicit config switch selects between
//!   propagating errors and degrading to the unmodified input
//! - **Collection side-channel**: resources of caller-named types are gathered out of
//!   `included` alongside the main result
//! - **Buffer pooling**: per-parse lookup tables and guard sets are recycled across
//!   calls on the same parser instance
//!
//! ## Quick Start
//!
//! ```rust
//! use jsonapi_flat::{ParseConfig, Parser};
//! use serde_json::json;
//!
//! let document = json!({
//!     "data": {
//!         "type": "article", "id": "1",
//!         "attributes": {"title": "T"},
//!         "relationships": {
//!             "author": {"data": {"type": "user", "id": "101"}}
//!         }
//!     },
//!     "included": [
//!         {"type": "user", "id": "101", "attributes": {"name": "Zhang"}}
//!     ]
//! });
//!
//! // One-shot parse with defaults:
//! let result = Parser::parse_value(&document)?;
//! assert_eq!(result["data"]["author"]["name"], "Zhang");
//!
//! // Reusable parser with explicit configuration:
//! let mut parser = Parser::new(ParseConfig {
//!     collect: Some(vec!["user".to_string()]),
//!     ..ParseConfig::default()
//! });
//! let result = parser.parse(&document)?;
//! assert_eq!(result["collect"]["user"].as_array().unwrap().len(), 1);
//! # Ok::<(), jsonapi_flat::ParseError>(())
//! ```
//!
//! ## Error Policy
//!
//! The original consumer of this algorithm switched behavior on an ambient
//! environment flag. Here the switch is an explicit [`config::Mode`] on
//! [`ParseConfig`]:
//!
//! - [`Mode::Strict`](config::Mode::Strict) (default): full validation; configuration,
//!   validation, and flatten failures return [`ParseError`]
//! - [`Mode::Lenient`](config::Mode::Lenient): cheap validation; any failure returns
//!   the original input unchanged, so callers always hold a usable value
//!
//! Two conditions are policies rather than errors in both modes: a cycle truncates to
//! a bare identifier, and the depth limit copies raw identifiers through verbatim.
//!
//! ## Module Guide
//!
//! Start with [`parser::Parser`]. See [`validate`] for the document grammar,
//! [`config`] for the knobs, and [`identity`] for the `type-id` key scheme that
//! threads through the lookup table and cycle guard.

pub mod config;
pub mod error;
pub mod identity;
pub mod parser;
pub mod pool;
pub mod validate;

pub use config::{Mode, ParseConfig};
pub use error::*;
pub use parser::{Parser, META_KEY};
