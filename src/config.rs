//! Parse configuration and the strict/lenient error-policy switch.

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Default relationship-chain depth the resolver will expand.
pub const DEFAULT_CALL_LEVEL: usize = 5;

/// Depth above which configuration validation emits a performance warning.
pub const CALL_LEVEL_WARN: usize = 10;

/// Error-propagation policy for a [`Parser`](crate::parser::Parser).
///
/// The original data layer derived this from the ambient runtime
/// environment; here it is an explicit, injected setting so the parser
/// stays deterministic under test.
///
/// - `Strict`: validation failures and mid-parse errors propagate as
///   [`ParseError`]. Full structural validation runs on every document.
/// - `Lenient`: only the cheap base check runs, and any failure returns the
///   original input unchanged. The caller always receives a usable value.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Strict,
    Lenient,
}

/// Configuration for one parse call.
///
/// `ParseConfig::default()` is the common case; every knob has a sensible
/// default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseConfig {
    /// Resolve relationships against the `included` side-table.
    pub parse_included: bool,
    /// Recursively flatten the relationships of matched included resources.
    pub flat_included_related: bool,
    /// Resource types to collect from `included` into the result's
    /// `collect` side-channel.
    pub collect: Option<Vec<String>>,
    /// Flatten collected resources (without relationship resolution)
    /// instead of collecting them raw.
    pub collect_is_parse: bool,
    /// Maximum relationship-chain depth to expand. Beyond this, raw
    /// resource identifiers are copied through verbatim.
    pub call_level: usize,
    /// Error-propagation policy, see [`Mode`].
    pub mode: Mode,
}

impl Default for ParseConfig {
    fn default() -> Self {
        ParseConfig {
            parse_included: true,
            flat_included_related: true,
            collect: None,
            collect_is_parse: false,
            call_level: DEFAULT_CALL_LEVEL,
            mode: Mode::default(),
        }
    }
}

impl ParseConfig {
    /// Convenience constructor for the lenient policy with default knobs.
    pub fn lenient() -> Self {
        ParseConfig {
            mode: Mode::Lenient,
            ..ParseConfig::default()
        }
    }

    /// Check the configuration before any parsing is attempted.
    ///
    /// A `call_level` above [`CALL_LEVEL_WARN`] is legal but logged as a
    /// performance warning. Empty `collect` entries are rejected: they can
    /// never match a valid resource type, so they always indicate a caller
    /// bug.
    pub fn validate(&self) -> Result<(), ParseError> {
        if self.call_level > CALL_LEVEL_WARN {
            tracing::warn!(
                call_level = self.call_level,
                "call_level above {CALL_LEVEL_WARN} may cause performance issues"
            );
        }
        if let Some(collect) = &self.collect {
            if collect.iter().any(|ty| ty.is_empty()) {
                return Err(ParseError::Config(
                    "collect entries must be non-empty type names".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn is_strict(&self) -> bool {
        self.mode == Mode::Strict
    }
}
