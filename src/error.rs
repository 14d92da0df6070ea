use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum ParseError {
    /// Parse configuration rejected before any parsing was attempted.
    #[error("Invalid parse configuration: {0}")]
    Config(String),
    /// A resource reached the flattener without the `type`/`id` identity
    /// pair. Full validation is best-effort, so this can surface even on a
    /// document that validated (e.g. a malformed included resource reached
    /// through a relationship).
    #[error("Resource is missing required type or id: {0}")]
    InvalidResource(String),
    /// The document failed structural validation. Carries the complete set
    /// of path-prefixed violations, never just the first one.
    #[error("JSON:API document validation failed: {}", .errors.join("; "))]
    Validation { errors: Vec<String> },
}

impl ParseError {
    pub fn validation(errors: Vec<String>) -> Self {
        ParseError::Validation { errors }
    }

    /// The aggregated violation list, empty for non-validation errors.
    pub fn validation_errors(&self) -> &[String] {
        match self {
            ParseError::Validation { errors } => errors,
            _ => &[],
        }
    }
}
