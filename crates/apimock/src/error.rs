//! Errors returned by request resolution.

use crate::body::BodyError;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The body could not be parsed per its declared content type
    #[error("Invalid request body: {0}")]
    BadRequest(#[from] BodyError),
    /// No operation matches, or the matched operation has no default scenario
    #[error("{0}")]
    NotFound(String),
    /// The store could not load an operation it had just matched
    #[error("{0}")]
    Internal(String),
}

impl ResolveError {
    pub fn no_operation(method: &str, url: &str) -> Self {
        ResolveError::NotFound(format!("No mocked operation matches {method} {url}"))
    }

    pub fn no_default_scenario(operation_id: &str) -> Self {
        ResolveError::NotFound(format!(
            "Operation {operation_id} has no default scenario"
        ))
    }
}
