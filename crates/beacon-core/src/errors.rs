//! Cross-cutting error types for Beacon.
//!
//! Domain-specific errors (e.g., `DatabaseError`, `ScoringError`) are defined in
//! their respective crates. HTTP mapping happens in `beacon-server` where all
//! crate errors converge.

use thiserror::Error;

/// Errors that can be raised by any Beacon crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no result.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// A state machine transition was attempted that is not allowed.
    #[error("Invalid state transition: {entity_type} {id} from {from} to {to}")]
    InvalidTransition {
        entity_type: String,
        id: String,
        from: String,
        to: String,
    },

    /// Data failed validation (format, ranges, required fields).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
