//! Database error types for beacon-db.

use thiserror::Error;

use beacon_scoring::ScoringError;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// A row looked up by ID does not exist in the caller's company.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Input failed validation before touching the database.
    #[error("{0}")]
    Validation(String),

    /// The operation is not allowed in the entity's current state.
    #[error("{0}")]
    InvalidState(String),

    /// A company-scoped operation was called on an unscoped service.
    #[error("operation requires a company scope")]
    Unscoped,

    /// Scoring could not run.
    #[error(transparent)]
    Scoring(#[from] ScoringError),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    pub(crate) fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub(crate) fn json(e: serde_json::Error) -> Self {
        Self::Other(e.into())
    }
}
