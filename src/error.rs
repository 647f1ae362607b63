//! Error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// Malformed request (short override reason, missing identity).
    /// The message is surfaced verbatim to the caller.
    #[error("{0}")]
    Validation(String),

    /// Unknown project, version, or violation.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Duplicate tag race or double-override attempt.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Rollback target belongs to a different project.
    #[error("version {version} belongs to project {actual}, not {expected}")]
    CrossProjectMismatch {
        version: String,
        expected: String,
        actual: String,
    },

    /// Unexpected durable-store failure. The triggering request fails
    /// cleanly; the ledger itself is never left half-written.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl CoreError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

pub type CoreResult<T> = core::result::Result<T, CoreError>;
