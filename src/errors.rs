//! Typed error hierarchy for dealflow.
//!
//! `CrmError` is what every repository, settings and board operation returns.
//! Plumbing code (config loading, CLI commands, the SQL layer) stays on
//! `anyhow::Result` and is lifted into `CrmError::Persistence` at the
//! repository boundary.

use thiserror::Error;

pub type Result<T, E = CrmError> = std::result::Result<T, E>;

/// Errors surfaced to the user action that initiated an operation.
#[derive(Debug, Error)]
pub enum CrmError {
    /// Missing or malformed input. Shown inline, never retried.
    #[error("{0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Settings document was written by someone else since it was loaded.
    #[error("Settings changed concurrently (expected version {expected}, found {found})")]
    Conflict { expected: u64, found: u64 },

    #[error("Persistence failure: {0}")]
    Persistence(#[source] anyhow::Error),
}

impl CrmError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<anyhow::Error> for CrmError {
    fn from(err: anyhow::Error) -> Self {
        // A CrmError that travelled through an anyhow chain keeps its kind.
        match err.downcast::<CrmError>() {
            Ok(inner) => inner,
            Err(err) => Self::Persistence(err),
        }
    }
}
