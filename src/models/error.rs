//! Error taxonomy for bracket operations.

use crate::storage::StorageError;
use thiserror::Error;

/// Coarse classification of a [`BracketError`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Malformed or missing caller input.
    Validation,
    /// A required write did not report success, or the backend failed.
    Persistence,
    /// The builder broke one of its own invariants.
    Internal,
}

/// Errors that can occur while building or updating a stage.
#[derive(Debug, Error)]
pub enum BracketError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Persistence(String),

    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("malformed record: {0}")]
    Record(#[from] serde_json::Error),
}

impl BracketError {
    pub fn validation(message: impl Into<String>) -> Self {
        BracketError::Validation(message.into())
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        BracketError::Persistence(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        BracketError::Internal(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BracketError::Validation(_) => ErrorKind::Validation,
            BracketError::Persistence(_) | BracketError::Storage(_) | BracketError::Record(_) => {
                ErrorKind::Persistence
            }
            BracketError::Internal(_) => ErrorKind::Internal,
        }
    }
}
