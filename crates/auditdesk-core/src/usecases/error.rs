//! Use-case error taxonomy

use std::time::Duration;

use thiserror::Error;

use crate::domain::DomainError;

/// Failure of a store or admin operation
///
/// Validation errors are raised before any network call and before any
/// local mutation. The other variants describe a remote call that did not
/// produce an acknowledgement.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error("{operation} failed: {message}")]
    Remote {
        operation: &'static str,
        message: String,
    },

    #[error("{operation} timed out after {}s", .after.as_secs())]
    TimedOut {
        operation: &'static str,
        after: Duration,
    },

    #[error("{operation} was cancelled")]
    Cancelled { operation: &'static str },

    #[error("Administrator role required to {0}")]
    Forbidden(&'static str),
}

impl StoreError {
    /// True for errors raised locally, before anything was sent
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_) | StoreError::Forbidden(_))
    }

    /// Name of the remote operation, when the error came from one
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            StoreError::Remote { operation, .. }
            | StoreError::TimedOut { operation, .. }
            | StoreError::Cancelled { operation } => Some(operation),
            StoreError::Validation(_) | StoreError::Forbidden(_) => None,
        }
    }
}
