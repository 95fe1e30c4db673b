//! Domain error types
//!
//! This module defines error types specific to domain operations:
//! malformed identifiers and values, edits the record rules forbid,
//! and missing inputs caught before any network call.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Audit category other than `internal` or `external`
    #[error("Invalid audit category: {0} (expected 'internal' or 'external')")]
    InvalidCategory(String),

    /// Status value other than `Open` or `Closed`
    #[error("Invalid status: {0} (expected 'Open' or 'Closed')")]
    InvalidStatus(String),

    /// Role value other than `user`, `manager` or `admin`
    #[error("Invalid role: {0}")]
    InvalidRole(String),

    /// Field name that does not exist on an audit record
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Attempt to edit a descriptive field after import
    #[error("Field {0} is read-only after import")]
    ImmutableField(String),

    /// Non-admin attempt to move a record away from Closed
    #[error("Record {0} is closed; only an admin can reopen it")]
    StatusLocked(String),

    /// Date that is not `YYYY-MM-DD`
    #[error("Invalid date: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    /// Invalid email address format
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    /// ID parsing error
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// Record has no backend-assigned id, so it cannot be mutated
    #[error("Invalid record: missing ID")]
    MissingRecordId,

    /// No record with the given id in the working copy
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    /// No file staged or supplied for an upload
    #[error("No file selected")]
    MissingFile,

    /// File extension not accepted for the upload kind
    #[error("Unsupported file type: {file} (allowed: {allowed})")]
    UnsupportedFileType {
        /// The offending file name
        file: String,
        /// Comma-separated list of accepted extensions
        allowed: String,
    },

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainError::InvalidCategory("audit".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid audit category: audit (expected 'internal' or 'external')"
        );

        let err = DomainError::StatusLocked("42".to_string());
        assert_eq!(
            err.to_string(),
            "Record 42 is closed; only an admin can reopen it"
        );

        let err = DomainError::UnsupportedFileType {
            file: "notes.txt".to_string(),
            allowed: "pdf, png".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unsupported file type: notes.txt (allowed: pdf, png)"
        );
    }

    #[test]
    fn test_error_equality() {
        let err1 = DomainError::UnknownField("Foo".to_string());
        let err2 = DomainError::UnknownField("Foo".to_string());
        let err3 = DomainError::UnknownField("Bar".to_string());

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }
}
