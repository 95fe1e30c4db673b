//! Domain entities and business logic
//!
//! This module contains the core domain types for AuditDesk:
//! - Newtypes for identifiers and validated values
//! - Audit records, categories and the field-edit rules
//! - User accounts, drafts and partial updates
//! - The session context passed to every remote operation
//! - Record filtering and dashboard aggregation
//! - Domain-specific error types

pub mod audit_record;
pub mod errors;
pub mod filter;
pub mod newtypes;
pub mod session;
pub mod summary;
pub mod upload;
pub mod user_account;

// Re-export commonly used types
pub use audit_record::{AuditCategory, AuditRecord, AuditStatus, Classification, RecordField};
pub use errors::DomainError;
pub use filter::{location_index, LocationFilter, RecordFilter};
pub use newtypes::*;
pub use session::Session;
pub use summary::{AuditSummary, GroupCount, TimeRange};
pub use upload::{FileUpload, UploadKind};
pub use user_account::{Role, UserAccount, UserDraft, UserUpdate};
