//! Use cases (interactors) for AuditDesk
//!
//! This module contains the application use cases that orchestrate
//! domain entities and port interfaces. Use cases own client-side state
//! (the working copy of audit records, the cached user list) and delegate
//! I/O to ports under a [`RequestPolicy`].
//!
//! ## Use Cases
//!
//! - [`AuditRecordStore`] - Load, filter, edit, evidence, import, reconcile
//! - [`UserAccountAdmin`] - Admin-only user CRUD and search
//! - [`AuthenticateUseCase`] - Login, logout and the stored session

pub mod audit_records;
pub mod authenticate;
pub mod error;
pub mod reconcile;
pub mod request;
pub mod user_admin;

#[cfg(test)]
pub(crate) mod fakes;

pub use audit_records::{AuditRecordStore, EditOutcome, ImportReport, LoadReport, ReconcileReport};
pub use authenticate::AuthenticateUseCase;
pub use error::StoreError;
pub use reconcile::{MutationKind, MutationState, PendingMutation, ReconciliationQueue};
pub use request::RequestPolicy;
pub use user_admin::UserAccountAdmin;
