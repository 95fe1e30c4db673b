//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the use cases depend
//! on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IAuditService`] - Audit record persistence, imports and evidence uploads
//! - [`IUserDirectory`] - Login and user account administration
//! - [`ISessionStore`] - Persistence of the logged-in session between runs
//! - [`INotificationService`] - User-visible reporting of outcomes and failures

pub mod audit_service;
pub mod notification;
pub mod session_store;
pub mod user_directory;

pub use audit_service::{AuditListing, EvidenceReceipt, IAuditService, ImportSummary};
pub use notification::{INotificationService, Notification, NotificationLevel};
pub use session_store::ISessionStore;
pub use user_directory::{Credentials, IUserDirectory};
