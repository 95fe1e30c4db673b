//! AuditDesk Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `AuditRecord`, `UserAccount`, `Session`, `AuditSummary`
//! - **Use cases** - `AuditRecordStore`, `UserAccountAdmin`, `ReconciliationQueue`
//! - **Port definitions** - Traits for adapters: `IAuditService`, `IUserDirectory`,
//!   `ISessionStore`, `INotificationService`
//!
//! # Architecture
//!
//! The domain module contains pure business logic with no I/O.
//! Ports define trait interfaces that adapter crates implement.
//! Use cases orchestrate domain entities through port interfaces.

pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
