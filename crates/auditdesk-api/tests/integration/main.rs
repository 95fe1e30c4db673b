//! Integration tests for auditdesk-api
//!
//! Uses wiremock to simulate the audit backend and verifies the HTTP
//! adapter endpoint by endpoint, then drives `AuditRecordStore` and
//! `UserAccountAdmin` against it end to end.

mod common;

mod test_audits;
mod test_store;
mod test_users;
