//! Audit service port (driven/secondary port)
//!
//! The backend of record for audit findings. Every call carries the
//! session explicitly; adapters translate it into whatever credentials
//! their transport needs.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are adapter-specific.
//!   Use cases wrap them into `StoreError::Remote` with the operation name.
//! - Payload shape problems are the adapter's concern: a listing that is
//!   neither an array nor a `{data}` envelope comes back as an empty listing.

use serde::{Deserialize, Serialize};

use crate::domain::{AuditCategory, AuditRecord, FileUpload, RecordId, Session};

/// Result of listing one category
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditListing {
    pub records: Vec<AuditRecord>,
    /// Timestamp of the most recent import, when the backend reports it
    pub last_upload_date: Option<String>,
}

impl AuditListing {
    pub fn new(records: Vec<AuditRecord>) -> Self {
        Self {
            records,
            last_upload_date: None,
        }
    }

    pub fn with_last_upload_date(mut self, date: impl Into<String>) -> Self {
        self.last_upload_date = Some(date.into());
        self
    }
}

/// Acknowledgement of a spreadsheet import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    #[serde(default)]
    pub success: bool,
    /// Number of rows ingested
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Where the backend stored an evidence file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceReceipt {
    /// Reference written into the record's `Evidence` field
    pub filename: String,
}

/// Port trait for the remote audit backend
#[async_trait::async_trait]
pub trait IAuditService: Send + Sync {
    /// Fetches every record of `category`
    async fn list_audits(
        &self,
        session: &Session,
        category: AuditCategory,
    ) -> anyhow::Result<AuditListing>;

    /// Timestamp of the latest import for `category`, if any
    async fn last_upload_date(
        &self,
        session: &Session,
        category: AuditCategory,
    ) -> anyhow::Result<Option<String>>;

    /// Persists the full state of one record
    ///
    /// The record must carry an id; the backend matches on it.
    async fn update_record(
        &self,
        session: &Session,
        category: AuditCategory,
        record: &AuditRecord,
    ) -> anyhow::Result<()>;

    /// Uploads a spreadsheet for bulk ingestion into `category`
    async fn import_spreadsheet(
        &self,
        session: &Session,
        category: AuditCategory,
        file: &FileUpload,
    ) -> anyhow::Result<ImportSummary>;

    /// Uploads an evidence artifact for one record
    async fn upload_evidence(
        &self,
        session: &Session,
        category: AuditCategory,
        record_id: RecordId,
        file: &FileUpload,
    ) -> anyhow::Result<EvidenceReceipt>;
}
