//! HttpAuditBackend - port implementations over the REST backend
//!
//! Wraps the [`ApiClient`] and delegates to the [`audits`] and [`users`]
//! modules to fulfil the [`IAuditService`] and [`IUserDirectory`] port
//! contracts.
//!
//! ## Design Notes
//!
//! - `ApiClient` holds no per-operator state, so the provider needs no lock;
//!   the session arrives with each call.
//! - [`ApiError`](crate::ApiError) values are wrapped into `anyhow` with a
//!   context naming the endpoint, which is what the use cases surface.

use anyhow::{Context, Result};
use tracing::debug;

use auditdesk_core::{
    domain::{
        AuditCategory, AuditRecord, FileUpload, RecordId, Session, UserAccount, UserDraft, UserId,
        UserUpdate,
    },
    ports::{
        AuditListing, Credentials, EvidenceReceipt, IAuditService, IUserDirectory, ImportSummary,
    },
};

use crate::client::ApiClient;
use crate::{audits, users};

/// Audit service and user directory backed by the HTTP API
#[derive(Debug, Clone)]
pub struct HttpAuditBackend {
    client: ApiClient,
}

impl HttpAuditBackend {
    /// Creates a new `HttpAuditBackend` wrapping the given [`ApiClient`]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

#[async_trait::async_trait]
impl IAuditService for HttpAuditBackend {
    async fn list_audits(&self, session: &Session, category: AuditCategory) -> Result<AuditListing> {
        debug!(%category, "HttpAuditBackend::list_audits");
        audits::list_audits(&self.client, session, category)
            .await
            .context("GET /audits failed")
    }

    async fn last_upload_date(
        &self,
        session: &Session,
        category: AuditCategory,
    ) -> Result<Option<String>> {
        audits::last_upload_date(&self.client, session, category)
            .await
            .context("GET /audits/last-upload failed")
    }

    async fn update_record(
        &self,
        session: &Session,
        category: AuditCategory,
        record: &AuditRecord,
    ) -> Result<()> {
        if record.id().is_none() {
            anyhow::bail!("Cannot update a record without an ID");
        }
        audits::update_record(&self.client, session, category, record)
            .await
            .context("POST /audits/update failed")
    }

    async fn import_spreadsheet(
        &self,
        session: &Session,
        category: AuditCategory,
        file: &FileUpload,
    ) -> Result<ImportSummary> {
        audits::import_spreadsheet(&self.client, session, category, file)
            .await
            .context("POST /audits/upload failed")
    }

    async fn upload_evidence(
        &self,
        session: &Session,
        category: AuditCategory,
        record_id: RecordId,
        file: &FileUpload,
    ) -> Result<EvidenceReceipt> {
        audits::upload_evidence(&self.client, session, category, record_id, file)
            .await
            .context("POST /audits/upload-evidence failed")
    }
}

#[async_trait::async_trait]
impl IUserDirectory for HttpAuditBackend {
    async fn login(&self, credentials: &Credentials) -> Result<Session> {
        users::login(&self.client, credentials)
            .await
            .context("POST /login failed")
    }

    async fn list_users(&self, session: &Session) -> Result<Vec<UserAccount>> {
        users::list_users(&self.client, session)
            .await
            .context("GET /users failed")
    }

    async fn create_user(&self, session: &Session, draft: &UserDraft) -> Result<()> {
        users::create_user(&self.client, session, draft)
            .await
            .context("POST /users failed")
    }

    async fn update_user(&self, session: &Session, id: UserId, update: &UserUpdate) -> Result<()> {
        users::update_user(&self.client, session, id, update)
            .await
            .with_context(|| format!("PUT /users/{id} failed"))
    }

    async fn delete_user(&self, session: &Session, id: UserId) -> Result<()> {
        users::delete_user(&self.client, session, id)
            .await
            .with_context(|| format!("DELETE /users/{id} failed"))
    }
}
