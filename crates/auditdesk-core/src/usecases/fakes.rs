//! In-memory port fakes shared by the use-case tests

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::{
    domain::{
        AccessToken, AuditCategory, AuditRecord, FileUpload, RecordId, Role, Session,
        UserAccount, UserDraft, UserId, UserUpdate,
    },
    ports::{
        AuditListing, Credentials, EvidenceReceipt, IAuditService, INotificationService,
        ISessionStore, IUserDirectory, ImportSummary, Notification, NotificationLevel,
    },
};

pub fn admin_session() -> Session {
    Session::new(UserId::new(1), "admin", Role::Admin, AccessToken::new("admin-token"))
}

pub fn user_session() -> Session {
    Session::new(UserId::new(2), "operator", Role::User, AccessToken::new("user-token"))
}

// ---------------------------------------------------------------------------
// Audit service
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeAuditState {
    pub records: HashMap<AuditCategory, Vec<AuditRecord>>,
    pub last_upload_date: Option<String>,
    pub fail_list: bool,
    pub fail_update: bool,
    pub fail_import: bool,
    pub fail_evidence: bool,
    /// Rows added to the category by a successful import
    pub import_rows: Vec<AuditRecord>,
    pub update_delay: HashMap<RecordId, Duration>,
    pub list_calls: usize,
    pub updates: Vec<(AuditCategory, AuditRecord)>,
    pub imports: Vec<String>,
    pub evidence_uploads: Vec<(RecordId, String)>,
}

#[derive(Default)]
pub struct FakeAuditService {
    state: Mutex<FakeAuditState>,
}

impl FakeAuditService {
    pub fn with_records(category: AuditCategory, records: Vec<AuditRecord>) -> Self {
        let fake = Self::default();
        fake.state().records.insert(category, records);
        fake
    }

    pub fn state(&self) -> MutexGuard<'_, FakeAuditState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl IAuditService for FakeAuditService {
    async fn list_audits(
        &self,
        _session: &Session,
        category: AuditCategory,
    ) -> anyhow::Result<AuditListing> {
        let mut state = self.state();
        state.list_calls += 1;
        if state.fail_list {
            anyhow::bail!("HTTP 500: Database unavailable");
        }
        let records = state.records.get(&category).cloned().unwrap_or_default();
        let mut listing = AuditListing::new(records);
        listing.last_upload_date = state.last_upload_date.clone();
        Ok(listing)
    }

    async fn last_upload_date(
        &self,
        _session: &Session,
        _category: AuditCategory,
    ) -> anyhow::Result<Option<String>> {
        Ok(self.state().last_upload_date.clone())
    }

    async fn update_record(
        &self,
        _session: &Session,
        category: AuditCategory,
        record: &AuditRecord,
    ) -> anyhow::Result<()> {
        let delay = record
            .id()
            .and_then(|id| self.state().update_delay.get(&id).copied());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        if state.fail_update {
            anyhow::bail!("HTTP 500: Update failed");
        }
        state.updates.push((category, record.clone()));
        if let Some(rows) = state.records.get_mut(&category) {
            if let Some(row) = rows.iter_mut().find(|r| r.id() == record.id()) {
                *row = record.clone();
            }
        }
        Ok(())
    }

    async fn import_spreadsheet(
        &self,
        _session: &Session,
        category: AuditCategory,
        file: &FileUpload,
    ) -> anyhow::Result<ImportSummary> {
        let mut state = self.state();
        if state.fail_import {
            anyhow::bail!("HTTP 400: Missing required columns");
        }
        state.imports.push(file.file_name().to_string());
        let rows = std::mem::take(&mut state.import_rows);
        let count = rows.len() as u64;
        state.records.entry(category).or_default().extend(rows);
        Ok(ImportSummary {
            success: true,
            count: Some(count),
            message: Some(format!("Imported {count} rows")),
        })
    }

    async fn upload_evidence(
        &self,
        _session: &Session,
        _category: AuditCategory,
        record_id: RecordId,
        file: &FileUpload,
    ) -> anyhow::Result<EvidenceReceipt> {
        let mut state = self.state();
        if state.fail_evidence {
            anyhow::bail!("HTTP 500: Storage unavailable");
        }
        state
            .evidence_uploads
            .push((record_id, file.file_name().to_string()));
        Ok(EvidenceReceipt {
            filename: format!("evidence_{record_id}_{}", file.file_name()),
        })
    }
}

// ---------------------------------------------------------------------------
// User directory
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeUserState {
    pub users: Vec<UserAccount>,
    pub fail_list: bool,
    pub fail_writes: bool,
    pub list_calls: usize,
    pub created: Vec<UserDraft>,
    pub updated: Vec<(UserId, UserUpdate)>,
    pub deleted: Vec<UserId>,
}

#[derive(Default)]
pub struct FakeUserDirectory {
    state: Mutex<FakeUserState>,
}

impl FakeUserDirectory {
    pub fn with_users(users: Vec<UserAccount>) -> Self {
        let fake = Self::default();
        fake.state().users = users;
        fake
    }

    pub fn state(&self) -> MutexGuard<'_, FakeUserState> {
        self.state.lock().unwrap()
    }
}

pub fn account(id: i64, username: &str, company: &str, role: Role) -> UserAccount {
    UserAccount {
        id: UserId::new(id),
        company_name: Some(company.to_string()),
        plant_name: Some("Plant A".to_string()),
        username: username.to_string(),
        gen_id: None,
        email: Some(format!("{username}@example.com")),
        department: Some("Quality".to_string()),
        role,
    }
}

#[async_trait]
impl IUserDirectory for FakeUserDirectory {
    async fn login(&self, credentials: &Credentials) -> anyhow::Result<Session> {
        if credentials.password != "secret" {
            anyhow::bail!("HTTP 401: Invalid credentials");
        }
        let role = if credentials.username == "admin" {
            Role::Admin
        } else {
            Role::User
        };
        Ok(Session::new(
            UserId::new(9),
            credentials.username.clone(),
            role,
            AccessToken::new("issued-token"),
        ))
    }

    async fn list_users(&self, _session: &Session) -> anyhow::Result<Vec<UserAccount>> {
        let mut state = self.state();
        state.list_calls += 1;
        if state.fail_list {
            anyhow::bail!("HTTP 500: Database unavailable");
        }
        Ok(state.users.clone())
    }

    async fn create_user(&self, _session: &Session, draft: &UserDraft) -> anyhow::Result<()> {
        let mut state = self.state();
        if state.fail_writes {
            anyhow::bail!("HTTP 400: Username already exists");
        }
        let id = state.users.len() as i64 + 100;
        let created = account(id, &draft.username, &draft.company_name, draft.role);
        state.users.push(created);
        state.created.push(draft.clone());
        Ok(())
    }

    async fn update_user(
        &self,
        _session: &Session,
        id: UserId,
        update: &UserUpdate,
    ) -> anyhow::Result<()> {
        let mut state = self.state();
        if state.fail_writes {
            anyhow::bail!("HTTP 404: User not found");
        }
        if let Some(user) = state.users.iter_mut().find(|u| u.id == id) {
            if let Some(username) = &update.username {
                user.username = username.clone();
            }
            if let Some(role) = update.role {
                user.role = role;
            }
        }
        state.updated.push((id, update.clone()));
        Ok(())
    }

    async fn delete_user(&self, _session: &Session, id: UserId) -> anyhow::Result<()> {
        let mut state = self.state();
        if state.fail_writes {
            anyhow::bail!("HTTP 404: User not found");
        }
        state.users.retain(|u| u.id != id);
        state.deleted.push(id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Session store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
}

impl ISessionStore for MemorySessionStore {
    fn load(&self) -> anyhow::Result<Option<Session>> {
        Ok(self.session.lock().unwrap().clone())
    }

    fn save(&self, session: &Session) -> anyhow::Result<()> {
        *self.session.lock().unwrap() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> anyhow::Result<()> {
        *self.session.lock().unwrap() = None;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self, level: NotificationLevel) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.level == level)
            .count()
    }
}

#[async_trait]
impl INotificationService for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}
