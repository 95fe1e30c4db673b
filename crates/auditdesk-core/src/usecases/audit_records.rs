//! Audit record store use case
//!
//! Owns the working copy of one audit category and coordinates it with the
//! remote audit service:
//!
//! - `load` replaces the working copy, failing closed (empty plus error)
//! - `apply_filter` derives the display view from the full working copy
//! - `update_field` mutates locally first, then persists the whole record;
//!   a failed save is reported and kept, never rolled back
//! - evidence uploads stage a file per record, then write the returned
//!   reference and close the record in one local mutation
//! - `import_file` uploads a spreadsheet and reloads
//! - `reconcile` resends every unconfirmed mutation
//!
//! All operations take `&mut self`: one store, one writer.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{
    error::StoreError,
    reconcile::{MutationKind, PendingMutation, ReconciliationQueue},
    request::RequestPolicy,
};
use crate::{
    domain::{
        location_index, AuditCategory, AuditRecord, AuditSummary, DomainError, FileUpload,
        LocationFilter, MutationId, RecordField, RecordFilter, RecordId, Session, TimeRange,
        UploadKind,
    },
    ports::{IAuditService, INotificationService, ImportSummary, Notification},
};

/// Result of a successful load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub records: usize,
    pub locations: usize,
    /// Unconfirmed local edits dropped because remote state replaced them
    pub discarded_edits: usize,
}

/// Result of a successful import followed by a successful reload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub summary: ImportSummary,
    pub load: LoadReport,
}

/// What happened to a local edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// The value was already in place; nothing was sent
    Unchanged,
    /// Applied locally and acknowledged by the backend
    Confirmed(MutationId),
    /// Applied locally, but the save failed; tracked for `reconcile`
    Unconfirmed {
        mutation: MutationId,
        error: StoreError,
    },
}

impl EditOutcome {
    pub fn is_confirmed(&self) -> bool {
        !matches!(self, EditOutcome::Unconfirmed { .. })
    }
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub confirmed: Vec<MutationId>,
    pub failed: Vec<MutationId>,
    /// Mutations out of attempts; they stay unresolved until the next load
    pub abandoned: Vec<MutationId>,
}

pub struct AuditRecordStore {
    service: Arc<dyn IAuditService + Send + Sync>,
    notifier: Arc<dyn INotificationService + Send + Sync>,
    policy: RequestPolicy,
    category: AuditCategory,
    records: Vec<AuditRecord>,
    locations: Vec<String>,
    filter: RecordFilter,
    /// Indices into `records`
    view: Vec<usize>,
    error: Option<String>,
    last_upload_date: Option<String>,
    pending_evidence: HashMap<RecordId, FileUpload>,
    queue: ReconciliationQueue,
}

impl AuditRecordStore {
    pub fn new(
        service: Arc<dyn IAuditService + Send + Sync>,
        notifier: Arc<dyn INotificationService + Send + Sync>,
        policy: RequestPolicy,
        category: AuditCategory,
    ) -> Self {
        Self {
            service,
            notifier,
            policy,
            category,
            records: Vec::new(),
            locations: Vec::new(),
            filter: RecordFilter::default(),
            view: Vec::new(),
            error: None,
            last_upload_date: None,
            pending_evidence: HashMap::new(),
            queue: ReconciliationQueue::default(),
        }
    }

    /// Sets how many attempts an unconfirmed edit gets before it is abandoned
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.queue = ReconciliationQueue::new(max_attempts);
        self
    }

    // --- Read side ---

    pub fn category(&self) -> AuditCategory {
        self.category
    }

    /// The full working copy
    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    /// The filtered display view, in working-copy order
    pub fn view(&self) -> Vec<&AuditRecord> {
        self.view.iter().filter_map(|&i| self.records.get(i)).collect()
    }

    pub fn filter(&self) -> &RecordFilter {
        &self.filter
    }

    /// Distinct locations, first-seen order
    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    /// Error of the last load, if it failed
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn last_upload_date(&self) -> Option<&str> {
        self.last_upload_date.as_deref()
    }

    pub fn record(&self, id: RecordId) -> Option<&AuditRecord> {
        self.records.iter().find(|r| r.id() == Some(id))
    }

    /// Resolves a row of the display view to its record id
    ///
    /// # Errors
    /// [`DomainError::RecordNotFound`] for an index outside the view,
    /// [`DomainError::MissingRecordId`] when the row has no id.
    pub fn record_id_at(&self, view_index: usize) -> Result<RecordId, DomainError> {
        let record = self
            .view
            .get(view_index)
            .and_then(|&i| self.records.get(i))
            .ok_or_else(|| DomainError::RecordNotFound(format!("row {view_index}")))?;
        record.id().ok_or(DomainError::MissingRecordId)
    }

    pub fn pending_evidence(&self, id: RecordId) -> Option<&FileUpload> {
        self.pending_evidence.get(&id)
    }

    /// Mutations the backend has not confirmed, in issue order
    pub fn unresolved(&self) -> Vec<&PendingMutation> {
        self.queue.unresolved()
    }

    /// Dashboard figures for the current location filter
    pub fn summary(&self, range: TimeRange) -> AuditSummary {
        AuditSummary::compute(&self.records, range, &self.filter.location)
    }

    // --- Filtering ---

    /// Recomputes the view from the full working copy
    pub fn apply_filter(
        &mut self,
        search: impl Into<String>,
        location: LocationFilter,
    ) -> Vec<&AuditRecord> {
        self.filter = RecordFilter::new(search, location);
        self.refresh_view();
        self.view()
    }

    fn refresh_view(&mut self) {
        let filter = &self.filter;
        self.view = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| filter.accepts(r))
            .map(|(i, _)| i)
            .collect();
    }

    // --- Loading ---

    /// Replaces the working copy with the remote state of `category`.
    ///
    /// On failure the store is left empty with [`AuditRecordStore::error`] set.
    pub async fn load(
        &mut self,
        session: &Session,
        category: AuditCategory,
    ) -> Result<LoadReport, StoreError> {
        self.category = category;
        let result = self
            .policy
            .run("load audits", self.service.list_audits(session, category))
            .await;

        match result {
            Ok(listing) => {
                self.records = listing.records;
                self.locations = location_index(&self.records);
                self.last_upload_date = listing.last_upload_date;
                self.error = None;
                self.refresh_view();

                let discarded_edits = self.queue.clear();
                if discarded_edits > 0 {
                    warn!(discarded_edits, "Discarded unconfirmed edits on reload");
                    self.report(
                        Notification::warning(
                            "Unsaved edits discarded",
                            format!(
                                "{discarded_edits} edit(s) were never confirmed and have been replaced by the server state"
                            ),
                        )
                        .with_category("audits"),
                    )
                    .await;
                }

                info!(%category, records = self.records.len(), "Loaded audit records");
                Ok(LoadReport {
                    records: self.records.len(),
                    locations: self.locations.len(),
                    discarded_edits,
                })
            }
            Err(e) => {
                self.records.clear();
                self.locations.clear();
                self.view.clear();
                self.error = Some(e.to_string());
                self.report(
                    Notification::error("Failed to load audit data", e.to_string())
                        .with_category("audits"),
                )
                .await;
                Err(e)
            }
        }
    }

    /// Fetches the timestamp of the latest import without reloading records
    pub async fn refresh_last_upload_date(
        &mut self,
        session: &Session,
    ) -> Result<Option<&str>, StoreError> {
        let category = self.category;
        let result = self
            .policy
            .run(
                "fetch last upload date",
                self.service.last_upload_date(session, category),
            )
            .await;
        match result {
            Ok(date) => {
                self.last_upload_date = date;
                Ok(self.last_upload_date.as_deref())
            }
            Err(e) => {
                self.report(
                    Notification::error("Failed to fetch last upload date", e.to_string())
                        .with_category("audits"),
                )
                .await;
                Err(e)
            }
        }
    }

    // --- Editing ---

    /// Applies an inline edit locally, then persists the full record.
    ///
    /// Validation happens before any mutation. A failed save keeps the local
    /// value and is returned as [`EditOutcome::Unconfirmed`].
    pub async fn update_field(
        &mut self,
        session: &Session,
        record_id: RecordId,
        field: &str,
        value: &str,
    ) -> Result<EditOutcome, StoreError> {
        let field: RecordField = field.parse()?;
        let index = self.index_of(record_id)?;

        let mut updated = self.records[index].clone();
        if !updated.apply_edit(field, value, session.role())? {
            debug!(%record_id, %field, "Edit leaves record unchanged");
            return Ok(EditOutcome::Unchanged);
        }

        self.records[index] = updated;
        self.refresh_view();
        debug!(%record_id, %field, "Applied local edit");

        Ok(self
            .persist(session, index, MutationKind::Field(field))
            .await)
    }

    /// Sends the record at `index` and tracks the outcome in the queue
    async fn persist(&mut self, session: &Session, index: usize, kind: MutationKind) -> EditOutcome {
        let snapshot = self.records[index].clone();
        let Some(record_id) = snapshot.id() else {
            // index_of only yields records that carry an id
            return EditOutcome::Unchanged;
        };
        let mutation = self.queue.enqueue(record_id, kind, snapshot.clone());

        let result = self
            .policy
            .run(
                "save record",
                self.service.update_record(session, self.category, &snapshot),
            )
            .await;

        match result {
            Ok(()) => {
                self.queue.confirm(mutation);
                self.queue.prune_confirmed();
                info!(%record_id, "Record saved");
                EditOutcome::Confirmed(mutation)
            }
            Err(error) => {
                self.queue.fail(mutation, error.to_string());
                self.report(
                    Notification::error(
                        format!("Failed to save record {record_id}"),
                        format!("{error}. The change is kept locally; run reconcile to retry."),
                    )
                    .with_category("audits"),
                )
                .await;
                EditOutcome::Unconfirmed { mutation, error }
            }
        }
    }

    fn index_of(&self, record_id: RecordId) -> Result<usize, DomainError> {
        self.records
            .iter()
            .position(|r| r.id() == Some(record_id))
            .ok_or_else(|| DomainError::RecordNotFound(record_id.to_string()))
    }

    // --- Evidence ---

    /// Stages `file` as the evidence for `record_id`, replacing any staged file
    pub fn select_evidence(
        &mut self,
        record_id: RecordId,
        file: FileUpload,
    ) -> Result<(), StoreError> {
        file.validate_for(UploadKind::Evidence)?;
        self.index_of(record_id)?;
        debug!(%record_id, file = file.file_name(), "Evidence staged");
        self.pending_evidence.insert(record_id, file);
        Ok(())
    }

    /// Drops the staged file for `record_id`
    pub fn cancel_evidence(&mut self, record_id: RecordId) -> Option<FileUpload> {
        self.pending_evidence.remove(&record_id)
    }

    /// Stages `file` and uploads it in one step
    pub async fn attach_evidence(
        &mut self,
        session: &Session,
        record_id: RecordId,
        file: Option<FileUpload>,
    ) -> Result<EditOutcome, StoreError> {
        if let Some(file) = file {
            self.select_evidence(record_id, file)?;
        }
        self.attach_selected_evidence(session, record_id).await
    }

    /// Uploads the staged file for `record_id`.
    ///
    /// On success the returned reference is written to `Evidence` and the
    /// record closed in one local mutation, which is then saved like any
    /// other edit. A failed upload leaves the staged file in place.
    pub async fn attach_selected_evidence(
        &mut self,
        session: &Session,
        record_id: RecordId,
    ) -> Result<EditOutcome, StoreError> {
        let index = self.index_of(record_id)?;
        let file = self
            .pending_evidence
            .get(&record_id)
            .cloned()
            .ok_or(DomainError::MissingFile)?;

        let result = self
            .policy
            .run(
                "upload evidence",
                self.service
                    .upload_evidence(session, self.category, record_id, &file),
            )
            .await;

        let receipt = match result {
            Ok(receipt) => receipt,
            Err(e) => {
                self.report(
                    Notification::error(
                        format!("Evidence upload failed for record {record_id}"),
                        e.to_string(),
                    )
                    .with_category("evidence"),
                )
                .await;
                return Err(e);
            }
        };

        self.records[index].attach_evidence(receipt.filename.clone());
        self.pending_evidence.remove(&record_id);
        self.refresh_view();
        info!(%record_id, evidence = %receipt.filename, "Evidence attached, record closed");

        let outcome = self.persist(session, index, MutationKind::Evidence).await;
        if outcome.is_confirmed() {
            self.report(
                Notification::success(
                    "Evidence uploaded",
                    format!("Record {record_id} closed with {}", receipt.filename),
                )
                .with_category("evidence"),
            )
            .await;
        }
        Ok(outcome)
    }

    // --- Import ---

    /// Uploads a spreadsheet into `category`, then reloads it.
    ///
    /// The two steps are not atomic: when the reload fails the import has
    /// still happened and the store is left empty with an error.
    pub async fn import_file(
        &mut self,
        session: &Session,
        file: FileUpload,
        category: AuditCategory,
    ) -> Result<ImportReport, StoreError> {
        file.validate_for(UploadKind::Spreadsheet)?;

        let result = self
            .policy
            .run(
                "import spreadsheet",
                self.service.import_spreadsheet(session, category, &file),
            )
            .await;

        let summary = match result {
            Ok(summary) => summary,
            Err(e) => {
                self.report(
                    Notification::error("Import failed", e.to_string()).with_category("import"),
                )
                .await;
                return Err(e);
            }
        };

        info!(file = file.file_name(), %category, count = ?summary.count, "Spreadsheet imported");
        self.report(
            Notification::success(
                "Import complete",
                summary
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("{} uploaded", file.file_name())),
            )
            .with_category("import"),
        )
        .await;

        let load = self.load(session, category).await?;
        Ok(ImportReport { summary, load })
    }

    // --- Reconciliation ---

    /// Resends every failed mutation that still has attempts left.
    ///
    /// Sends run concurrently; each acknowledgement is applied to the
    /// mutation it belongs to.
    pub async fn reconcile(&mut self, session: &Session) -> ReconcileReport {
        let batch: Vec<(MutationId, AuditRecord)> = self
            .queue
            .retryable()
            .into_iter()
            .filter_map(|id| {
                self.queue
                    .begin_retry(id)
                    .map(|m| (m.id, m.snapshot.clone()))
            })
            .collect();

        if batch.is_empty() {
            debug!("Nothing to reconcile");
        } else {
            info!(mutations = batch.len(), "Reconciling unconfirmed edits");
        }

        let category = self.category;
        let service = &self.service;
        let policy = &self.policy;
        let sends = batch.iter().map(|(id, snapshot)| async move {
            let result = policy
                .run("save record", service.update_record(session, category, snapshot))
                .await;
            (*id, result)
        });
        let results = join_all(sends).await;

        let mut report = ReconcileReport::default();
        for (id, result) in results {
            match result {
                Ok(()) => {
                    self.queue.confirm(id);
                    report.confirmed.push(id);
                }
                Err(e) => {
                    self.queue.fail(id, e.to_string());
                    report.failed.push(id);
                }
            }
        }
        self.queue.prune_confirmed();

        let abandoned: Vec<(MutationId, RecordId, Option<String>)> = self
            .queue
            .abandoned()
            .into_iter()
            .map(|m| (m.id, m.record_id, m.last_error.clone()))
            .collect();
        let still_pending = report
            .failed
            .iter()
            .filter(|id| !abandoned.iter().any(|(a, _, _)| a == *id))
            .count();
        if still_pending > 0 {
            self.report(
                Notification::error(
                    "Some edits are still unsaved",
                    format!("{still_pending} record(s) could not be saved; run reconcile again"),
                )
                .with_category("audits"),
            )
            .await;
        }
        for (id, record_id, last_error) in abandoned {
            if report.failed.contains(&id) {
                self.report(
                    Notification::error(
                        format!("Gave up saving record {record_id}"),
                        last_error.unwrap_or_else(|| "no response".to_string()),
                    )
                    .with_category("audits"),
                )
                .await;
            }
            report.abandoned.push(id);
        }

        report
    }

    // --- Notifications ---

    async fn report(&self, notification: Notification) {
        if let Err(e) = self.notifier.notify(&notification).await {
            warn!(error = %e, title = %notification.title, "Failed to deliver notification");
        }
    }
}
