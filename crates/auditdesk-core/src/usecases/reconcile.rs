//! Reconciliation queue for optimistic edits
//!
//! Each local mutation of the working copy is recorded with a full-record
//! snapshot and a confirmation state. Acknowledgements are applied by
//! [`MutationId`], so the order in which responses arrive never matters.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::domain::{AuditRecord, MutationId, RecordField, RecordId};

/// What a mutation changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "field")]
pub enum MutationKind {
    /// Inline edit of one field
    Field(#[serde(serialize_with = "serialize_field")] RecordField),
    /// Evidence reference written together with `Status = Closed`
    Evidence,
}

fn serialize_field<S: serde::Serializer>(field: &RecordField, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(field.wire_name())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationState {
    /// Sent, no answer yet
    InFlight,
    Confirmed,
    /// Last attempt failed; eligible for a resend until attempts run out
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct PendingMutation {
    pub id: MutationId,
    pub record_id: RecordId,
    pub kind: MutationKind,
    /// Full record as it stood right after the edit
    #[serde(skip)]
    pub snapshot: AuditRecord,
    pub state: MutationState,
    pub attempts: u32,
    pub queued_at: DateTime<Utc>,
    pub last_error: Option<String>,
}

impl PendingMutation {
    pub fn is_confirmed(&self) -> bool {
        self.state == MutationState::Confirmed
    }
}

#[derive(Debug, Clone)]
pub struct ReconciliationQueue {
    entries: Vec<PendingMutation>,
    max_attempts: u32,
}

impl ReconciliationQueue {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            entries: Vec::new(),
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Records a new in-flight mutation.
    ///
    /// Unconfirmed mutations of the same record are dropped: the new
    /// snapshot already contains their changes, and resending an older
    /// snapshot would undo this one.
    pub fn enqueue(
        &mut self,
        record_id: RecordId,
        kind: MutationKind,
        snapshot: AuditRecord,
    ) -> MutationId {
        let before = self.entries.len();
        self.entries
            .retain(|m| m.record_id != record_id || m.is_confirmed());
        let superseded = before - self.entries.len();
        if superseded > 0 {
            debug!(record_id = %record_id, superseded, "Superseded unconfirmed mutations");
        }

        let id = MutationId::new();
        self.entries.push(PendingMutation {
            id,
            record_id,
            kind,
            snapshot,
            state: MutationState::InFlight,
            attempts: 1,
            queued_at: Utc::now(),
            last_error: None,
        });
        id
    }

    /// Marks `id` confirmed; false when the id is unknown
    pub fn confirm(&mut self, id: MutationId) -> bool {
        match self.get_mut(id) {
            Some(m) => {
                m.state = MutationState::Confirmed;
                m.last_error = None;
                true
            }
            None => false,
        }
    }

    /// Marks `id` failed with `error`; false when the id is unknown
    pub fn fail(&mut self, id: MutationId, error: impl Into<String>) -> bool {
        match self.get_mut(id) {
            Some(m) => {
                m.state = MutationState::Failed;
                m.last_error = Some(error.into());
                true
            }
            None => false,
        }
    }

    /// Moves a failed mutation back in flight for another attempt
    pub fn begin_retry(&mut self, id: MutationId) -> Option<&PendingMutation> {
        let m = self.get_mut(id)?;
        m.state = MutationState::InFlight;
        m.attempts += 1;
        Some(&*m)
    }

    pub fn get(&self, id: MutationId) -> Option<&PendingMutation> {
        self.entries.iter().find(|m| m.id == id)
    }

    fn get_mut(&mut self, id: MutationId) -> Option<&mut PendingMutation> {
        self.entries.iter_mut().find(|m| m.id == id)
    }

    /// Every mutation without a confirmation, in issue order
    pub fn unresolved(&self) -> Vec<&PendingMutation> {
        self.entries.iter().filter(|m| !m.is_confirmed()).collect()
    }

    /// Failed mutations that still have attempts left
    pub fn retryable(&self) -> Vec<MutationId> {
        self.entries
            .iter()
            .filter(|m| m.state == MutationState::Failed && m.attempts < self.max_attempts)
            .map(|m| m.id)
            .collect()
    }

    /// Failed mutations that used up every attempt
    pub fn abandoned(&self) -> Vec<&PendingMutation> {
        self.entries
            .iter()
            .filter(|m| m.state == MutationState::Failed && m.attempts >= self.max_attempts)
            .collect()
    }

    /// Drops confirmed entries, returning how many were removed
    pub fn prune_confirmed(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|m| !m.is_confirmed());
        before - self.entries.len()
    }

    /// Empties the queue, returning how many unconfirmed mutations were discarded
    pub fn clear(&mut self) -> usize {
        let discarded = self.unresolved().len();
        self.entries.clear();
        discarded
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ReconciliationQueue {
    fn default() -> Self {
        Self::new(3)
    }
}
