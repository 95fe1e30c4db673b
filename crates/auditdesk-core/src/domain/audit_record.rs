//! Audit record domain entity
//!
//! An [`AuditRecord`] is one non-conformance finding from an internal or
//! external audit. Descriptive fields are fixed by the spreadsheet import;
//! remediation fields and the lifecycle status are edited afterwards.
//!
//! The serde representation uses the backend's column names (`SN`,
//! `NCMinI`, `ClosingDates`, ...). Deserialization is lenient: null, empty
//! and mistyped scalars collapse to "absent" instead of rejecting the
//! whole listing.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{errors::DomainError, newtypes::RecordId, user_account::Role};

/// Wire format for calendar dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// AuditCategory
// ============================================================================

/// One of the two disjoint audit tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditCategory {
    Internal,
    External,
}

impl AuditCategory {
    /// Both categories, internal first
    pub const ALL: [AuditCategory; 2] = [AuditCategory::Internal, AuditCategory::External];

    /// The literal used in query strings and form fields
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditCategory::Internal => "internal",
            AuditCategory::External => "external",
        }
    }
}

impl fmt::Display for AuditCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "internal" => Ok(AuditCategory::Internal),
            "external" => Ok(AuditCategory::External),
            other => Err(DomainError::InvalidCategory(other.to_string())),
        }
    }
}

// ============================================================================
// AuditStatus
// ============================================================================

/// Lifecycle state of a finding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditStatus {
    #[default]
    Open,
    Closed,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Open => "Open",
            AuditStatus::Closed => "Closed",
        }
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(AuditStatus::Open),
            "closed" => Ok(AuditStatus::Closed),
            _ => Err(DomainError::InvalidStatus(s.to_string())),
        }
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Severity tag of a finding (`NC / MiN / I` column)
///
/// The set is open: unknown tags are kept verbatim in [`Classification::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Classification {
    /// Major non-conformance (`NC`)
    NonConformance,
    /// Minor non-conformance (`MiN`)
    Minor,
    /// Improvement opportunity (`I`)
    Improvement,
    Other(String),
}

impl Classification {
    /// Parses a tag, matching the known ones case-insensitively
    pub fn parse(tag: &str) -> Self {
        let trimmed = tag.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "nc" => Classification::NonConformance,
            "min" => Classification::Minor,
            "i" => Classification::Improvement,
            _ => Classification::Other(trimmed.to_string()),
        }
    }

    /// The tag as the backend stores it
    pub fn as_str(&self) -> &str {
        match self {
            Classification::NonConformance => "NC",
            Classification::Minor => "MiN",
            Classification::Improvement => "I",
            Classification::Other(tag) => tag,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Classification {
    fn from(value: String) -> Self {
        Classification::parse(&value)
    }
}

impl From<Classification> for String {
    fn from(value: Classification) -> Self {
        value.as_str().to_string()
    }
}

// ============================================================================
// RecordField
// ============================================================================

/// Addressable columns of an audit record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    SerialNumber,
    Location,
    DomainClause,
    AuditDate,
    ReportDate,
    Classification,
    Observation,
    RootCause,
    CorrectiveAction,
    PreventiveAction,
    Responsibility,
    ClosingDate,
    Status,
    Evidence,
}

impl RecordField {
    pub const ALL: [RecordField; 14] = [
        RecordField::SerialNumber,
        RecordField::Location,
        RecordField::DomainClause,
        RecordField::AuditDate,
        RecordField::ReportDate,
        RecordField::Classification,
        RecordField::Observation,
        RecordField::RootCause,
        RecordField::CorrectiveAction,
        RecordField::PreventiveAction,
        RecordField::Responsibility,
        RecordField::ClosingDate,
        RecordField::Status,
        RecordField::Evidence,
    ];

    /// Backend column name
    pub fn wire_name(&self) -> &'static str {
        match self {
            RecordField::SerialNumber => "SN",
            RecordField::Location => "Location",
            RecordField::DomainClause => "DomainClauses",
            RecordField::AuditDate => "DateOfAudit",
            RecordField::ReportDate => "DateOfSubmission",
            RecordField::Classification => "NCMinI",
            RecordField::Observation => "ObservationDescription",
            RecordField::RootCause => "RootCauseAnalysis",
            RecordField::CorrectiveAction => "CorrectiveAction",
            RecordField::PreventiveAction => "PreventiveAction",
            RecordField::Responsibility => "Responsibility",
            RecordField::ClosingDate => "ClosingDates",
            RecordField::Status => "Status",
            RecordField::Evidence => "Evidence",
        }
    }

    /// snake_case alias accepted on the command line
    pub fn alias(&self) -> &'static str {
        match self {
            RecordField::SerialNumber => "serial_number",
            RecordField::Location => "location",
            RecordField::DomainClause => "domain_clause",
            RecordField::AuditDate => "audit_date",
            RecordField::ReportDate => "report_date",
            RecordField::Classification => "classification",
            RecordField::Observation => "observation",
            RecordField::RootCause => "root_cause",
            RecordField::CorrectiveAction => "corrective_action",
            RecordField::PreventiveAction => "preventive_action",
            RecordField::Responsibility => "responsibility",
            RecordField::ClosingDate => "closing_date",
            RecordField::Status => "status",
            RecordField::Evidence => "evidence",
        }
    }

    /// Remediation and lifecycle fields; evidence only changes through an upload
    pub fn is_mutable(&self) -> bool {
        matches!(
            self,
            RecordField::RootCause
                | RecordField::CorrectiveAction
                | RecordField::PreventiveAction
                | RecordField::Responsibility
                | RecordField::ClosingDate
                | RecordField::Status
        )
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for RecordField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        RecordField::ALL
            .iter()
            .copied()
            .find(|f| {
                f.wire_name().eq_ignore_ascii_case(needle) || f.alias().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| DomainError::UnknownField(s.to_string()))
    }
}

// ============================================================================
// AuditRecord
// ============================================================================

/// One non-conformance finding
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    #[serde(rename = "ID", default, deserialize_with = "wire::lenient_id")]
    id: Option<RecordId>,
    #[serde(
        rename = "SN",
        default,
        deserialize_with = "wire::key_text",
        serialize_with = "wire::key_text_out"
    )]
    serial_number: Option<String>,
    #[serde(
        rename = "Location",
        default,
        deserialize_with = "wire::key_text",
        serialize_with = "wire::key_text_out"
    )]
    location: Option<String>,
    #[serde(rename = "DomainClauses", default, deserialize_with = "wire::lenient_text")]
    domain_clause: Option<String>,
    #[serde(rename = "DateOfAudit", default, deserialize_with = "wire::lenient_date")]
    audit_date: Option<NaiveDate>,
    #[serde(rename = "DateOfSubmission", default, deserialize_with = "wire::lenient_date")]
    report_date: Option<NaiveDate>,
    #[serde(rename = "NCMinI", default, deserialize_with = "wire::lenient_classification")]
    classification: Option<Classification>,
    #[serde(
        rename = "ObservationDescription",
        default,
        deserialize_with = "wire::lenient_text"
    )]
    observation: Option<String>,
    #[serde(rename = "RootCauseAnalysis", default, deserialize_with = "wire::lenient_text")]
    root_cause: Option<String>,
    #[serde(rename = "CorrectiveAction", default, deserialize_with = "wire::lenient_text")]
    corrective_action: Option<String>,
    #[serde(rename = "PreventiveAction", default, deserialize_with = "wire::lenient_text")]
    preventive_action: Option<String>,
    #[serde(rename = "Responsibility", default, deserialize_with = "wire::lenient_text")]
    responsibility: Option<String>,
    #[serde(rename = "ClosingDates", default, deserialize_with = "wire::lenient_date")]
    closing_date: Option<NaiveDate>,
    #[serde(rename = "Status", default, deserialize_with = "wire::lenient_status")]
    status: AuditStatus,
    #[serde(rename = "Evidence", default, deserialize_with = "wire::lenient_text")]
    evidence: Option<String>,
    #[serde(
        rename = "UploadDate",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "wire::lenient_text"
    )]
    upload_date: Option<String>,
}

impl AuditRecord {
    /// Creates an open record with the two fields every import carries
    pub fn new(serial_number: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            serial_number: Some(serial_number.into()),
            location: Some(location.into()),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: RecordId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_domain_clause(mut self, clause: impl Into<String>) -> Self {
        self.domain_clause = Some(clause.into());
        self
    }

    pub fn with_audit_date(mut self, date: NaiveDate) -> Self {
        self.audit_date = Some(date);
        self
    }

    pub fn with_report_date(mut self, date: NaiveDate) -> Self {
        self.report_date = Some(date);
        self
    }

    pub fn with_classification(mut self, classification: Classification) -> Self {
        self.classification = Some(classification);
        self
    }

    pub fn with_observation(mut self, observation: impl Into<String>) -> Self {
        self.observation = Some(observation.into());
        self
    }

    pub fn with_status(mut self, status: AuditStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_upload_date(mut self, upload_date: impl Into<String>) -> Self {
        self.upload_date = Some(upload_date.into());
        self
    }

    // --- Getters ---

    pub fn id(&self) -> Option<RecordId> {
        self.id
    }

    pub fn serial_number(&self) -> Option<&str> {
        self.serial_number.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn domain_clause(&self) -> Option<&str> {
        self.domain_clause.as_deref()
    }

    pub fn audit_date(&self) -> Option<NaiveDate> {
        self.audit_date
    }

    pub fn report_date(&self) -> Option<NaiveDate> {
        self.report_date
    }

    pub fn classification(&self) -> Option<&Classification> {
        self.classification.as_ref()
    }

    pub fn observation(&self) -> Option<&str> {
        self.observation.as_deref()
    }

    pub fn root_cause(&self) -> Option<&str> {
        self.root_cause.as_deref()
    }

    pub fn corrective_action(&self) -> Option<&str> {
        self.corrective_action.as_deref()
    }

    pub fn preventive_action(&self) -> Option<&str> {
        self.preventive_action.as_deref()
    }

    pub fn responsibility(&self) -> Option<&str> {
        self.responsibility.as_deref()
    }

    pub fn closing_date(&self) -> Option<NaiveDate> {
        self.closing_date
    }

    pub fn status(&self) -> AuditStatus {
        self.status
    }

    pub fn evidence(&self) -> Option<&str> {
        self.evidence.as_deref()
    }

    /// Import timestamp as reported by the backend (`YYYY-MM-DD HH:MM:SS`)
    pub fn upload_date(&self) -> Option<&str> {
        self.upload_date.as_deref()
    }

    /// Short label for messages: the id when known, else the serial number
    pub fn label(&self) -> String {
        match (self.id, self.serial_number()) {
            (Some(id), _) => id.to_string(),
            (None, Some(sn)) => format!("SN {sn}"),
            (None, None) => "<unidentified>".to_string(),
        }
    }

    /// String form of one field, `None` when the field is empty
    pub fn field_text(&self, field: RecordField) -> Option<String> {
        match field {
            RecordField::SerialNumber => self.serial_number().map(str::to_string),
            RecordField::Location => self.location().map(str::to_string),
            RecordField::DomainClause => self.domain_clause.clone(),
            RecordField::AuditDate => self.audit_date.map(format_date),
            RecordField::ReportDate => self.report_date.map(format_date),
            RecordField::Classification => self.classification.as_ref().map(|c| c.to_string()),
            RecordField::Observation => self.observation.clone(),
            RecordField::RootCause => self.root_cause.clone(),
            RecordField::CorrectiveAction => self.corrective_action.clone(),
            RecordField::PreventiveAction => self.preventive_action.clone(),
            RecordField::Responsibility => self.responsibility.clone(),
            RecordField::ClosingDate => self.closing_date.map(format_date),
            RecordField::Status => Some(self.status.to_string()),
            RecordField::Evidence => self.evidence.clone(),
        }
    }

    /// True when any field's string form contains `needle`, ignoring case.
    ///
    /// The id and upload date take part too. An empty needle matches everything.
    pub fn matches_search(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        let needle = needle.to_lowercase();
        let contains = |text: &str| text.to_lowercase().contains(&needle);

        self.id.is_some_and(|id| contains(&id.to_string()))
            || self.upload_date.as_deref().is_some_and(contains)
            || RecordField::ALL
                .iter()
                .filter_map(|f| self.field_text(*f))
                .any(|text| contains(&text))
    }

    /// Applies one inline edit on behalf of an actor with `role`.
    ///
    /// Returns whether the record changed. The record is left untouched on error.
    ///
    /// # Errors
    /// - [`DomainError::ImmutableField`] for descriptive fields and evidence
    /// - [`DomainError::InvalidStatus`] / [`DomainError::InvalidDate`] for unparsable values
    /// - [`DomainError::StatusLocked`] when a non-admin tries to reopen a closed record
    pub fn apply_edit(
        &mut self,
        field: RecordField,
        value: &str,
        role: Role,
    ) -> Result<bool, DomainError> {
        if !field.is_mutable() {
            return Err(DomainError::ImmutableField(field.wire_name().to_string()));
        }

        match field {
            RecordField::Status => {
                let next = value.parse::<AuditStatus>()?;
                if self.status == AuditStatus::Closed && next != AuditStatus::Closed && !role.is_admin()
                {
                    return Err(DomainError::StatusLocked(self.label()));
                }
                Ok(replace(&mut self.status, next))
            }
            RecordField::ClosingDate => {
                let next = parse_optional_date(value)?;
                Ok(replace(&mut self.closing_date, next))
            }
            RecordField::RootCause => Ok(replace(&mut self.root_cause, non_empty(value))),
            RecordField::CorrectiveAction => {
                Ok(replace(&mut self.corrective_action, non_empty(value)))
            }
            RecordField::PreventiveAction => {
                Ok(replace(&mut self.preventive_action, non_empty(value)))
            }
            RecordField::Responsibility => Ok(replace(&mut self.responsibility, non_empty(value))),
            _ => Err(DomainError::ImmutableField(field.wire_name().to_string())),
        }
    }

    /// Records an uploaded evidence artifact and closes the finding.
    ///
    /// Both fields change together, so an upload never leaves the finding
    /// open. An admin may still reopen it later; the evidence stays attached.
    pub fn attach_evidence(&mut self, reference: impl Into<String>) {
        self.evidence = Some(reference.into());
        self.status = AuditStatus::Closed;
    }
}

fn replace<T: PartialEq>(slot: &mut T, next: T) -> bool {
    if *slot == next {
        false
    } else {
        *slot = next;
        true
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_optional_date(value: &str) -> Result<Option<NaiveDate>, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map(Some)
        .map_err(|_| DomainError::InvalidDate(value.to_string()))
}

/// Lenient deserializers for backend payloads
mod wire {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    use super::{AuditStatus, Classification, DATE_FORMAT};
    use crate::domain::newtypes::RecordId;

    fn scalar_text(value: Value) -> Option<String> {
        match value {
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(scalar_text(Value::deserialize(deserializer)?))
    }

    /// Keeps `SN` and `Location` verbatim; the backend matches rows on them
    pub fn key_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Some(s),
            other => scalar_text(other),
        })
    }

    /// The backend stores these columns as text, never NULL
    pub fn key_text_out<S>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn lenient_id<'de, D>(deserializer: D) -> Result<Option<RecordId>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let id = match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        Ok(id.map(RecordId::new))
    }

    /// Accepts `YYYY-MM-DD`, optionally followed by a time part
    pub fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(text) = scalar_text(Value::deserialize(deserializer)?) else {
            return Ok(None);
        };
        let head = text.trim().get(..10).unwrap_or(text.trim());
        match NaiveDate::parse_from_str(head, DATE_FORMAT) {
            Ok(date) => Ok(Some(date)),
            Err(_) => {
                tracing::warn!(value = %text, "Ignoring unparsable date in audit record");
                Ok(None)
            }
        }
    }

    pub fn lenient_classification<'de, D>(
        deserializer: D,
    ) -> Result<Option<Classification>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(scalar_text(Value::deserialize(deserializer)?).map(|t| Classification::parse(&t)))
    }

    /// Missing or unknown status reads as Open, as the backend defaults it
    pub fn lenient_status<'de, D>(deserializer: D) -> Result<AuditStatus, D::Error>
    where
        D: Deserializer<'de>,
    {
        let status = scalar_text(Value::deserialize(deserializer)?)
            .and_then(|t| t.parse::<AuditStatus>().ok())
            .unwrap_or_default();
        Ok(status)
    }
}
