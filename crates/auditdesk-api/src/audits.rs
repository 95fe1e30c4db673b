//! Audit endpoints of the backend
//!
//! Provides functions for the `/audits` resource:
//! - [`list_audits`] - `GET /audits?type=` (array or `{data, lastUploadDate}`)
//! - [`last_upload_date`] - `GET /audits/last-upload?type=`
//! - [`update_record`] - `POST /audits/update`
//! - [`import_spreadsheet`] - `POST /audits/upload` (multipart)
//! - [`upload_evidence`] - `POST /audits/upload-evidence` (multipart)
//!
//! Listings are decoded leniently: a body that is neither an array nor a
//! `{data: [...]}` envelope yields an empty listing, and individual rows
//! that are not objects are skipped. Both cases are logged at `warn`.

use auditdesk_core::{
    domain::{AuditCategory, AuditRecord, FileUpload, RecordId, Session},
    ports::{AuditListing, EvidenceReceipt, ImportSummary},
};
use reqwest::{
    multipart::{Form, Part},
    Method,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{client::ApiClient, ApiError};

/// Body of `POST /audits/update`
#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    #[serde(rename = "type")]
    category: AuditCategory,
    record: &'a AuditRecord,
}

/// Fetches every record of `category`
pub async fn list_audits(
    client: &ApiClient,
    session: &Session,
    category: AuditCategory,
) -> Result<AuditListing, ApiError> {
    debug!(%category, "Listing audits");

    let body: Value = client
        .send_json(
            client
                .request(Method::GET, "/audits", Some(session))
                .query(&[("type", category.as_str())]),
        )
        .await?;

    let listing = decode_listing(body);
    info!(%category, count = listing.records.len(), "Fetched audit listing");
    Ok(listing)
}

/// Timestamp of the latest import into `category`
pub async fn last_upload_date(
    client: &ApiClient,
    session: &Session,
    category: AuditCategory,
) -> Result<Option<String>, ApiError> {
    let body: Value = client
        .send_json(
            client
                .request(Method::GET, "/audits/last-upload", Some(session))
                .query(&[("type", category.as_str())]),
        )
        .await?;

    Ok(body.get("lastUploadDate").and_then(text_value))
}

/// Persists the full state of one record
pub async fn update_record(
    client: &ApiClient,
    session: &Session,
    category: AuditCategory,
    record: &AuditRecord,
) -> Result<(), ApiError> {
    debug!(%category, id = ?record.id(), "Updating audit record");

    client
        .send_ack(
            client
                .request(Method::POST, "/audits/update", Some(session))
                .json(&UpdateRequest { category, record }),
        )
        .await
}

/// Uploads a spreadsheet for bulk ingestion into `category`
pub async fn import_spreadsheet(
    client: &ApiClient,
    session: &Session,
    category: AuditCategory,
    file: &FileUpload,
) -> Result<ImportSummary, ApiError> {
    info!(%category, file = file.file_name(), bytes = file.len(), "Uploading spreadsheet");

    let form = Form::new()
        .part("file", file_part(file))
        .text("type", category.as_str());

    client
        .send_json(
            client
                .request(Method::POST, "/audits/upload", Some(session))
                .multipart(form),
        )
        .await
}

/// Uploads an evidence artifact for one record
///
/// The backend stores the file, writes its reference into the record and
/// closes it; the returned receipt names the stored file.
pub async fn upload_evidence(
    client: &ApiClient,
    session: &Session,
    category: AuditCategory,
    record_id: RecordId,
    file: &FileUpload,
) -> Result<EvidenceReceipt, ApiError> {
    info!(%category, %record_id, file = file.file_name(), "Uploading evidence");

    let form = Form::new()
        .part("file", file_part(file))
        .text("record_id", record_id.to_string())
        .text("audit_type", category.as_str());

    client
        .send_json(
            client
                .request(Method::POST, "/audits/upload-evidence", Some(session))
                .multipart(form),
        )
        .await
}

fn file_part(file: &FileUpload) -> Part {
    Part::bytes(file.bytes().to_vec()).file_name(file.file_name().to_string())
}

/// Decodes a listing body, coercing unexpected shapes to an empty listing
pub(crate) fn decode_listing(body: Value) -> AuditListing {
    let (rows, last_upload_date) = match body {
        Value::Array(rows) => (rows, None),
        Value::Object(mut envelope) => {
            let last = envelope.get("lastUploadDate").and_then(text_value);
            match envelope.remove("data") {
                Some(Value::Array(rows)) => (rows, last),
                other => {
                    warn!(data = ?other.map(|v| kind(&v)), "Audit listing envelope has no data array");
                    (Vec::new(), last)
                }
            }
        }
        other => {
            warn!(kind = kind(&other), "Unexpected audit listing payload");
            (Vec::new(), None)
        }
    };

    let total = rows.len();
    let records: Vec<AuditRecord> = rows
        .into_iter()
        .filter_map(|row| match serde_json::from_value::<AuditRecord>(row) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "Skipping malformed audit row");
                None
            }
        })
        .collect();
    if records.len() != total {
        warn!(skipped = total - records.len(), "Some audit rows were dropped");
    }

    AuditListing {
        records,
        last_upload_date,
    }
}

fn text_value(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
