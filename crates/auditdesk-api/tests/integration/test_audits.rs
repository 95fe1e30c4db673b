//! Integration tests for the `/audits` endpoints

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use auditdesk_core::domain::{AuditCategory, AuditRecord, AuditStatus, FileUpload, RecordId};
use auditdesk_core::ports::IAuditService;

use crate::common;

#[tokio::test]
async fn test_list_audits_sends_bearer_and_category() {
    let (server, backend) = common::setup_backend().await;
    Mock::given(method("GET"))
        .and(path("/audits"))
        .and(query_param("type", "internal"))
        .and(header("authorization", format!("Bearer {}", common::TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::internal_rows()))
        .expect(1)
        .mount(&server)
        .await;

    let listing = backend
        .list_audits(&common::admin_session(), AuditCategory::Internal)
        .await
        .expect("list_audits failed");

    assert_eq!(listing.records.len(), 3);
    let second = &listing.records[1];
    assert_eq!(second.id(), Some(RecordId::new(2)));
    assert_eq!(second.location(), Some("Plant A"));
    // Empty date strings are coerced to absent
    assert!(second.audit_date().is_none());
    assert_eq!(listing.records[2].status(), AuditStatus::Closed);
}

#[tokio::test]
async fn test_list_audits_accepts_envelope() {
    let (server, backend) = common::setup_backend().await;
    common::mount_listing(
        &server,
        "external",
        json!({ "data": [{ "ID": 10, "SN": "10", "Location": "Site X" }], "lastUploadDate": "2024-06-01 12:00:00" }),
    )
    .await;

    let listing = backend
        .list_audits(&common::admin_session(), AuditCategory::External)
        .await
        .unwrap();

    assert_eq!(listing.records.len(), 1);
    assert_eq!(listing.last_upload_date.as_deref(), Some("2024-06-01 12:00:00"));
}

#[tokio::test]
async fn test_list_audits_unexpected_shape_is_empty() {
    let (server, backend) = common::setup_backend().await;
    common::mount_listing(&server, "internal", json!({ "rows": 3 })).await;

    let listing = backend
        .list_audits(&common::admin_session(), AuditCategory::Internal)
        .await
        .unwrap();
    assert!(listing.records.is_empty());
}

#[tokio::test]
async fn test_server_error_message_is_surfaced() {
    let (server, backend) = common::setup_backend().await;
    common::mount_error(&server, "GET", "/audits", 500, "Database unavailable").await;

    let err = backend
        .list_audits(&common::admin_session(), AuditCategory::Internal)
        .await
        .unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("GET /audits failed"), "{message}");
    assert!(message.contains("Database unavailable"), "{message}");
}

#[tokio::test]
async fn test_error_without_body_names_status() {
    let (server, backend) = common::setup_backend().await;
    Mock::given(method("GET"))
        .and(path("/audits"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = backend
        .list_audits(&common::admin_session(), AuditCategory::Internal)
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("503"));
}

#[tokio::test]
async fn test_last_upload_date() {
    let (server, backend) = common::setup_backend().await;
    Mock::given(method("GET"))
        .and(path("/audits/last-upload"))
        .and(query_param("type", "internal"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "lastUploadDate": "2024-05-10 08:00:00" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/audits/last-upload"))
        .and(query_param("type", "external"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "lastUploadDate": null })))
        .mount(&server)
        .await;

    let session = common::admin_session();
    assert_eq!(
        backend
            .last_upload_date(&session, AuditCategory::Internal)
            .await
            .unwrap()
            .as_deref(),
        Some("2024-05-10 08:00:00")
    );
    assert!(backend
        .last_upload_date(&session, AuditCategory::External)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_update_record_posts_type_and_full_record() {
    let (server, backend) = common::setup_backend().await;
    Mock::given(method("POST"))
        .and(path("/audits/update"))
        .and(body_partial_json(json!({
            "type": "internal",
            "record": { "ID": 2, "Location": "Plant A", "Status": "Open" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let record = AuditRecord::new("2", "Plant A").with_id(RecordId::new(2));
    backend
        .update_record(&common::admin_session(), AuditCategory::Internal, &record)
        .await
        .expect("update failed");
}

#[tokio::test]
async fn test_import_spreadsheet_is_multipart() {
    let (server, backend) = common::setup_backend().await;
    Mock::given(method("POST"))
        .and(path("/audits/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true, "count": 12, "message": "Successfully uploaded 12 records"
        })))
        .mount(&server)
        .await;

    let file = FileUpload::new("findings.csv", b"SN,Location\n1,Plant A\n".to_vec());
    let summary = backend
        .import_spreadsheet(&common::admin_session(), AuditCategory::External, &file)
        .await
        .unwrap();
    assert!(summary.success);
    assert_eq!(summary.count, Some(12));

    let bodies = common::received_bodies(&server, "POST", "/audits/upload").await;
    let body = String::from_utf8_lossy(&bodies[0]);
    assert!(body.contains(r#"name="file"; filename="findings.csv""#), "{body}");
    assert!(body.contains(r#"name="type""#));
    assert!(body.contains("external"));
    assert!(body.contains("1,Plant A"));
}

#[tokio::test]
async fn test_upload_evidence_returns_stored_name() {
    let (server, backend) = common::setup_backend().await;
    Mock::given(method("POST"))
        .and(path("/audits/upload-evidence"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true, "filename": "evidence_2_deadbeef.pdf"
        })))
        .mount(&server)
        .await;

    let file = FileUpload::new("proof.pdf", b"%PDF-1.4".to_vec());
    let receipt = backend
        .upload_evidence(&common::admin_session(), AuditCategory::Internal, RecordId::new(2), &file)
        .await
        .unwrap();
    assert_eq!(receipt.filename, "evidence_2_deadbeef.pdf");

    let bodies = common::received_bodies(&server, "POST", "/audits/upload-evidence").await;
    let body = String::from_utf8_lossy(&bodies[0]);
    assert!(body.contains(r#"name="record_id""#));
    assert!(body.contains(r#"name="audit_type""#));
    assert!(body.contains("internal"));
}

#[tokio::test]
async fn test_upload_evidence_rejects_garbage_body() {
    let (server, backend) = common::setup_backend().await;
    Mock::given(method("POST"))
        .and(path("/audits/upload-evidence"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let file = FileUpload::new("proof.png", vec![0x89, 0x50]);
    let err = backend
        .upload_evidence(&common::admin_session(), AuditCategory::Internal, RecordId::new(2), &file)
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("Invalid response"));
}

#[tokio::test]
async fn test_unauthorized_is_reported() {
    let (server, backend) = common::setup_backend().await;
    common::mount_error(&server, "POST", "/audits/update", 401, "Invalid token").await;

    let record = AuditRecord::new("1", "Plant B").with_id(RecordId::new(1));
    let err = backend
        .update_record(&common::user_session(), AuditCategory::Internal, &record)
        .await
        .unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("Unauthorized: Invalid token"), "{message}");
}
