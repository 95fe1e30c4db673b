//! End-to-end tests: `AuditRecordStore` driving the HTTP adapter

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auditdesk_api::provider::HttpAuditBackend;
use auditdesk_core::domain::{
    AuditCategory, AuditStatus, FileUpload, LocationFilter, RecordId,
};
use auditdesk_core::ports::NotificationLevel;
use auditdesk_core::usecases::{AuditRecordStore, EditOutcome, RequestPolicy, StoreError};

use crate::common::{self, RecordingNotifier};

fn store(backend: Arc<HttpAuditBackend>, policy: RequestPolicy) -> (AuditRecordStore, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let store = AuditRecordStore::new(backend, notifier.clone(), policy, AuditCategory::Internal);
    (store, notifier)
}

async fn mount_update_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/audits/update"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_load_then_filter_by_location() {
    let (server, backend) = common::setup_backend().await;
    common::mount_listing(&server, "internal", common::internal_rows()).await;
    let (mut store, _) = store(backend, RequestPolicy::default());

    let report = store
        .load(&common::admin_session(), AuditCategory::Internal)
        .await
        .unwrap();
    assert_eq!(report.records, 3);
    assert_eq!(store.locations(), ["Plant B", "Plant A", "Plant C"]);

    let ids: Vec<_> = store
        .apply_filter("", LocationFilter::Only("Plant A".to_string()))
        .iter()
        .filter_map(|r| r.id())
        .collect();
    assert_eq!(ids, vec![RecordId::new(2)]);

    // Search narrows within the location, case-insensitively
    assert!(store
        .apply_filter("CALIBRATION", LocationFilter::Only("Plant A".to_string()))
        .is_empty());
    assert_eq!(store.apply_filter("calibration", LocationFilter::All).len(), 1);
}

#[tokio::test]
async fn test_import_ok_but_reload_fails_leaves_store_empty_with_error() {
    let (server, backend) = common::setup_backend().await;
    Mock::given(method("POST"))
        .and(path("/audits/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true, "count": 3, "message": "Successfully uploaded 3 records"
        })))
        .expect(1)
        .mount(&server)
        .await;
    common::mount_error(&server, "GET", "/audits", 500, "Database unavailable").await;

    let (mut store, notifier) = store(backend, RequestPolicy::default());
    let err = store
        .import_file(
            &common::admin_session(),
            FileUpload::new("findings.xlsx", vec![0x50, 0x4b, 0x03, 0x04]),
            AuditCategory::Internal,
        )
        .await
        .unwrap_err();

    assert_eq!(err.operation(), Some("load audits"));
    assert!(store.records().is_empty());
    assert!(store.error().is_some_and(|e| e.contains("Database unavailable")));
    // Import success is still reported before the reload failure
    assert_eq!(notifier.count(NotificationLevel::Success), 1);
    assert_eq!(notifier.count(NotificationLevel::Error), 1);
}

#[tokio::test]
async fn test_import_rejects_unsupported_file_before_network() {
    let (server, backend) = common::setup_backend().await;
    let (mut store, _) = store(backend, RequestPolicy::default());

    let err = store
        .import_file(
            &common::admin_session(),
            FileUpload::new("findings.txt", b"nope".to_vec()),
            AuditCategory::Internal,
        )
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_edit_is_sent_as_full_record() {
    let (server, backend) = common::setup_backend().await;
    common::mount_listing(&server, "internal", common::internal_rows()).await;
    mount_update_ok(&server).await;
    let (mut store, _) = store(backend, RequestPolicy::default());
    let session = common::user_session();
    store.load(&session, AuditCategory::Internal).await.unwrap();

    let outcome = store
        .update_field(&session, RecordId::new(2), "corrective_action", "Refresh supplier list monthly")
        .await
        .unwrap();
    assert!(matches!(outcome, EditOutcome::Confirmed(_)));

    // Same value again: nothing is sent
    let again = store
        .update_field(&session, RecordId::new(2), "CorrectiveAction", "Refresh supplier list monthly")
        .await
        .unwrap();
    assert_eq!(again, EditOutcome::Unchanged);

    let bodies = common::received_bodies(&server, "POST", "/audits/update").await;
    assert_eq!(bodies.len(), 1);
    let sent: Value = serde_json::from_slice(&bodies[0]).unwrap();
    assert_eq!(sent["type"], "internal");
    assert_eq!(sent["record"]["ID"], 2);
    assert_eq!(sent["record"]["CorrectiveAction"], "Refresh supplier list monthly");
    assert_eq!(sent["record"]["ObservationDescription"], "Supplier list outdated");
}

#[tokio::test]
async fn test_failed_save_is_kept_and_reconciled() {
    let (server, backend) = common::setup_backend().await;
    common::mount_listing(&server, "internal", common::internal_rows()).await;
    // First save fails, later ones succeed
    Mock::given(method("POST"))
        .and(path("/audits/update"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "Deadlock detected" })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_update_ok(&server).await;

    let (mut store, notifier) = store(backend, RequestPolicy::default());
    let session = common::admin_session();
    store.load(&session, AuditCategory::Internal).await.unwrap();

    let outcome = store
        .update_field(&session, RecordId::new(1), "root_cause", "Missed PM schedule")
        .await
        .unwrap();
    let EditOutcome::Unconfirmed { error, .. } = outcome else {
        panic!("expected unconfirmed edit, got {outcome:?}");
    };
    assert!(error.to_string().contains("Deadlock detected"));
    assert_eq!(
        store.record(RecordId::new(1)).unwrap().root_cause(),
        Some("Missed PM schedule")
    );
    assert_eq!(store.unresolved().len(), 1);
    assert_eq!(notifier.count(NotificationLevel::Error), 1);

    let report = store.reconcile(&session).await;
    assert_eq!(report.confirmed.len(), 1);
    assert!(store.unresolved().is_empty());
}

#[tokio::test]
async fn test_evidence_upload_closes_record() {
    let (server, backend) = common::setup_backend().await;
    common::mount_listing(&server, "internal", common::internal_rows()).await;
    Mock::given(method("POST"))
        .and(path("/audits/upload-evidence"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true, "filename": "evidence_1_c0ffee00.pdf"
        })))
        .mount(&server)
        .await;
    mount_update_ok(&server).await;

    let (mut store, _) = store(backend, RequestPolicy::default());
    let session = common::user_session();
    store.load(&session, AuditCategory::Internal).await.unwrap();

    let outcome = store
        .attach_evidence(
            &session,
            RecordId::new(1),
            Some(FileUpload::new("calibration.PDF", b"%PDF-1.7".to_vec())),
        )
        .await
        .unwrap();
    assert!(outcome.is_confirmed());

    let record = store.record(RecordId::new(1)).unwrap();
    assert_eq!(record.evidence(), Some("evidence_1_c0ffee00.pdf"));
    assert_eq!(record.status(), AuditStatus::Closed);
    assert!(store.pending_evidence(RecordId::new(1)).is_none());

    let bodies = common::received_bodies(&server, "POST", "/audits/update").await;
    let sent: Value = serde_json::from_slice(&bodies[0]).unwrap();
    assert_eq!(sent["record"]["Status"], "Closed");
    assert_eq!(sent["record"]["Evidence"], "evidence_1_c0ffee00.pdf");
}

#[tokio::test]
async fn test_failed_evidence_upload_keeps_record_open() {
    let (server, backend) = common::setup_backend().await;
    common::mount_listing(&server, "internal", common::internal_rows()).await;
    common::mount_error(&server, "POST", "/audits/upload-evidence", 400, "Invalid file type").await;

    let (mut store, _) = store(backend, RequestPolicy::default());
    let session = common::user_session();
    store.load(&session, AuditCategory::Internal).await.unwrap();

    let err = store
        .attach_evidence(
            &session,
            RecordId::new(1),
            Some(FileUpload::new("proof.png", vec![0x89, 0x50, 0x4e, 0x47])),
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Invalid file type"));

    let record = store.record(RecordId::new(1)).unwrap();
    assert_eq!(record.status(), AuditStatus::Open);
    assert!(record.evidence().is_none());
    // The staged file survives for another attempt
    assert!(store.pending_evidence(RecordId::new(1)).is_some());
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let (server, backend) = common::setup_backend().await;
    Mock::given(method("GET"))
        .and(path("/audits"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::internal_rows())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let (mut store, _) = store(backend, RequestPolicy::new(Duration::from_millis(200)));
    let err = store
        .load(&common::admin_session(), AuditCategory::Internal)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::TimedOut { operation: "load audits", .. }));
    assert!(store.records().is_empty());
    assert!(store.error().is_some());
}

#[tokio::test]
async fn test_cancelled_policy_sends_nothing() {
    let (server, backend) = common::setup_backend().await;
    common::mount_listing(&server, "internal", common::internal_rows()).await;

    let policy = RequestPolicy::default();
    policy.cancel();
    let (mut store, _) = store(backend, policy);

    let err = store
        .load(&common::admin_session(), AuditCategory::Internal)
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::Cancelled { operation: "load audits" });
    assert!(server.received_requests().await.unwrap().is_empty());
}
