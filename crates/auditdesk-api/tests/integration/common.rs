//! Shared test helpers for backend integration tests
//!
//! Provides a wiremock server standing in for the REST backend plus the
//! small port fakes the use cases need alongside the real HTTP adapter.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auditdesk_api::client::ApiClient;
use auditdesk_api::provider::HttpAuditBackend;
use auditdesk_core::domain::{AccessToken, Role, Session, UserId};
use auditdesk_core::ports::{INotificationService, Notification, NotificationLevel};

pub const TOKEN: &str = "test-access-token";

/// Starts a mock server and returns a backend pointing at it
pub async fn setup_backend() -> (MockServer, Arc<HttpAuditBackend>) {
    let server = MockServer::start().await;
    let backend = Arc::new(HttpAuditBackend::new(ApiClient::with_base_url(
        server.uri(),
    )));
    (server, backend)
}

pub fn admin_session() -> Session {
    Session::new(UserId::new(1), "admin", Role::Admin, AccessToken::new(TOKEN))
}

pub fn user_session() -> Session {
    Session::new(UserId::new(2), "operator", Role::User, AccessToken::new(TOKEN))
}

/// Three internal findings, one of them at `Plant A`
pub fn internal_rows() -> Value {
    json!([
        {
            "ID": 1, "SN": "1", "Location": "Plant B", "DomainClauses": "7.1",
            "DateOfAudit": "2024-05-02", "NCMinI": "NC",
            "ObservationDescription": "Calibration overdue", "Status": "Open",
            "Evidence": null, "UploadDate": "2024-05-10 08:00:00"
        },
        {
            "ID": 2, "SN": "2", "Location": "Plant A", "DomainClauses": "8.4",
            "DateOfAudit": "", "NCMinI": "MiN",
            "ObservationDescription": "Supplier list outdated", "Status": "Open",
            "UploadDate": "2024-05-10 08:00:00"
        },
        {
            "ID": 3, "SN": "3", "Location": "Plant C", "DomainClauses": "9.2",
            "DateOfAudit": "2024-04-20", "NCMinI": "I",
            "ObservationDescription": "Internal audit plan missing", "Status": "Closed",
            "Evidence": "evidence_3_ab12cd34.pdf", "UploadDate": "2024-05-10 08:00:00"
        }
    ])
}

/// Mounts `GET /audits?type={category}` answering with `body`
pub async fn mount_listing(server: &MockServer, category: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path("/audits"))
        .and(query_param("type", category))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mounts a JSON error response for any request to `method_name path_str`
pub async fn mount_error(server: &MockServer, method_name: &str, path_str: &str, status: u16, message: &str) {
    Mock::given(method(method_name))
        .and(path(path_str))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "error": message })))
        .mount(server)
        .await;
}

/// Body of every request the server received for `method_name path_str`
pub async fn received_bodies(server: &MockServer, method_name: &str, path_str: &str) -> Vec<Vec<u8>> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() == method_name && r.url.path() == path_str)
        .map(|r| r.body)
        .collect()
}

/// Notification sink that keeps what it was given
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self, level: NotificationLevel) -> usize {
        self.sent().iter().filter(|n| n.level == level).count()
    }
}

#[async_trait]
impl INotificationService for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}
