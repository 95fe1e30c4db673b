//! Integration tests for login and the `/users` endpoints

use std::sync::Arc;

use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use auditdesk_core::domain::{Role, UserDraft, UserId, UserUpdate};
use auditdesk_core::ports::{Credentials, IUserDirectory};
use auditdesk_core::usecases::{RequestPolicy, UserAccountAdmin};

use crate::common;

fn user_rows() -> Value {
    json!([
        { "id": 1, "CompanyName": "Acme Corp", "PlantName": "Plant A", "Username": "admin",
          "GenId": "G-001", "Email": "admin@acme.example.com", "Department": "QA", "Role": "admin" },
        { "id": 2, "CompanyName": "Acme Corp", "PlantName": "Plant B", "Username": "jdoe",
          "GenId": null, "Email": "jdoe@acme.example.com", "Department": "Ops", "Role": "user" }
    ])
}

#[tokio::test]
async fn test_login_returns_session() {
    let (server, backend) = common::setup_backend().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(json!({ "username": "admin", "password": "secret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "username": "admin", "role": "admin", "token": "0f8e-issued"
        })))
        .mount(&server)
        .await;

    let session = backend
        .login(&Credentials::new("admin", "secret"))
        .await
        .expect("login failed");
    assert_eq!(session.user_id(), UserId::new(1));
    assert_eq!(session.role(), Role::Admin);
    assert_eq!(session.token().expose(), "0f8e-issued");

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_login_rejected() {
    let (server, backend) = common::setup_backend().await;
    common::mount_error(&server, "POST", "/login", 401, "Invalid credentials").await;

    let err = backend
        .login(&Credentials::new("admin", "wrong"))
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("Invalid credentials"));
}

#[tokio::test]
async fn test_list_users() {
    let (server, backend) = common::setup_backend().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_rows()))
        .mount(&server)
        .await;

    let users = backend.list_users(&common::admin_session()).await.unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[1].username, "jdoe");
    assert_eq!(users[1].role, Role::User);
    assert!(users[1].gen_id.is_none());
}

#[tokio::test]
async fn test_update_user_uses_put_with_id() {
    let (server, backend) = common::setup_backend().await;
    Mock::given(method("PUT"))
        .and(path("/users/2"))
        .and(body_json(json!({ "department": "Audit" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "User updated" })))
        .expect(1)
        .mount(&server)
        .await;

    let update = UserUpdate {
        department: Some("Audit".to_string()),
        ..UserUpdate::default()
    };
    backend
        .update_user(&common::admin_session(), UserId::new(2), &update)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_missing_user() {
    let (server, backend) = common::setup_backend().await;
    common::mount_error(&server, "DELETE", "/users/99", 404, "User not found").await;

    let err = backend
        .delete_user(&common::admin_session(), UserId::new(99))
        .await
        .unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("DELETE /users/99 failed"), "{message}");
    assert!(message.contains("Not found: User not found"), "{message}");
}

#[tokio::test]
async fn test_admin_create_sends_camel_case_and_refreshes() {
    let (server, backend) = common::setup_backend().await;
    Mock::given(method("POST"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "message": "User created" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_rows()))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = Arc::new(common::RecordingNotifier::default());
    let mut admin = UserAccountAdmin::new(backend, notifier, RequestPolicy::default());
    let draft = UserDraft {
        company_name: "Initech".to_string(),
        plant_name: String::new(),
        username: "pgibbons".to_string(),
        gen_id: String::new(),
        password: "tps-report".to_string(),
        email: "peter@initech.example.com".to_string(),
        department: "Software".to_string(),
        role: Role::Manager,
    };
    admin.create(&common::admin_session(), draft).await.unwrap();
    assert_eq!(admin.users().len(), 2);

    let bodies = common::received_bodies(&server, "POST", "/users").await;
    let sent: Value = serde_json::from_slice(&bodies[0]).unwrap();
    assert_eq!(sent["companyName"], "Initech");
    assert_eq!(sent["username"], "pgibbons");
    assert_eq!(sent["role"], "manager");
}

#[tokio::test]
async fn test_blank_password_update_never_reaches_wire() {
    let (server, backend) = common::setup_backend().await;
    Mock::given(method("PUT"))
        .and(path("/users/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_rows()))
        .mount(&server)
        .await;

    let notifier = Arc::new(common::RecordingNotifier::default());
    let mut admin = UserAccountAdmin::new(backend, notifier, RequestPolicy::default());
    let update = UserUpdate {
        email: Some("john.doe@acme.example.com".to_string()),
        password: Some("  ".to_string()),
        ..UserUpdate::default()
    };
    admin
        .update(&common::admin_session(), UserId::new(2), update)
        .await
        .unwrap();

    let bodies = common::received_bodies(&server, "PUT", "/users/2").await;
    let sent: Value = serde_json::from_slice(&bodies[0]).unwrap();
    assert!(sent.get("password").is_none(), "{sent}");
    assert_eq!(sent["email"], "john.doe@acme.example.com");
}

#[tokio::test]
async fn test_non_admin_never_calls_backend() {
    let (server, backend) = common::setup_backend().await;
    let notifier = Arc::new(common::RecordingNotifier::default());
    let mut admin = UserAccountAdmin::new(backend, notifier, RequestPolicy::default());

    assert!(admin.list(&common::user_session()).await.is_err());
    assert!(server.received_requests().await.unwrap().is_empty());
}
