//! Login and user administration endpoints
//!
//! - [`login`] - `POST /login`, anonymous, returns `{id, username, role, token}`
//! - [`list_users`] - `GET /users`
//! - [`create_user`] - `POST /users`
//! - [`update_user`] - `PUT /users/{id}`
//! - [`delete_user`] - `DELETE /users/{id}`

use auditdesk_core::{
    domain::{Session, UserAccount, UserDraft, UserId, UserUpdate},
    ports::Credentials,
};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{client::ApiClient, ApiError};

/// Exchanges credentials for a session
pub async fn login(client: &ApiClient, credentials: &Credentials) -> Result<Session, ApiError> {
    debug!(user = %credentials.username, "Logging in");

    let session: Session = client
        .send_json(client.request(Method::POST, "/login", None).json(credentials))
        .await?;

    info!(user = session.username(), role = %session.role(), "Backend issued a session");
    Ok(session)
}

/// Fetches every user account
///
/// A body that is not an array yields an empty list; rows that do not
/// decode as accounts are skipped.
pub async fn list_users(client: &ApiClient, session: &Session) -> Result<Vec<UserAccount>, ApiError> {
    let body: Value = client
        .send_json(client.request(Method::GET, "/users", Some(session)))
        .await?;

    let Value::Array(rows) = body else {
        warn!("Unexpected user listing payload");
        return Ok(Vec::new());
    };

    let users = rows
        .into_iter()
        .filter_map(|row| match serde_json::from_value::<UserAccount>(row) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Skipping malformed user row");
                None
            }
        })
        .collect::<Vec<_>>();

    debug!(count = users.len(), "Fetched user accounts");
    Ok(users)
}

pub async fn create_user(client: &ApiClient, session: &Session, draft: &UserDraft) -> Result<(), ApiError> {
    debug!(user = %draft.username, "Creating user");
    client
        .send_ack(client.request(Method::POST, "/users", Some(session)).json(draft))
        .await
}

pub async fn update_user(
    client: &ApiClient,
    session: &Session,
    id: UserId,
    update: &UserUpdate,
) -> Result<(), ApiError> {
    debug!(%id, "Updating user");
    client
        .send_ack(
            client
                .request(Method::PUT, &format!("/users/{id}"), Some(session))
                .json(update),
        )
        .await
}

pub async fn delete_user(client: &ApiClient, session: &Session, id: UserId) -> Result<(), ApiError> {
    debug!(%id, "Deleting user");
    client
        .send_ack(client.request(Method::DELETE, &format!("/users/{id}"), Some(session)))
        .await
}
