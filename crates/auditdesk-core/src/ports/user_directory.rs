//! User directory port (driven/secondary port)
//!
//! Login plus CRUD over user accounts. Admin gating happens in the use
//! case from the session role; the backend enforces it again on its side.

use std::fmt;

use serde::Serialize;

use crate::domain::{Session, UserAccount, UserDraft, UserId, UserUpdate};

/// Username and password for the login endpoint
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Port trait for authentication and user administration
#[async_trait::async_trait]
pub trait IUserDirectory: Send + Sync {
    /// Exchanges credentials for a session
    async fn login(&self, credentials: &Credentials) -> anyhow::Result<Session>;

    async fn list_users(&self, session: &Session) -> anyhow::Result<Vec<UserAccount>>;

    async fn create_user(&self, session: &Session, draft: &UserDraft) -> anyhow::Result<()>;

    /// Applies a partial update; absent fields are left unchanged
    async fn update_user(
        &self,
        session: &Session,
        id: UserId,
        update: &UserUpdate,
    ) -> anyhow::Result<()>;

    async fn delete_user(&self, session: &Session, id: UserId) -> anyhow::Result<()>;
}
