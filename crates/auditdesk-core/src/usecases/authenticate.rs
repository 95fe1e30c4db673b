//! Authentication use case
//!
//! Exchanges credentials for a [`Session`] through the user directory and
//! keeps it in the session store, so later commands can pick it up.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use super::request::RequestPolicy;
use crate::{
    domain::Session,
    ports::{Credentials, ISessionStore, IUserDirectory},
};

pub struct AuthenticateUseCase {
    directory: Arc<dyn IUserDirectory + Send + Sync>,
    sessions: Arc<dyn ISessionStore + Send + Sync>,
    policy: RequestPolicy,
}

impl AuthenticateUseCase {
    pub fn new(
        directory: Arc<dyn IUserDirectory + Send + Sync>,
        sessions: Arc<dyn ISessionStore + Send + Sync>,
        policy: RequestPolicy,
    ) -> Self {
        Self {
            directory,
            sessions,
            policy,
        }
    }

    /// Logs in and persists the resulting session
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Username or password is empty
    /// - The backend rejects the credentials or cannot be reached
    /// - The backend issues an empty token
    /// - The session cannot be stored
    pub async fn login(&self, credentials: &Credentials) -> Result<Session> {
        if credentials.username.trim().is_empty() || credentials.password.is_empty() {
            anyhow::bail!("Username and password are required");
        }

        let session = self
            .policy
            .run("log in", self.directory.login(credentials))
            .await?;

        if session.token().is_empty() {
            anyhow::bail!("Login response did not include a token");
        }

        self.sessions
            .save(&session)
            .context("Failed to store session")?;

        info!(user = session.username(), role = %session.role(), "Logged in");
        Ok(session)
    }

    /// Forgets the stored session. Returns whether one was stored.
    pub fn logout(&self) -> Result<bool> {
        let had_session = self
            .sessions
            .load()
            .context("Failed to read stored session")?
            .is_some();
        self.sessions.clear().context("Failed to clear session")?;
        if had_session {
            info!("Logged out");
        }
        Ok(had_session)
    }

    /// The stored session, if any
    pub fn current(&self) -> Result<Option<Session>> {
        self.sessions.load().context("Failed to read stored session")
    }

    /// The stored session, or an error telling the operator to log in
    pub fn require(&self) -> Result<Session> {
        self.current()?
            .context("Not logged in. Run 'auditdesk auth login' first")
    }
}
