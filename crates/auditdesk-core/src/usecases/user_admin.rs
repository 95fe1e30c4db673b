//! User account administration use case
//!
//! CRUD and search over user accounts. Every remote operation requires an
//! admin session; the role is read from the session context and not
//! re-verified against the backend. Writes refresh the cached list on
//! success; a failed refresh is reported but does not undo the write.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use super::{error::StoreError, request::RequestPolicy};
use crate::{
    domain::{Session, UserAccount, UserDraft, UserId, UserUpdate},
    ports::{INotificationService, IUserDirectory, Notification},
};

pub struct UserAccountAdmin {
    directory: Arc<dyn IUserDirectory + Send + Sync>,
    notifier: Arc<dyn INotificationService + Send + Sync>,
    policy: RequestPolicy,
    users: Vec<UserAccount>,
    error: Option<String>,
}

impl UserAccountAdmin {
    pub fn new(
        directory: Arc<dyn IUserDirectory + Send + Sync>,
        notifier: Arc<dyn INotificationService + Send + Sync>,
        policy: RequestPolicy,
    ) -> Self {
        Self {
            directory,
            notifier,
            policy,
            users: Vec::new(),
            error: None,
        }
    }

    pub fn users(&self) -> &[UserAccount] {
        &self.users
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn ensure_admin(session: &Session, action: &'static str) -> Result<(), StoreError> {
        if session.is_admin() {
            Ok(())
        } else {
            warn!(user = session.username(), role = %session.role(), action, "Admin action refused");
            Err(StoreError::Forbidden(action))
        }
    }

    /// Fetches every account, replacing the cached list
    pub async fn list(&mut self, session: &Session) -> Result<&[UserAccount], StoreError> {
        Self::ensure_admin(session, "list users")?;

        let result = self
            .policy
            .run("list users", self.directory.list_users(session))
            .await;
        match result {
            Ok(users) => {
                info!(count = users.len(), "Loaded user accounts");
                self.users = users;
                self.error = None;
                Ok(&self.users)
            }
            Err(e) => {
                self.users.clear();
                self.error = Some(e.to_string());
                self.report(Notification::error("Failed to load users", e.to_string()))
                    .await;
                Err(e)
            }
        }
    }

    pub async fn create(&mut self, session: &Session, draft: UserDraft) -> Result<(), StoreError> {
        Self::ensure_admin(session, "create users")?;
        draft.validate()?;

        let result = self
            .policy
            .run("create user", self.directory.create_user(session, &draft))
            .await;
        self.finish_write(session, result, format!("User {} created", draft.username))
            .await
    }

    /// Applies a partial update; a blank password leaves the stored one unchanged
    pub async fn update(
        &mut self,
        session: &Session,
        id: UserId,
        update: UserUpdate,
    ) -> Result<(), StoreError> {
        Self::ensure_admin(session, "update users")?;
        let update = update.without_blank_password();
        update.validate()?;

        let result = self
            .policy
            .run("update user", self.directory.update_user(session, id, &update))
            .await;
        self.finish_write(session, result, format!("User {id} updated"))
            .await
    }

    pub async fn delete(&mut self, session: &Session, id: UserId) -> Result<(), StoreError> {
        Self::ensure_admin(session, "delete users")?;

        let result = self
            .policy
            .run("delete user", self.directory.delete_user(session, id))
            .await;
        self.finish_write(session, result, format!("User {id} deleted"))
            .await
    }

    /// Reports the write and refreshes the list after a success.
    ///
    /// The write is durable once the backend accepts it, so a failed refresh
    /// only lands in [`Self::error`] and the notifier.
    async fn finish_write(
        &mut self,
        session: &Session,
        result: Result<(), StoreError>,
        done: String,
    ) -> Result<(), StoreError> {
        match result {
            Ok(()) => {
                info!("{done}");
                self.report(Notification::success(done, "")).await;
                if let Err(e) = self.list(session).await {
                    warn!(error = %e, "User list refresh failed after a successful write");
                }
                Ok(())
            }
            Err(e) => {
                let title = match e.operation() {
                    Some(operation) => format!("Failed to {operation}"),
                    None => "User update failed".to_string(),
                };
                self.report(Notification::error(title, e.to_string())).await;
                Err(e)
            }
        }
    }

    /// Cached accounts matching `term` over every listed field, ignoring case
    pub fn search(&self, term: &str) -> Vec<&UserAccount> {
        self.users.iter().filter(|u| u.matches_search(term)).collect()
    }

    /// Usernames that can be assigned to a record's `Responsibility`
    pub fn responsibility_options(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.users
            .iter()
            .map(|u| u.username.as_str())
            .filter(|name| !name.is_empty() && seen.insert(*name))
            .collect()
    }

    async fn report(&self, notification: Notification) {
        let notification = notification.with_category("users");
        if let Err(e) = self.notifier.notify(&notification).await {
            warn!(error = %e, "Failed to deliver notification");
        }
    }
}
