//! Session context
//!
//! A [`Session`] is what a successful login yields: who the operator is,
//! their role and the bearer token for protected calls. It is passed
//! explicitly to every use case and port call that needs it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    newtypes::{AccessToken, UserId},
    user_account::Role,
};

/// Authenticated operator context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "id")]
    user_id: UserId,
    username: String,
    #[serde(default)]
    role: Role,
    token: AccessToken,
    #[serde(default = "Utc::now")]
    logged_in_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        user_id: UserId,
        username: impl Into<String>,
        role: Role,
        token: AccessToken,
    ) -> Self {
        Self {
            user_id,
            username: username.into(),
            role,
            token,
            logged_in_at: Utc::now(),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn token(&self) -> &AccessToken {
        &self.token
    }

    pub fn logged_in_at(&self) -> DateTime<Utc> {
        self.logged_in_at
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
