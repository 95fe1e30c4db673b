//! User account domain types
//!
//! [`UserAccount`] is the read model returned by the backend. Writes go
//! through [`UserDraft`] (create) and [`UserUpdate`] (partial update).
//! The password is write-only: it never appears in the read model, and a
//! blank password in an update means "leave it unchanged".

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use super::{
    errors::DomainError,
    newtypes::{Email, UserId},
};

// ============================================================================
// Role
// ============================================================================

/// Access level of an operator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Manager,
    Admin,
}

impl Role {
    /// Admins may reopen closed records and manage accounts
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "manager" => Ok(Role::Manager),
            "admin" => Ok(Role::Admin),
            _ => Err(DomainError::InvalidRole(s.to_string())),
        }
    }
}

/// Unknown roles read as the least privileged one
fn lenient_role<'de, D>(deserializer: D) -> Result<Role, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(match raw {
        Some(text) => text.parse().unwrap_or_else(|_| {
            tracing::warn!(role = %text, "Unknown role in user listing, treating as user");
            Role::User
        }),
        None => Role::User,
    })
}

// ============================================================================
// UserAccount
// ============================================================================

/// An operator of the system as listed by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    #[serde(rename = "CompanyName", default)]
    pub company_name: Option<String>,
    #[serde(rename = "PlantName", default)]
    pub plant_name: Option<String>,
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "GenId", default)]
    pub gen_id: Option<String>,
    #[serde(rename = "Email", default)]
    pub email: Option<String>,
    #[serde(rename = "Department", default)]
    pub department: Option<String>,
    #[serde(rename = "Role", default, deserialize_with = "lenient_role")]
    pub role: Role,
}

impl UserAccount {
    /// Substring match over every listed field, ignoring case
    pub fn matches_search(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        let needle = needle.to_lowercase();
        let id = self.id.to_string();
        let found = [
            Some(id.as_str()),
            self.company_name.as_deref(),
            self.plant_name.as_deref(),
            Some(self.username.as_str()),
            self.gen_id.as_deref(),
            self.email.as_deref(),
            self.department.as_deref(),
            Some(self.role.as_str()),
        ]
        .into_iter()
        .flatten()
        .any(|value| value.to_lowercase().contains(&needle));
        found
    }

    /// `Company (username)`, the label shown when assigning responsibility
    pub fn display_label(&self) -> String {
        match self.company_name.as_deref() {
            Some(company) if !company.is_empty() => format!("{company} ({})", self.username),
            _ => self.username.clone(),
        }
    }
}

// ============================================================================
// UserDraft
// ============================================================================

/// Fields for creating an account
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDraft {
    pub company_name: String,
    pub plant_name: String,
    pub username: String,
    pub gen_id: String,
    pub password: String,
    pub email: String,
    pub department: String,
    pub role: Role,
}

impl UserDraft {
    /// Checks the fields the backend requires before anything is sent.
    ///
    /// # Errors
    /// [`DomainError::ValidationFailed`] naming the first missing field, or
    /// [`DomainError::InvalidEmail`].
    pub fn validate(&self) -> Result<(), DomainError> {
        let required = [
            ("companyName", &self.company_name),
            ("username", &self.username),
            ("password", &self.password),
            ("email", &self.email),
            ("department", &self.department),
        ];
        if let Some((name, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(DomainError::ValidationFailed(format!(
                "Missing required field: {name}"
            )));
        }
        Email::new(self.email.clone())?;
        Ok(())
    }
}

impl fmt::Debug for UserDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserDraft")
            .field("company_name", &self.company_name)
            .field("plant_name", &self.plant_name)
            .field("username", &self.username)
            .field("gen_id", &self.gen_id)
            .field("password", &"***")
            .field("email", &self.email)
            .field("department", &self.department)
            .field("role", &self.role)
            .finish()
    }
}

// ============================================================================
// UserUpdate
// ============================================================================

/// Partial update of an account; absent fields are left as they are
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plant_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gen_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl UserUpdate {
    /// Drops a blank password so the stored one is kept
    #[must_use]
    pub fn without_blank_password(mut self) -> Self {
        if self.password.as_deref().is_some_and(|p| p.trim().is_empty()) {
            self.password = None;
        }
        self
    }

    /// True when nothing would be sent
    pub fn is_empty(&self) -> bool {
        self.company_name.is_none()
            && self.plant_name.is_none()
            && self.username.is_none()
            && self.gen_id.is_none()
            && self.password.is_none()
            && self.email.is_none()
            && self.department.is_none()
            && self.role.is_none()
    }

    /// # Errors
    /// [`DomainError::ValidationFailed`] when empty, [`DomainError::InvalidEmail`]
    /// when a new email is malformed.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.is_empty() {
            return Err(DomainError::ValidationFailed(
                "No fields to update".to_string(),
            ));
        }
        if self.username.as_deref().is_some_and(|u| u.trim().is_empty()) {
            return Err(DomainError::ValidationFailed(
                "Username cannot be blank".to_string(),
            ));
        }
        if let Some(email) = &self.email {
            Email::new(email.clone())?;
        }
        Ok(())
    }
}

impl fmt::Debug for UserUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserUpdate")
            .field("company_name", &self.company_name)
            .field("plant_name", &self.plant_name)
            .field("username", &self.username)
            .field("gen_id", &self.gen_id)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("email", &self.email)
            .field("department", &self.department)
            .field("role", &self.role)
            .finish()
    }
}
