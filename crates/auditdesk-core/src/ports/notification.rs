//! Notification service port (driven/secondary port)
//!
//! This module defines how use cases report outcomes to the operator.
//! Every remote failure goes through here; nothing fails silently.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because notification delivery is adapter-specific.
//! - Notifications are fire-and-forget; a delivery failure is logged by the
//!   caller and never turns into an operation failure.

use serde::{Deserialize, Serialize};

/// Severity of a notification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl std::fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotificationLevel::Info => "info",
            NotificationLevel::Success => "success",
            NotificationLevel::Warning => "warning",
            NotificationLevel::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// A message for the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Short headline, e.g. "Save failed"
    pub title: String,
    /// Details, typically the server message
    pub body: String,
    pub level: NotificationLevel,
    /// Area that raised it: "audits", "evidence", "import", "users"
    pub category: String,
}

impl Notification {
    /// Creates an `Info` notification with no category
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            level: NotificationLevel::Info,
            category: String::new(),
        }
    }

    pub fn with_level(mut self, level: NotificationLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn success(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(title, body).with_level(NotificationLevel::Success)
    }

    pub fn warning(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(title, body).with_level(NotificationLevel::Warning)
    }

    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(title, body).with_level(NotificationLevel::Error)
    }
}

/// Port trait for operator-facing notifications
#[async_trait::async_trait]
pub trait INotificationService: Send + Sync {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()>;
}
