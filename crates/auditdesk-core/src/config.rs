//! Configuration module for AuditDesk.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::AuditCategory;

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for AuditDesk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub audits: AuditsConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the REST backend, including the `/api` prefix.
    pub base_url: String,
    /// Deadline for one remote call, in seconds.
    pub request_timeout_secs: u64,
    /// TCP connect timeout, in seconds.
    pub connect_timeout_secs: u64,
}

/// Audit workflow settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditsConfig {
    /// Category used when a command does not name one.
    pub default_category: AuditCategory,
    /// Resend attempts before an unconfirmed edit is reported as abandoned.
    pub reconcile_max_attempts: u32,
}

/// Session persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Service name under which the session is stored in the system keyring.
    pub keyring_service: String,
    /// Fallback file used when no keyring is available.
    pub credentials_file: PathBuf,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Using default configuration");
                Self::default()
            }
        }
    }

    /// Write the configuration as YAML, creating parent directories.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/auditdesk/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("auditdesk")
            .join("config.yaml")
    }

    /// Per-request deadline derived from `api.request_timeout_secs`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.api.connect_timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001/api".to_string(),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl Default for AuditsConfig {
    fn default() -> Self {
        Self {
            default_category: AuditCategory::Internal,
            reconcile_max_attempts: 3,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("auditdesk");
        Self {
            keyring_service: "auditdesk".to_string(),
            credentials_file: data_dir.join("session.json"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"api.base_url"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- api ---
        let base_url = self.api.base_url.trim();
        if base_url.is_empty() {
            errors.push(ValidationError {
                field: "api.base_url".into(),
                message: "must not be empty".into(),
            });
        } else if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            errors.push(ValidationError {
                field: "api.base_url".into(),
                message: format!("must start with http:// or https://: {base_url}"),
            });
        }
        if self.api.request_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "api.request_timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.api.connect_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "api.connect_timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.api.connect_timeout_secs > self.api.request_timeout_secs {
            errors.push(ValidationError {
                field: "api.connect_timeout_secs".into(),
                message: format!(
                    "connect_timeout_secs ({}) must not exceed request_timeout_secs ({})",
                    self.api.connect_timeout_secs, self.api.request_timeout_secs
                ),
            });
        }

        // --- audits ---
        if self.audits.reconcile_max_attempts == 0 {
            errors.push(ValidationError {
                field: "audits.reconcile_max_attempts".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- session ---
        if self.session.keyring_service.trim().is_empty() {
            errors.push(ValidationError {
                field: "session.keyring_service".into(),
                message: "must not be empty".into(),
            });
        }
        if self.session.credentials_file.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "session.credentials_file".into(),
                message: "must not be empty".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use auditdesk_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .api_base_url("https://audits.example.com/api")
///     .api_request_timeout_secs(15)
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- api ---

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api.base_url = url.into();
        self
    }

    pub fn api_request_timeout_secs(mut self, seconds: u64) -> Self {
        self.config.api.request_timeout_secs = seconds;
        self
    }

    pub fn api_connect_timeout_secs(mut self, seconds: u64) -> Self {
        self.config.api.connect_timeout_secs = seconds;
        self
    }

    // --- audits ---

    pub fn audits_default_category(mut self, category: AuditCategory) -> Self {
        self.config.audits.default_category = category;
        self
    }

    pub fn audits_reconcile_max_attempts(mut self, attempts: u32) -> Self {
        self.config.audits.reconcile_max_attempts = attempts;
        self
    }

    // --- session ---

    pub fn session_keyring_service(mut self, service: impl Into<String>) -> Self {
        self.config.session.keyring_service = service.into();
        self
    }

    pub fn session_credentials_file(mut self, file: PathBuf) -> Self {
        self.config.session.credentials_file = file;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
