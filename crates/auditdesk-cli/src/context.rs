//! Per-invocation wiring shared by every command
//!
//! Loads the configuration once, then builds the HTTP adapter, the session
//! store and the use cases on demand. All use cases share one cancellation
//! token, which Ctrl-C trips.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use auditdesk_api::{
    client::ApiClient, provider::HttpAuditBackend, session_store::KeyringSessionStore,
};
use auditdesk_core::{
    config::Config,
    domain::{AuditCategory, Session},
    usecases::{AuditRecordStore, AuthenticateUseCase, RequestPolicy, UserAccountAdmin},
};

use crate::output::{get_formatter, FormatterNotifier, OutputFormat, OutputFormatter};

pub struct CliContext {
    config: Config,
    config_path: PathBuf,
    format: OutputFormat,
    cancel: CancellationToken,
}

impl CliContext {
    /// Loads the configuration from `config_path`, or the default location
    pub fn new(config_path: Option<PathBuf>, format: OutputFormat) -> Self {
        let config_path = config_path.unwrap_or_else(Config::default_path);
        let config = Config::load_or_default(&config_path);
        debug!(path = %config_path.display(), "Configuration loaded");
        Self {
            config,
            config_path,
            format,
            cancel: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    pub fn formatter(&self) -> Box<dyn OutputFormatter> {
        get_formatter(self.is_json())
    }

    /// Cancels in-flight requests when the operator presses Ctrl-C
    pub fn cancel_on_interrupt(&self) {
        let token = self.cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling pending requests");
                token.cancel();
            }
        });
    }

    pub fn policy(&self) -> RequestPolicy {
        RequestPolicy::new(self.config.request_timeout()).with_cancel_token(self.cancel.clone())
    }

    fn backend(&self) -> Result<Arc<HttpAuditBackend>> {
        let client = ApiClient::new(&self.config.api).context("Failed to create HTTP client")?;
        Ok(Arc::new(HttpAuditBackend::new(client)))
    }

    fn notifier(&self) -> Arc<FormatterNotifier> {
        Arc::new(FormatterNotifier::new(self.format))
    }

    pub fn auth(&self) -> Result<AuthenticateUseCase> {
        let sessions = Arc::new(KeyringSessionStore::from_config(&self.config.session));
        Ok(AuthenticateUseCase::new(
            self.backend()?,
            sessions,
            self.policy(),
        ))
    }

    /// The stored session; fails with a login hint when there is none
    pub fn require_session(&self) -> Result<Session> {
        self.auth()?.require()
    }

    /// A record store for `category`, or the configured default category
    pub fn audit_store(&self, category: Option<AuditCategory>) -> Result<AuditRecordStore> {
        let category = category.unwrap_or(self.config.audits.default_category);
        Ok(AuditRecordStore::new(
            self.backend()?,
            self.notifier(),
            self.policy(),
            category,
        )
        .with_max_attempts(self.config.audits.reconcile_max_attempts))
    }

    pub fn user_admin(&self) -> Result<UserAccountAdmin> {
        Ok(UserAccountAdmin::new(
            self.backend()?,
            self.notifier(),
            self.policy(),
        ))
    }
}
