//! Session persistence between command invocations
//!
//! - [`KeyringSessionStore`] - the system keyring, falling back to a file
//!   when no keyring service is reachable
//! - [`FileSessionStore`] - a JSON file readable only by its owner
//!
//! Both implement the [`ISessionStore`] port.

use std::fs;
use std::path::{Path, PathBuf};

use auditdesk_core::{config::SessionConfig, domain::Session, ports::ISessionStore};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Keyring account under which the session JSON is stored
const KEYRING_USER: &str = "session";

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Stored session is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SessionStoreError + '_ {
    move |source| SessionStoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

// ============================================================================
// FileSessionStore
// ============================================================================

/// Stores the session as JSON in a single file
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<Option<Session>, SessionStoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&self.path)(e)),
        };
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn write(&self, session: &Session) -> Result<(), SessionStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Err(e) = fs::set_permissions(parent, fs::Permissions::from_mode(0o700)) {
                    warn!(path = %parent.display(), error = %e, "Failed to restrict session directory");
                }
            }
        }

        let json = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, json).map_err(io_error(&self.path))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .map_err(io_error(&self.path))?;
        }

        debug!(path = %self.path.display(), "Session written to file");
        Ok(())
    }

    pub fn remove(&self) -> Result<(), SessionStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&self.path)(e)),
        }
    }
}

impl ISessionStore for FileSessionStore {
    fn load(&self) -> anyhow::Result<Option<Session>> {
        Ok(self.read()?)
    }

    fn save(&self, session: &Session) -> anyhow::Result<()> {
        Ok(self.write(session)?)
    }

    fn clear(&self) -> anyhow::Result<()> {
        Ok(self.remove()?)
    }
}

// ============================================================================
// KeyringSessionStore
// ============================================================================

/// Stores the session in the system keyring, with a file fallback
///
/// Load order is keyring then file. A save that the keyring refuses goes
/// to the file instead; clearing removes both copies.
#[derive(Debug, Clone)]
pub struct KeyringSessionStore {
    service: String,
    fallback: FileSessionStore,
}

impl KeyringSessionStore {
    pub fn new(service: impl Into<String>, fallback: FileSessionStore) -> Self {
        Self {
            service: service.into(),
            fallback,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(
            config.keyring_service.clone(),
            FileSessionStore::new(config.credentials_file.clone()),
        )
    }

    fn entry(&self) -> Result<keyring::Entry, SessionStoreError> {
        Ok(keyring::Entry::new(&self.service, KEYRING_USER)?)
    }

    fn load_keyring(&self) -> Result<Option<Session>, SessionStoreError> {
        match self.entry()?.get_password() {
            Ok(json) if json.trim().is_empty() => Ok(None),
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save_keyring(&self, session: &Session) -> Result<(), SessionStoreError> {
        let json = serde_json::to_string(session)?;
        self.entry()?.set_password(&json)?;
        Ok(())
    }

    fn clear_keyring(&self) -> Result<(), SessionStoreError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl ISessionStore for KeyringSessionStore {
    fn load(&self) -> anyhow::Result<Option<Session>> {
        match self.load_keyring() {
            Ok(Some(session)) => {
                debug!(service = %self.service, "Loaded session from keyring");
                return Ok(Some(session));
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Keyring unavailable; trying session file"),
        }
        Ok(self.fallback.read()?)
    }

    fn save(&self, session: &Session) -> anyhow::Result<()> {
        match self.save_keyring(session) {
            Ok(()) => {
                info!(service = %self.service, "Session stored in keyring");
                // Drop any copy left by an earlier fallback save
                if let Err(e) = self.fallback.remove() {
                    warn!(error = %e, "Failed to remove old session file");
                }
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Keyring store failed; falling back to file");
                self.fallback.write(session)?;
                info!(path = %self.fallback.path().display(), "Session stored in file");
                Ok(())
            }
        }
    }

    fn clear(&self) -> anyhow::Result<()> {
        if let Err(e) = self.clear_keyring() {
            warn!(error = %e, "Failed to clear keyring session");
        }
        self.fallback.remove()?;
        Ok(())
    }
}
