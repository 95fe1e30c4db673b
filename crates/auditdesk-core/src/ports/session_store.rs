//! Session store port
//!
//! Keeps the logged-in [`Session`] between invocations. Written on login,
//! read before each authenticated command, cleared on logout.
//!
//! The trait is synchronous: the backing stores (system keyring, a small
//! JSON file) are blocking and fast.

use crate::domain::Session;

/// Port trait for session persistence
pub trait ISessionStore: Send + Sync {
    /// Returns the stored session, `None` when logged out
    fn load(&self) -> anyhow::Result<Option<Session>>;

    /// Stores `session`, replacing any previous one
    fn save(&self, session: &Session) -> anyhow::Result<()>;

    /// Removes the stored session; a no-op when none is stored
    fn clear(&self) -> anyhow::Result<()>;
}
