//! Deadline and cancellation for remote calls
//!
//! Every port call made by a use case goes through [`RequestPolicy::run`],
//! which races the call against a per-request deadline and a shared
//! [`CancellationToken`]. The CLI cancels the token on Ctrl-C.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::StoreError;

/// Deadline applied when none is configured
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct RequestPolicy {
    deadline: Duration,
    cancel: CancellationToken,
}

impl RequestPolicy {
    pub fn new(deadline: Duration) -> Self {
        Self {
            deadline,
            cancel: CancellationToken::new(),
        }
    }

    /// Shares an existing token, so one cancel stops every holder
    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Runs one remote call under the deadline and cancellation token.
    ///
    /// Adapter errors are flattened into [`StoreError::Remote`] with their
    /// full context chain.
    pub async fn run<T, F>(&self, operation: &'static str, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        if self.cancel.is_cancelled() {
            return Err(StoreError::Cancelled { operation });
        }

        debug!(operation, deadline_secs = self.deadline.as_secs(), "Remote call");

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                warn!(operation, "Remote call cancelled");
                Err(StoreError::Cancelled { operation })
            }
            outcome = tokio::time::timeout(self.deadline, call) => match outcome {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) => {
                    warn!(operation, error = %e, "Remote call failed");
                    Err(StoreError::Remote {
                        operation,
                        message: format!("{e:#}"),
                    })
                }
                Err(_) => {
                    warn!(operation, deadline_secs = self.deadline.as_secs(), "Remote call timed out");
                    Err(StoreError::TimedOut {
                        operation,
                        after: self.deadline,
                    })
                }
            },
        }
    }
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_DEADLINE)
    }
}
