//! AuditDesk API - HTTP client for the audit backend
//!
//! Provides async adapters for:
//! - Token login and user account administration
//! - Audit listings, record updates and last-upload queries
//! - Multipart spreadsheet imports and evidence uploads
//! - Session persistence between command invocations
//!
//! ## Modules
//!
//! - [`client`] - Base HTTP client, bearer auth and status mapping
//! - [`audits`] - `/audits` endpoints
//! - [`users`] - `/login` and `/users` endpoints
//! - [`provider`] - Port implementations backed by [`client::ApiClient`]
//! - [`session_store`] - Keyring and file backed session storage

pub mod audits;
pub mod client;
pub mod provider;
pub mod session_store;
pub mod users;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when communicating with the audit backend
#[derive(Debug, Error)]
pub enum ApiError {
    /// The bearer token is missing, invalid or was replaced by a newer login
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The session role does not allow the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend rejected the request payload (4xx other than the above)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A server-side error occurred (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// A network-level error occurred
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The transport gave up waiting for the backend
    #[error("Request timed out")]
    Timeout,

    /// The response body could not be parsed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Error payload the backend sends alongside non-2xx statuses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl ApiError {
    /// Maps a non-success status and its body to an error
    ///
    /// The server's `{"error": "..."}` message wins; otherwise the message
    /// is a fallback naming the status.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = server_message(body).unwrap_or_else(|| match status.canonical_reason() {
            Some(reason) => format!("request failed with status {} {reason}", status.as_u16()),
            None => format!("request failed with status {}", status.as_u16()),
        });

        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized(message),
            StatusCode::FORBIDDEN => Self::Forbidden(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            s if s.is_server_error() => Self::ServerError(message),
            _ => Self::BadRequest(message),
        }
    }

    /// Classifies a transport failure, separating timeouts from other errors
    pub fn transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err)
        }
    }

    /// The HTTP status this error was built from, if any
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Unauthorized(_) => Some(StatusCode::UNAUTHORIZED),
            Self::Forbidden(_) => Some(StatusCode::FORBIDDEN),
            Self::NotFound(_) => Some(StatusCode::NOT_FOUND),
            Self::Network(e) => e.status(),
            _ => None,
        }
    }
}

fn server_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<ErrorBody>(trimmed) {
        Ok(parsed) => parsed
            .error
            .or(parsed.message)
            .filter(|m| !m.trim().is_empty()),
        // Plain-text bodies are surfaced as-is, HTML error pages are not
        Err(_) if !trimmed.starts_with('<') => Some(trimmed.to_string()),
        Err(_) => None,
    }
}
