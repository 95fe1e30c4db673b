//! AuditDesk backend HTTP client
//!
//! Provides a typed HTTP client for the audit backend's REST API.
//! Handles bearer headers, status mapping and endpoint construction; the
//! endpoint-specific calls live in [`crate::audits`] and [`crate::users`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use auditdesk_api::client::ApiClient;
//! use auditdesk_core::config::Config;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::load_or_default(&Config::default_path());
//! let client = ApiClient::new(&config.api)?;
//! println!("Talking to {}", client.base_url());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use auditdesk_core::{config::ApiConfig, domain::Session};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::ApiError;

const USER_AGENT: &str = concat!("auditdesk/", env!("CARGO_PKG_VERSION"));

/// HTTP client for audit backend calls
///
/// Wraps `reqwest::Client` with the configured timeouts and base URL.
/// The session is passed per request, so one client serves any operator.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL for API requests, without a trailing slash
    base_url: String,
}

impl ApiClient {
    /// Creates a client using the URL and timeouts from `config`
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: normalize(&config.base_url),
        })
    }

    /// Creates a client with default transport settings (useful for testing)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: normalize(&base_url.into()),
        }
    }

    /// Returns the base URL for API requests
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Creates a request builder for the given method and path
    ///
    /// Prepends the base URL and, when a session is given, adds its
    /// bearer token.
    ///
    /// # Arguments
    /// * `method` - HTTP method (GET, POST, PUT, DELETE)
    /// * `path` - API path relative to base URL (e.g., "/audits")
    /// * `session` - Operator session, `None` for anonymous calls like login
    pub fn request(&self, method: Method, path: &str, session: Option<&Session>) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match session {
            Some(session) => builder.bearer_auth(session.token().expose()),
            None => builder,
        }
    }

    /// Sends a request and returns the response if its status is a success
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(ApiError::transport)?;
        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "Backend responded");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, &body))
    }

    /// Sends a request and parses a JSON response body
    pub async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(builder).await?;
        let bytes = response.bytes().await.map_err(ApiError::transport)?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    /// Sends a request whose response body carries nothing the caller needs
    pub async fn send_ack(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        self.send(builder).await.map(|_| ())
    }
}

fn normalize(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}
