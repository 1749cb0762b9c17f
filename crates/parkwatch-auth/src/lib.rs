//! Authenticated HTTP access to the parking service.
//!
//! This crate provides:
//!
//! - The [`HttpTransport`] primitive and its `reqwest` implementation
//! - A [`SessionManager`] holding the bearer token
//! - The [`AuthorizedClient`] wrapper that re-logs in once on 401
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐
//! │ Resolver /       │────▶│ AuthorizedClient │
//! │ Coordinator      │     │ (401 → re-login) │
//! └──────────────────┘     └────────┬─────────┘
//!                                   │
//!                          ┌────────▼─────────┐
//!                          │  SessionManager  │
//!                          │  (bearer token)  │
//!                          └────────┬─────────┘
//!                                   │
//!                          ┌────────▼─────────┐
//!                          │  HttpTransport   │
//!                          │  (reqwest)       │
//!                          └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use parkwatch_auth::{ApiConfig, AuthorizedClient, HttpRequest, ReqwestTransport, SessionManager};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ApiConfig::default();
//! let transport = Arc::new(ReqwestTransport::new(&config));
//! let session = Arc::new(SessionManager::new(config, transport));
//! let client = AuthorizedClient::new(session);
//!
//! let response = client.send(HttpRequest::get(client.url("/api/slots"))).await?;
//! println!("status {}", response.status);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::time::Duration;

use serde::Deserialize;

pub mod client;
pub mod error;
pub mod session;
pub mod transport;

pub use client::AuthorizedClient;
pub use error::{AuthError, Result, TransportError};
pub use session::{SessionManager, TOKEN_FIELDS};
pub use transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};

#[cfg(any(test, feature = "test-utils"))]
pub use transport::MockTransport;

/// Connection and credential settings for the parking service.
#[derive(Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL, e.g. `http://localhost:8888`.
    #[serde(default = "ApiConfig::default_base_url")]
    pub base_url: String,

    /// Login email for the device account.
    #[serde(default)]
    pub email: String,

    /// Login password for the device account.
    #[serde(default)]
    pub password: String,

    /// Path of the login endpoint.
    #[serde(default = "ApiConfig::default_login_path")]
    pub login_path: String,

    /// Whole-request timeout in seconds.
    #[serde(default = "ApiConfig::default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Connect timeout in seconds.
    #[serde(default = "ApiConfig::default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// How many times a single request may trigger a re-login after 401.
    #[serde(default = "ApiConfig::default_max_auth_retries")]
    pub max_auth_retries: u32,

    /// Value of the `User-Agent` header.
    #[serde(default = "ApiConfig::default_user_agent")]
    pub user_agent: String,
}

impl ApiConfig {
    fn default_base_url() -> String {
        "http://localhost:8888".to_string()
    }

    fn default_login_path() -> String {
        "/api/auth/login".to_string()
    }

    const fn default_request_timeout() -> u64 {
        20
    }

    const fn default_connect_timeout() -> u64 {
        5
    }

    const fn default_max_auth_retries() -> u32 {
        1
    }

    fn default_user_agent() -> String {
        concat!("parkwatch/", env!("CARGO_PKG_VERSION")).to_string()
    }

    /// Join a path onto the base URL.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Get the login endpoint URL.
    #[must_use]
    pub fn login_url(&self) -> String {
        self.url(&self.login_path)
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Get the connect timeout as a `Duration`.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Add the headers every request carries.
    #[must_use]
    pub fn with_common_headers(&self, request: HttpRequest) -> HttpRequest {
        request
            .header("Accept", "application/json")
            .header("User-Agent", self.user_agent.clone())
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("login_path", &self.login_path)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("max_auth_retries", &self.max_auth_retries)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            email: String::new(),
            password: String::new(),
            login_path: Self::default_login_path(),
            request_timeout_secs: Self::default_request_timeout(),
            connect_timeout_secs: Self::default_connect_timeout(),
            max_auth_retries: Self::default_max_auth_retries(),
            user_agent: Self::default_user_agent(),
        }
    }
}
