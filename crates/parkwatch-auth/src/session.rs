//! Bearer-token session management.
//!
//! The session holds at most one token. It starts empty, is filled by
//! [`SessionManager::login`], is overwritten by every later login and is only
//! cleared when the refresh path gives up.

use std::sync::Arc;

use parking_lot::Mutex;
use parkwatch_core::document::{excerpt, FieldPath};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::{AuthError, Result};
use crate::transport::{HttpRequest, HttpTransport};
use crate::ApiConfig;

/// Locations of the bearer token in a login response, highest priority first.
pub const TOKEN_FIELDS: &[FieldPath] = &[
    FieldPath::text("data.token"),
    FieldPath::text("token"),
    FieldPath::text("access_token"),
];

/// Mutable session state.
#[derive(Debug, Default)]
struct Session {
    token: Option<String>,
    refresh_attempts: u32,
}

/// Owns the bearer token and the re-login counter.
pub struct SessionManager {
    config: ApiConfig,
    transport: Arc<dyn HttpTransport>,
    state: Mutex<Session>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("base_url", &self.config.base_url)
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Create an unauthenticated session.
    #[must_use]
    pub fn new(config: ApiConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            config,
            transport,
            state: Mutex::new(Session::default()),
        }
    }

    /// The API configuration.
    #[must_use]
    pub const fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// The transport this session logs in with.
    #[must_use]
    pub fn transport(&self) -> &Arc<dyn HttpTransport> {
        &self.transport
    }

    /// Log in with the configured credentials and store the token.
    ///
    /// Login requests never go through the 401 refresh path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No response was received (`Transport`)
    /// - The status is not 200 (`LoginFailed`)
    /// - The body is not JSON (`Document`)
    /// - No token is present in any known location (`TokenMissing`)
    pub async fn login(&self) -> Result<()> {
        let url = self.config.login_url();
        let request = self.config.with_common_headers(HttpRequest::post(
            &url,
            json!({
                "email": self.config.email,
                "password": self.config.password,
            }),
        ));

        let response = self.transport.send(&request).await?;
        if response.status != 200 {
            warn!(status = response.status, "login rejected");
            return Err(AuthError::LoginFailed(format!(
                "HTTP {}: {}",
                response.status,
                excerpt(&response.body, 200)
            )));
        }

        let document = response.document()?;
        let (field, token) = document
            .first_match(TOKEN_FIELDS)
            .ok_or(AuthError::TokenMissing)?;

        debug!(field = field.path(), "token extracted");
        self.state.lock().token = Some(token);
        info!(email = %self.config.email, "logged in");
        Ok(())
    }

    /// Log in unless a token is already held.
    ///
    /// # Errors
    ///
    /// Returns the login error if a login was needed and failed.
    pub async fn ensure_authenticated(&self) -> Result<()> {
        if self.is_authenticated() {
            return Ok(());
        }
        self.login().await
    }

    /// The current token, if any.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.state.lock().token.clone()
    }

    /// Check if a token is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.lock().token.is_some()
    }

    /// Drop the token and reset the refresh counter.
    pub fn invalidate(&self) {
        let mut state = self.state.lock();
        state.token = None;
        state.refresh_attempts = 0;
    }

    /// Number of re-logins since the last non-401 response.
    #[must_use]
    pub fn refresh_attempts(&self) -> u32 {
        self.state.lock().refresh_attempts
    }

    /// Claim one re-login. Returns `false` once the configured bound is
    /// reached.
    pub(crate) fn try_begin_refresh(&self) -> bool {
        let mut state = self.state.lock();
        if state.refresh_attempts < self.config.max_auth_retries {
            state.refresh_attempts += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn reset_refresh(&self) {
        self.state.lock().refresh_attempts = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{HttpMethod, MockTransport};

    fn manager(mock: &Arc<MockTransport>) -> SessionManager {
        let config = ApiConfig {
            base_url: "http://api.test".to_string(),
            email: "device@lot.test".to_string(),
            password: "pw".to_string(),
            ..ApiConfig::default()
        };
        SessionManager::new(config, mock.clone())
    }

    #[tokio::test]
    async fn login_prefers_nested_token() {
        let mock = Arc::new(MockTransport::new());
        mock.expect(
            HttpMethod::Post,
            "/api/auth/login",
            200,
            json!({"data": {"token": "nested"}, "token": "flat"}),
        );
        let session = manager(&mock);

        session.login().await.unwrap();
        assert_eq!(session.token().as_deref(), Some("nested"));

        let sent = &mock.requests()[0];
        assert_eq!(sent.url, "http://api.test/api/auth/login");
        assert_eq!(
            sent.body,
            Some(json!({"email": "device@lot.test", "password": "pw"}))
        );
        assert_eq!(sent.header_value("Accept"), Some("application/json"));
        assert!(sent.header_value("Authorization").is_none());
    }

    #[tokio::test]
    async fn login_falls_back_to_access_token() {
        let mock = Arc::new(MockTransport::new());
        mock.expect(
            HttpMethod::Post,
            "/login",
            200,
            json!({"token": 5, "access_token": "at"}),
        );
        let session = manager(&mock);
        session.login().await.unwrap();
        assert_eq!(session.token().as_deref(), Some("at"));
    }

    #[tokio::test]
    async fn login_without_token_fails() {
        let mock = Arc::new(MockTransport::new());
        mock.expect(HttpMethod::Post, "/login", 200, json!({"success": true}));
        let session = manager(&mock);
        assert!(matches!(
            session.login().await,
            Err(AuthError::TokenMissing)
        ));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn login_non_200_fails() {
        let mock = Arc::new(MockTransport::new());
        mock.expect(
            HttpMethod::Post,
            "/login",
            401,
            json!({"message": "bad credentials"}),
        );
        let session = manager(&mock);
        let err = session.login().await.unwrap_err();
        assert!(matches!(err, AuthError::LoginFailed(ref m) if m.contains("401")));
    }

    #[tokio::test]
    async fn ensure_authenticated_logs_in_once() {
        let mock = Arc::new(MockTransport::new());
        mock.expect(HttpMethod::Post, "/login", 200, json!({"token": "t"}));
        let session = manager(&mock);

        session.ensure_authenticated().await.unwrap();
        session.ensure_authenticated().await.unwrap();
        assert_eq!(mock.request_count(), 1);

        session.invalidate();
        assert!(!session.is_authenticated());
        assert!(session.ensure_authenticated().await.is_err());
    }

    #[test]
    fn refresh_bound() {
        let mock = Arc::new(MockTransport::new());
        let session = manager(&mock);
        assert!(session.try_begin_refresh());
        assert!(!session.try_begin_refresh());
        assert_eq!(session.refresh_attempts(), 1);
        session.reset_refresh();
        assert!(session.try_begin_refresh());
    }
}
