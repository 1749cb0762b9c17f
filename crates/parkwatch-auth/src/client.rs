//! Authorized request wrapper with bounded re-login on 401.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{AuthError, Result};
use crate::session::SessionManager;
use crate::transport::{HttpRequest, HttpResponse};

/// Sends requests with the session's bearer token.
///
/// A 401 triggers a re-login and a single resend, up to the configured
/// bound. The re-login counter lives in the session and resets when the
/// request finishes, whatever the outcome.
#[derive(Debug, Clone)]
pub struct AuthorizedClient {
    session: Arc<SessionManager>,
}

impl AuthorizedClient {
    /// Create a client sharing `session`.
    #[must_use]
    pub const fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    /// The shared session.
    #[must_use]
    pub const fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Build an absolute URL from a path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        self.session.config().url(path)
    }

    /// Ensure a token is held, then send `request`.
    ///
    /// Any status other than 401 is returned as-is for the caller to
    /// interpret.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The initial login fails (`LoginFailed`, `TokenMissing`, `Document`)
    /// - No response was received (`Transport`); never retried here
    /// - A re-login after 401 fails; the token is cleared
    /// - The server still answers 401 after the bound (`RefreshExhausted`);
    ///   the token is cleared
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.session.ensure_authenticated().await?;

        let result = self.send_with_refresh(&request).await;
        // every outcome ends this request's refresh budget
        self.session.reset_refresh();
        result
    }

    async fn send_with_refresh(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut response = self.execute(request).await?;
        while response.is_unauthorized() {
            let attempts = self.session.refresh_attempts();
            if !self.session.try_begin_refresh() {
                warn!(url = %request.url, attempts, "still unauthorized, giving up");
                self.session.invalidate();
                return Err(AuthError::RefreshExhausted { attempts });
            }

            debug!(url = %request.url, "401, logging in again");
            if let Err(e) = self.session.login().await {
                warn!(error = %e, "re-login failed");
                self.session.invalidate();
                return Err(e);
            }
            response = self.execute(request).await?;
        }
        Ok(response)
    }

    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut request = self.session.config().with_common_headers(request.clone());
        if let Some(token) = self.session.token() {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        Ok(self.session.transport().send(&request).await?)
    }
}
