//! Identity collaborator — current-user authorization state.
//!
//! DESIGN
//! ======
//! Guards never own user state. They receive an `Arc<dyn IdentityProvider>`
//! at construction and ask it for a fresh `UserAuthState` on every call.
//! `HttpIdentityProvider` is the production implementation: a thin reqwest
//! wrapper around the platform's user-info endpoint. Response parsing lives in
//! `parse_auth_state` so it can be tested without a network.

#[cfg(test)]
#[path = "identity_test.rs"]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_IDENTITY_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_IDENTITY_CONNECT_TIMEOUT_SECS: u64 = 5;

// =============================================================================
// ERROR
// =============================================================================

/// Failure to obtain the current user's authorization state.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The HTTP request to the identity service failed.
    #[error("identity request failed: {0}")]
    Request(String),

    /// The identity service returned a non-success HTTP status.
    #[error("identity response error: status {status}")]
    Response { status: u16, body: String },

    /// The identity service response body could not be deserialized.
    #[error("identity response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

// =============================================================================
// AUTH STATE
// =============================================================================

/// Snapshot of the requesting user's identity and role flags.
///
/// Missing fields default to `false`/empty, so `{}` describes an anonymous
/// visitor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserAuthState {
    pub is_logged_in: bool,
    pub is_curriculum_admin: bool,
    pub is_super_admin: bool,
    pub is_topic_manager: bool,
    pub is_moderator: bool,
    pub is_release_coordinator: bool,
    pub is_blog_admin: bool,
    pub is_blog_post_editor: bool,
    pub is_translation_admin: bool,
    pub is_question_admin: bool,
    pub can_create_collections: bool,
    pub preferred_site_language_code: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
}

/// Source of the current user's authorization state. Enables mocking in tests.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Fetch the current user's authorization state.
    ///
    /// # Errors
    ///
    /// Returns an [`IdentityError`] if the state cannot be fetched or parsed.
    async fn current_user_auth_state(&self) -> Result<UserAuthState, IdentityError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for IdentityTimeouts {
    fn default() -> Self {
        Self {
            request_secs: DEFAULT_IDENTITY_REQUEST_TIMEOUT_SECS,
            connect_secs: DEFAULT_IDENTITY_CONNECT_TIMEOUT_SECS,
        }
    }
}

/// Fetches `UserAuthState` from the user-info endpoint over HTTP.
///
/// The HTTP client is shared; `with_cookie` produces a per-request view that
/// forwards the caller's session cookie.
#[derive(Clone)]
pub struct HttpIdentityProvider {
    http: reqwest::Client,
    url: String,
    cookie: Option<String>,
}

impl HttpIdentityProvider {
    /// Build a provider for `url` with the given timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::HttpClientBuild`] if the reqwest client fails to build.
    pub fn new(url: impl Into<String>, timeouts: IdentityTimeouts) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| IdentityError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, url: url.into(), cookie: None })
    }

    /// Copy of this provider that sends `cookie` as the `Cookie` header.
    #[must_use]
    pub fn with_cookie(&self, cookie: Option<String>) -> Self {
        Self { http: self.http.clone(), url: self.url.clone(), cookie: cookie.filter(|c| !c.is_empty()) }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn current_user_auth_state(&self) -> Result<UserAuthState, IdentityError> {
        let mut request = self
            .http
            .get(&self.url)
            .header("Accept", "application/json");
        if let Some(cookie) = &self.cookie {
            request = request.header("Cookie", cookie);
        }

        let response = request
            .send()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(IdentityError::Response { status, body: text });
        }

        parse_auth_state(&text)
    }
}

/// Parse a user-info response body.
///
/// # Errors
///
/// Returns [`IdentityError::Parse`] if the body is not a JSON object of the
/// expected shape.
pub fn parse_auth_state(body: &str) -> Result<UserAuthState, IdentityError> {
    serde_json::from_str(body).map_err(|e| IdentityError::Parse(e.to_string()))
}

/// Builds request-scoped identity providers from the caller's cookies.
pub trait IdentitySource: Send + Sync {
    fn for_request(&self, cookie: Option<String>) -> Arc<dyn IdentityProvider>;
}

impl IdentitySource for HttpIdentityProvider {
    fn for_request(&self, cookie: Option<String>) -> Arc<dyn IdentityProvider> {
        Arc::new(self.with_cookie(cookie))
    }
}
