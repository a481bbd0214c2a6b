use std::sync::{Arc, RwLock};

use serde_json::json;
use tracing::{debug, info, warn};
use url::Url;

use super::oauth;
use super::tokens::{TokenKind, TokenStore};
use crate::api::{ApiClient, ApiError, ApiRequest};
use crate::error::ClientError;
use crate::models::{Credentials, TokenResponse, User};
use crate::navigation::ROOT_PATH;

#[derive(Debug, Default)]
struct SessionData {
    user: Option<User>,
    loading: bool,
}

/// The process-wide session value.
///
/// Any view may read it; only the session manager (and the API client,
/// when it has to end a session) writes to it.
#[derive(Debug, Default)]
pub struct SessionState {
    data: RwLock<SessionData>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(&self) -> Option<User> {
        self.data.read().unwrap_or_else(|e| e.into_inner()).user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.data.read().unwrap_or_else(|e| e.into_inner()).user.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.data.read().unwrap_or_else(|e| e.into_inner()).loading
    }

    pub(crate) fn set_user(&self, user: Option<User>) {
        self.data.write().unwrap_or_else(|e| e.into_inner()).user = user;
    }

    pub(crate) fn set_loading(&self, loading: bool) {
        self.data.write().unwrap_or_else(|e| e.into_inner()).loading = loading;
    }

    pub(crate) fn clear(&self) {
        self.set_user(None);
    }
}

/// Session lifecycle: startup check, login, registration, OAuth, logout.
pub struct SessionManager {
    api: Arc<ApiClient>,
    api_base: String,
}

impl SessionManager {
    pub fn new(api: Arc<ApiClient>, api_base: &str) -> Self {
        Self {
            api,
            api_base: api_base.to_string(),
        }
    }

    fn tokens(&self) -> &dyn TokenStore {
        self.api.tokens()
    }

    fn state(&self) -> &SessionState {
        self.api.session()
    }

    /// Load the current user if an access token is stored.
    /// Never fails: any error clears credentials and leaves the session empty.
    pub async fn check_session(&self) {
        self.state().set_loading(true);

        if self.tokens().has(TokenKind::Access) {
            match self.api.get_json::<User>(ApiRequest::get("/users/me")).await {
                Ok(user) => {
                    debug!(email = ?user.email, "Session restored");
                    self.state().set_user(Some(user));
                }
                Err(e) => {
                    warn!(error = %e, "Session check failed");
                    self.tokens().clear();
                    self.state().clear();
                }
            }
        }

        self.state().set_loading(false);
    }

    /// Sign in with email and password.
    ///
    /// On success the issued tokens are stored and the session reloaded.
    /// If the server issues no refresh token the current one is kept.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, ClientError> {
        let request = ApiRequest::post("/auth/login", json!(Credentials { email, password }));
        let response: TokenResponse = self
            .api
            .send_credentials(request)
            .await
            .map_err(|e| auth_error(e, "Login failed"))?;

        if let Some(access) = response.access() {
            let refresh = response
                .refresh()
                .map(str::to_string)
                .or_else(|| self.tokens().get(TokenKind::Refresh))
                .unwrap_or_default();
            self.tokens().set_pair(access, &refresh);
            self.check_session().await;
            info!("Logged in");
        }
        Ok(response)
    }

    /// Create an account. Does not sign in.
    pub async fn register(&self, email: &str, password: &str) -> Result<serde_json::Value, ClientError> {
        let request = ApiRequest::post("/auth/register", json!(Credentials { email, password }));
        self.api
            .send_credentials(request)
            .await
            .map_err(|e| auth_error(e, "Registration failed"))
    }

    /// End the session. Safe with no active session.
    pub fn logout(&self) {
        self.tokens().clear();
        self.state().clear();
        self.api.navigator().redirect(ROOT_PATH);
        info!("Logged out");
    }

    pub fn oauth_login_url(&self) -> String {
        oauth::login_url(&self.api_base)
    }

    /// Leave for the external OAuth provider
    pub fn start_oauth_login(&self) {
        self.api.navigator().redirect(&self.oauth_login_url());
    }

    /// Consume tokens from an OAuth callback URL.
    ///
    /// Returns whether an access token was found. When it was, the pair is
    /// stored (refresh token defaults to empty), the session is loaded and
    /// the location is replaced by the URL without the token parameters.
    pub async fn complete_oauth_callback(&self, callback_url: &str) -> bool {
        let url = match Url::parse(callback_url) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "Unparseable OAuth callback URL");
                return false;
            }
        };

        let Some(tokens) = oauth::callback_tokens(&url) else {
            debug!("No tokens in OAuth callback");
            return false;
        };

        self.tokens().set_pair(
            &tokens.access_token,
            tokens.refresh_token.as_deref().unwrap_or(""),
        );
        self.check_session().await;
        self.api.navigator().redirect(oauth::strip_tokens(&url).as_str());
        true
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    pub fn user(&self) -> Option<User> {
        self.state().user()
    }

    pub fn is_loading(&self) -> bool {
        self.state().is_loading()
    }
}

fn auth_error(error: ApiError, fallback: &str) -> ClientError {
    warn!(error = %error, "Authentication request rejected");
    ClientError::Auth(error.detail().unwrap_or(fallback).to_string())
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;
    use crate::auth::MemoryTokenStore;
    use crate::testing::Harness;

    const ME: &str = r#"{"email": "ada@example.com"}"#;

    #[tokio::test]
    async fn test_check_session_without_token_does_nothing() {
        let h = Harness::new();
        h.session.check_session().await;

        assert!(!h.session.is_authenticated());
        assert!(!h.session.is_loading());
        assert!(h.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_check_session_loads_user() {
        let h = Harness::new();
        h.tokens.set_pair("a1", "r1");
        h.transport.push(StatusCode::OK, ME);

        h.session.check_session().await;

        assert!(h.session.is_authenticated());
        assert_eq!(h.session.user().unwrap().email.as_deref(), Some("ada@example.com"));
        assert!(!h.session.is_loading());

        // Idempotent
        h.transport.push(StatusCode::OK, ME);
        h.session.check_session().await;
        assert!(h.session.is_authenticated());
    }

    #[tokio::test]
    async fn test_check_session_failure_clears_credentials() {
        let h = Harness::new();
        h.tokens.set(TokenKind::Access, "a1", TokenKind::Access.lifetime());
        h.transport.push(StatusCode::INTERNAL_SERVER_ERROR, "");

        h.session.check_session().await;

        assert!(!h.session.is_authenticated());
        assert!(!h.tokens.has(TokenKind::Access));
        assert!(!h.session.is_loading());
    }

    #[tokio::test]
    async fn test_login_stores_tokens_and_loads_user() {
        let h = Harness::new();
        h.transport.push(StatusCode::OK, r#"{"access_token": "a1", "refresh_token": "r1"}"#);
        h.transport.push(StatusCode::OK, ME);

        let result = h.session.login("ada@example.com", "pw").await.unwrap();
        assert_eq!(result.access(), Some("a1"));

        assert_eq!(h.tokens.get(TokenKind::Access).as_deref(), Some("a1"));
        assert_eq!(h.tokens.get(TokenKind::Refresh).as_deref(), Some("r1"));
        assert!(h.session.is_authenticated());

        let requests = h.transport.requests();
        assert_eq!(requests[0].path, "/auth/login");
        assert_eq!(
            requests[0].body,
            Some(json!({"email": "ada@example.com", "password": "pw"}))
        );
        assert_eq!(requests[1].path, "/users/me");
        assert_eq!(requests[1].bearer.as_deref(), Some("a1"));
    }

    #[tokio::test]
    async fn test_login_keeps_existing_refresh_token() {
        let h = Harness::new();
        h.tokens.set(TokenKind::Refresh, "old-refresh", TokenKind::Refresh.lifetime());
        h.transport.push(StatusCode::OK, r#"{"access_token": "a1"}"#);
        h.transport.push(StatusCode::OK, ME);

        h.session.login("ada@example.com", "pw").await.unwrap();
        assert_eq!(h.tokens.get(TokenKind::Refresh).as_deref(), Some("old-refresh"));
    }

    #[tokio::test]
    async fn test_login_failure_surfaces_server_detail() {
        let h = Harness::new();
        h.transport.push(StatusCode::UNAUTHORIZED, r#"{"detail": "Invalid credentials"}"#);

        let err = h.session.login("ada@example.com", "bad").await.unwrap_err();
        assert_eq!(err, ClientError::Auth("Invalid credentials".to_string()));
        assert!(!h.session.is_authenticated());
        // A rejected login is not an expired session
        assert_eq!(h.transport.requests().len(), 1);
        assert!(h.navigator.locations().is_empty());
    }

    #[tokio::test]
    async fn test_login_failure_generic_fallback() {
        let h = Harness::new();
        h.transport.push(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");

        let err = h.session.login("ada@example.com", "pw").await.unwrap_err();
        assert_eq!(err.to_string(), "Login failed");
    }

    #[tokio::test]
    async fn test_auth_failure_detail_shown_for_any_status() {
        let h = Harness::new();
        let body = r#"{"detail": "Account disabled"}"#;
        for status in [
            StatusCode::FORBIDDEN,
            StatusCode::NOT_FOUND,
            StatusCode::INTERNAL_SERVER_ERROR,
        ] {
            h.transport.push(status, body);
            let err = h.session.login("ada@example.com", "pw").await.unwrap_err();
            assert_eq!(err, ClientError::Auth("Account disabled".to_string()), "login {}", status);

            h.transport.push(status, body);
            let err = h.session.register("ada@example.com", "pw").await.unwrap_err();
            assert_eq!(err, ClientError::Auth("Account disabled".to_string()), "register {}", status);
        }
        assert!(h.navigator.locations().is_empty());
    }

    #[tokio::test]
    async fn test_register_does_not_sign_in() {
        let h = Harness::new();
        h.transport.push(StatusCode::OK, r#"{"status": "user created"}"#);

        let data = h.session.register("new@example.com", "pw").await.unwrap();
        assert_eq!(data, json!({"status": "user created"}));
        assert!(!h.session.is_authenticated());
        assert!(!h.tokens.has(TokenKind::Access));
    }

    #[tokio::test]
    async fn test_register_failure() {
        let h = Harness::new();
        h.transport.push(StatusCode::BAD_REQUEST, r#"{"detail": "Email already registered"}"#);
        let err = h.session.register("dup@example.com", "pw").await.unwrap_err();
        assert_eq!(err.to_string(), "Email already registered");

        h.transport.push(StatusCode::BAD_GATEWAY, "");
        let err = h.session.register("dup@example.com", "pw").await.unwrap_err();
        assert_eq!(err.to_string(), "Registration failed");
    }

    #[tokio::test]
    async fn test_logout_without_session() {
        let h = Harness::new();
        h.session.logout();
        assert!(!h.session.is_authenticated());
        assert_eq!(h.navigator.locations(), vec!["/".to_string()]);
    }

    #[tokio::test]
    async fn test_logout_after_login() {
        let h = Harness::new();
        h.tokens.set_pair("a1", "r1");
        h.transport.push(StatusCode::OK, ME);
        h.session.check_session().await;
        assert!(h.session.is_authenticated());

        h.session.logout();
        assert!(!h.session.is_authenticated());
        assert!(!h.tokens.has(TokenKind::Access));
        assert!(!h.tokens.has(TokenKind::Refresh));
    }

    #[tokio::test]
    async fn test_start_oauth_login_redirects() {
        let h = Harness::new();
        h.session.start_oauth_login();
        assert_eq!(
            h.navigator.locations(),
            vec!["http://api.test/auth/google/login".to_string()]
        );
    }

    #[tokio::test]
    async fn test_oauth_callback_access_token_only() {
        let store = Arc::new(MemoryTokenStore::new());
        let h = Harness::with_store(store.clone());
        h.transport.push(StatusCode::OK, ME);

        let found = h
            .session
            .complete_oauth_callback("http://app.test/?access_token=a1")
            .await;

        assert!(found);
        assert_eq!(store.get(TokenKind::Access).as_deref(), Some("a1"));
        assert_eq!(store.entry(TokenKind::Refresh).unwrap().value, "");
        assert!(h.session.is_authenticated());
        assert_eq!(h.navigator.locations(), vec!["http://app.test/".to_string()]);
    }

    #[tokio::test]
    async fn test_oauth_callback_without_tokens() {
        let store = Arc::new(MemoryTokenStore::new());
        let h = Harness::with_store(store.clone());

        assert!(!h.session.complete_oauth_callback("http://app.test/dashboard").await);
        assert!(!h.session.complete_oauth_callback("not a url").await);

        assert!(store.entry(TokenKind::Access).is_none());
        assert!(store.entry(TokenKind::Refresh).is_none());
        assert!(h.transport.requests().is_empty());
        assert!(h.navigator.locations().is_empty());
    }
}
