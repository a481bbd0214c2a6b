//! API client for the BookBuddy backend.
//!
//! Every request carries the stored access token as a bearer credential.
//! A 401 triggers one refresh through `/auth/refresh` followed by exactly
//! one retry of the original request; if the refresh cannot happen the
//! session is ended.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::transport::{ApiRequest, ApiResponse, Transport};
use super::ApiError;
use crate::auth::{SessionState, TokenKind, TokenStore};
use crate::models::{RefreshRequest, TokenResponse};
use crate::navigation::{Navigator, ROOT_PATH};

const REFRESH_PATH: &str = "/auth/refresh";

pub struct ApiClient {
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
    session: Arc<SessionState>,
    /// Serializes refresh attempts so concurrent 401s share one refresh
    refresh_gate: Mutex<()>,
    /// Bumped each time a failed refresh ends the session
    terminations: AtomicU64,
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        tokens: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
        session: Arc<SessionState>,
    ) -> Self {
        Self {
            transport,
            tokens,
            navigator,
            session,
            refresh_gate: Mutex::new(()),
            terminations: AtomicU64::new(0),
        }
    }

    pub fn tokens(&self) -> &dyn TokenStore {
        self.tokens.as_ref()
    }

    pub fn navigator(&self) -> &dyn Navigator {
        self.navigator.as_ref()
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Send a request with bearer auth and the refresh-on-401 protocol.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let epoch = self.terminations.load(Ordering::SeqCst);
        let sent_token = self.tokens.get(TokenKind::Access);
        let error = match self.dispatch(&request, sent_token.clone()).await {
            Ok(response) => return Ok(response),
            Err(e) if e.is_unauthorized() => e,
            Err(e) => return Err(e),
        };

        // First 401 for this request: refresh once, retry once, and hand
        // back whatever the retry produces.
        debug!(path = %request.path, "Unauthorized, attempting token refresh");
        match self.refresh_after_unauthorized(sent_token.as_deref(), epoch).await {
            Some(token) => self.dispatch(&request, Some(token)).await,
            None => Err(error),
        }
    }

    /// Send and decode a JSON response body
    pub async fn get_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let path = request.path.clone();
        let response = self.send(request).await?;
        parse_json(&path, &response)
    }

    /// Send a login or registration request.
    ///
    /// Bearer auth is attached as usual, but a 401 here means the
    /// credentials were rejected, so it never starts a refresh.
    pub async fn send_credentials<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let path = request.path.clone();
        let token = self.tokens.get(TokenKind::Access);
        let response = self.dispatch(&request, token).await?;
        parse_json(&path, &response)
    }

    async fn dispatch(&self, request: &ApiRequest, bearer: Option<String>) -> Result<ApiResponse, ApiError> {
        let mut request = request.clone();
        request.bearer = bearer;
        let response = self.transport.send(&request).await?;
        if !response.status.is_success() {
            debug!(path = %request.path, status = %response.status, "Request failed");
        }
        response.into_result()
    }

    /// Obtain a fresh access token after a 401, or end the session.
    ///
    /// `sent_token` is the token the failed request carried. If another
    /// request already replaced it while we waited for the gate, that
    /// token is used without refreshing again. If a concurrent request
    /// already ended the session since `epoch`, this one fails quietly.
    async fn refresh_after_unauthorized(&self, sent_token: Option<&str>, epoch: u64) -> Option<String> {
        let _gate = self.refresh_gate.lock().await;

        if self.terminations.load(Ordering::SeqCst) != epoch {
            debug!("Session already ended by a concurrent request");
            return None;
        }

        if let Some(current) = self.tokens.get(TokenKind::Access) {
            if sent_token != Some(current.as_str()) {
                debug!("Access token already refreshed by a concurrent request");
                return Some(current);
            }
        }

        let Some(refresh_token) = self.tokens.get(TokenKind::Refresh) else {
            warn!("No refresh token available, ending session");
            self.terminate_session();
            return None;
        };

        match self.request_refresh(&refresh_token).await {
            Ok(access) => Some(access),
            Err(e) => {
                warn!(error = %e, "Token refresh failed, ending session");
                self.terminate_session();
                None
            }
        }
    }

    /// Exchange the refresh token for a new access token and store the result.
    /// Sent without bearer auth and never itself refreshed.
    async fn request_refresh(&self, refresh_token: &str) -> Result<String, ApiError> {
        let request = ApiRequest::post(REFRESH_PATH, json!(RefreshRequest { refresh_token }));
        let response = self.transport.send(&request).await?.into_result()?;
        let tokens: TokenResponse = parse_json(REFRESH_PATH, &response)?;

        let access = tokens
            .access()
            .ok_or_else(|| ApiError::InvalidResponse("Refresh response has no access token".to_string()))?
            .to_string();
        self.tokens
            .set(TokenKind::Access, &access, TokenKind::Access.lifetime());
        if let Some(refresh) = tokens.refresh() {
            self.tokens
                .set(TokenKind::Refresh, refresh, TokenKind::Refresh.lifetime());
        }
        debug!("Access token refreshed");
        Ok(access)
    }

    fn terminate_session(&self) {
        self.terminations.fetch_add(1, Ordering::SeqCst);
        self.tokens.clear();
        self.session.clear();
        self.navigator.redirect(ROOT_PATH);
    }
}

fn parse_json<T: DeserializeOwned>(path: &str, response: &ApiResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| {
        ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", path, e))
    })
}
