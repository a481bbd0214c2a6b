//! OAuth redirect handling.
//!
//! After the external provider finishes, the backend sends the browser to
//! the app root with `access_token` and `refresh_token` query parameters.
//! Those must be consumed and then removed from the visible URL.

use url::Url;

use super::tokens::TokenKind;

/// Provider entry point, relative to the API base
const OAUTH_LOGIN_PATH: &str = "auth/google/login";

/// Tokens carried by an OAuth callback URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// Absolute URL that starts the external login flow
pub fn login_url(api_base: &str) -> String {
    format!("{}/{}", api_base.trim_end_matches('/'), OAUTH_LOGIN_PATH)
}

/// Extract the token pair from a callback URL.
/// None unless a non-empty access token is present; the refresh token is optional.
pub fn callback_tokens(url: &Url) -> Option<CallbackTokens> {
    let param = |kind: TokenKind| {
        url.query_pairs()
            .find(|(key, _)| key == kind.key())
            .map(|(_, value)| value.into_owned())
    };
    let access_token = param(TokenKind::Access).filter(|t| !t.is_empty())?;
    Some(CallbackTokens {
        access_token,
        refresh_token: param(TokenKind::Refresh),
    })
}

/// The same URL with both token parameters removed, keeping any others.
pub fn strip_tokens(url: &Url) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| TokenKind::from_key(key).is_none())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut stripped = url.clone();
    if kept.is_empty() {
        stripped.set_query(None);
    } else {
        stripped.query_pairs_mut().clear().extend_pairs(kept);
    }
    stripped
}
