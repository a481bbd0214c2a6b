use serde::{Deserialize, Serialize};

/// Body of `/auth/login` and `/auth/register`
#[derive(Debug, Clone, Serialize)]
pub struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of `/auth/refresh`
#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Token pair issued by login, refresh and the OAuth callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl TokenResponse {
    /// Access token, ignoring an empty string
    pub fn access(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }

    /// Refresh token, ignoring an empty string
    pub fn refresh(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login_response_without_refresh() {
        let json = r#"{"access_token": "eyJ.a.b", "token_type": "bearer"}"#;
        let resp: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.access(), Some("eyJ.a.b"));
        assert_eq!(resp.refresh(), None);
    }

    #[test]
    fn test_empty_tokens_ignored() {
        let resp: TokenResponse =
            serde_json::from_str(r#"{"access_token": "", "refresh_token": ""}"#).unwrap();
        assert_eq!(resp.access(), None);
        assert_eq!(resp.refresh(), None);
    }
}
