//! Bearer token storage with per-key expiry.
//!
//! The client keeps exactly two opaque tokens: a short-lived access token
//! and a longer-lived refresh token. Every backend enforces expiry itself,
//! so callers never see a token past its lifetime.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::cookie::{self, CookiePolicy};

/// Access token lifetime in minutes.
/// Matches the backend's ACCESS_TOKEN_EXPIRE_MINUTES.
const ACCESS_TOKEN_MINUTES: i64 = 60;

/// Refresh token lifetime in days.
const REFRESH_TOKEN_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub const ALL: [TokenKind; 2] = [TokenKind::Access, TokenKind::Refresh];

    /// Storage key, also used as the cookie name and OAuth query parameter
    pub fn key(&self) -> &'static str {
        match self {
            TokenKind::Access => "access_token",
            TokenKind::Refresh => "refresh_token",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    /// Fixed lifetime applied when a token of this kind is stored
    pub fn lifetime(&self) -> Duration {
        match self {
            TokenKind::Access => Duration::minutes(ACCESS_TOKEN_MINUTES),
            TokenKind::Refresh => Duration::days(REFRESH_TOKEN_DAYS),
        }
    }
}

/// A stored token with its absolute expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl StoredToken {
    pub fn new(value: &str, ttl: Duration) -> Self {
        Self {
            value: value.to_string(),
            expires_at: Utc::now() + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// The value, if the token is still live and not empty.
    /// An empty token is stored but never handed out.
    pub fn live_value(&self) -> Option<&str> {
        if self.is_expired() || self.value.is_empty() {
            None
        } else {
            Some(&self.value)
        }
    }

    /// Remaining lifetime in whole seconds (zero once expired)
    pub fn max_age_secs(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds().max(0)
    }
}

/// Key-value credential store with per-key expiry.
///
/// All operations are total. Backends that can fail internally log and
/// behave as if the token were absent.
pub trait TokenStore: Send + Sync {
    /// Live token of the given kind
    fn get(&self, kind: TokenKind) -> Option<String>;

    /// Store a token that becomes unavailable after `ttl`.
    /// A non-positive `ttl` removes it.
    fn set(&self, kind: TokenKind, value: &str, ttl: Duration);

    /// Remove both tokens. Safe to call when nothing is stored.
    fn clear(&self);

    fn has(&self, kind: TokenKind) -> bool {
        self.get(kind).is_some()
    }

    /// Store both tokens with their standard lifetimes
    fn set_pair(&self, access: &str, refresh: &str) {
        self.set(TokenKind::Access, access, TokenKind::Access.lifetime());
        self.set(TokenKind::Refresh, refresh, TokenKind::Refresh.lifetime());
    }
}

/// In-process token jar.
///
/// Behaves like the browser cookie jar the tokens live in on the web:
/// it can be seeded from a `Cookie` request header and can render its
/// contents as `Set-Cookie` values for a host serving the web front end.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: Mutex<HashMap<TokenKind, StoredToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from a `Cookie` header. Tokens found there get the
    /// standard lifetime for their kind.
    pub fn from_cookie_header(header: &str) -> Self {
        let store = Self::new();
        for kind in TokenKind::ALL {
            if let Some(value) = cookie::read_cookie(header, kind.key()) {
                store.set(kind, &value, kind.lifetime());
            }
        }
        store
    }

    /// Render the jar as `Set-Cookie` values: one per live entry, plus a
    /// deletion for each kind that is absent or expired.
    pub fn set_cookie_headers(&self, policy: &CookiePolicy) -> Vec<String> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        TokenKind::ALL
            .iter()
            .map(|kind| match entries.get(kind).filter(|t| !t.is_expired()) {
                Some(token) => {
                    cookie::set_cookie(kind.key(), &token.value, token.max_age_secs(), policy)
                }
                None => cookie::delete_cookie(kind.key(), policy),
            })
            .collect()
    }

    /// Raw entry including empty values, for inspection by hosts and tests
    pub fn entry(&self, kind: TokenKind) -> Option<StoredToken> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(&kind).filter(|t| !t.is_expired()).cloned()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, kind: TokenKind) -> Option<String> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(&kind) {
            Some(token) if token.is_expired() => {
                entries.remove(&kind);
                None
            }
            Some(token) => token.live_value().map(str::to_string),
            None => None,
        }
    }

    fn set(&self, kind: TokenKind, value: &str, ttl: Duration) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if ttl <= Duration::zero() {
            entries.remove(&kind);
        } else {
            entries.insert(kind, StoredToken::new(value, ttl));
        }
    }

    fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let store = MemoryTokenStore::new();
        assert!(!store.has(TokenKind::Access));

        store.set(TokenKind::Access, "abc", Duration::minutes(5));
        assert_eq!(store.get(TokenKind::Access).as_deref(), Some("abc"));
        assert!(store.has(TokenKind::Access));
        assert!(!store.has(TokenKind::Refresh));
    }

    #[test]
    fn test_expired_value_never_returned() {
        let store = MemoryTokenStore::new();
        store.set(TokenKind::Access, "abc", Duration::minutes(5));
        store
            .entries
            .lock()
            .unwrap()
            .get_mut(&TokenKind::Access)
            .unwrap()
            .expires_at = Utc::now() - Duration::seconds(1);

        assert_eq!(store.get(TokenKind::Access), None);
        assert!(store.entry(TokenKind::Access).is_none());
    }

    #[test]
    fn test_non_positive_ttl_removes() {
        let store = MemoryTokenStore::new();
        store.set(TokenKind::Refresh, "r", Duration::days(1));
        store.set(TokenKind::Refresh, "r", Duration::zero());
        assert_eq!(store.get(TokenKind::Refresh), None);
    }

    #[test]
    fn test_set_pair_uses_standard_lifetimes() {
        let store = MemoryTokenStore::new();
        store.set_pair("a", "r");

        let access = store.entry(TokenKind::Access).unwrap();
        let refresh = store.entry(TokenKind::Refresh).unwrap();
        assert!((access.max_age_secs() - 3600).abs() <= 1);
        assert!((refresh.max_age_secs() - 7 * 24 * 3600).abs() <= 1);
    }

    #[test]
    fn test_empty_value_stored_but_reads_absent() {
        let store = MemoryTokenStore::new();
        store.set_pair("a", "");
        assert_eq!(store.get(TokenKind::Refresh), None);
        assert_eq!(store.entry(TokenKind::Refresh).unwrap().value, "");
    }

    #[test]
    fn test_clear_is_safe_when_empty() {
        let store = MemoryTokenStore::new();
        store.clear();
        store.set_pair("a", "r");
        store.clear();
        assert!(!store.has(TokenKind::Access));
        assert!(!store.has(TokenKind::Refresh));
    }

    #[test]
    fn test_from_cookie_header() {
        let store = MemoryTokenStore::from_cookie_header("theme=dark; access_token=abc; refresh_token=");
        assert_eq!(store.get(TokenKind::Access).as_deref(), Some("abc"));
        assert_eq!(store.get(TokenKind::Refresh), None);
    }

    #[test]
    fn test_set_cookie_headers() {
        let store = MemoryTokenStore::new();
        store.set(TokenKind::Access, "abc", Duration::hours(1));

        let headers = store.set_cookie_headers(&CookiePolicy::default());
        assert_eq!(headers.len(), 2);
        assert!(headers[0].starts_with("access_token=abc; Path=/; Max-Age="));
        assert_eq!(headers[1], "refresh_token=; Path=/; Max-Age=0");
    }

    #[test]
    fn test_token_kind_keys() {
        assert_eq!(TokenKind::from_key("access_token"), Some(TokenKind::Access));
        assert_eq!(TokenKind::from_key("refresh_token"), Some(TokenKind::Refresh));
        assert_eq!(TokenKind::from_key("id_token"), None);
    }
}
