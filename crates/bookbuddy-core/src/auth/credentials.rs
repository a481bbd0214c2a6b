use anyhow::{Context, Result};
use chrono::Duration;
use keyring::Entry;
use tracing::warn;

use super::tokens::{StoredToken, TokenKind, TokenStore};

const SERVICE_NAME: &str = "bookbuddy";

/// Token store backed by the OS keychain.
///
/// Each token kind is one keychain entry whose secret is the JSON-encoded
/// token with its expiry, since the keychain has no notion of lifetime.
pub struct KeyringTokenStore {
    service: String,
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new(SERVICE_NAME)
    }
}

impl KeyringTokenStore {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self, kind: TokenKind) -> Result<Entry> {
        Entry::new(&self.service, kind.key()).context("Failed to create keyring entry")
    }

    fn read(&self, kind: TokenKind) -> Result<Option<StoredToken>> {
        let entry = self.entry(kind)?;
        let secret = match entry.get_password() {
            Ok(secret) => secret,
            Err(keyring::Error::NoEntry) => return Ok(None),
            Err(e) => return Err(e).context("Failed to retrieve token from keychain"),
        };
        let token: StoredToken =
            serde_json::from_str(&secret).context("Failed to parse keychain token")?;
        if token.is_expired() {
            self.delete(kind)?;
            return Ok(None);
        }
        Ok(Some(token))
    }

    fn write(&self, kind: TokenKind, token: &StoredToken) -> Result<()> {
        let secret = serde_json::to_string(token)?;
        self.entry(kind)?
            .set_password(&secret)
            .context("Failed to store token in keychain")
    }

    fn delete(&self, kind: TokenKind) -> Result<()> {
        match self.entry(kind)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}

impl TokenStore for KeyringTokenStore {
    fn get(&self, kind: TokenKind) -> Option<String> {
        match self.read(kind) {
            Ok(token) => token.and_then(|t| t.live_value().map(str::to_string)),
            Err(e) => {
                warn!(error = %e, kind = kind.key(), "Keychain read failed");
                None
            }
        }
    }

    fn set(&self, kind: TokenKind, value: &str, ttl: Duration) {
        let result = if ttl <= Duration::zero() {
            self.delete(kind)
        } else {
            self.write(kind, &StoredToken::new(value, ttl))
        };
        if let Err(e) = result {
            warn!(error = %e, kind = kind.key(), "Keychain write failed");
        }
    }

    fn clear(&self) {
        for kind in TokenKind::ALL {
            if let Err(e) = self.delete(kind) {
                warn!(error = %e, kind = kind.key(), "Keychain delete failed");
            }
        }
    }
}
