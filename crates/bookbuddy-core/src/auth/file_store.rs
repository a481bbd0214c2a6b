use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::Duration;
use tracing::warn;

use super::tokens::{StoredToken, TokenKind, TokenStore};

/// Token file name in cache directory
const TOKEN_FILE: &str = "tokens.json";

type Entries = HashMap<TokenKind, StoredToken>;

/// Token store persisted as JSON in the cache directory.
///
/// Every operation re-reads the file so several processes sharing the
/// directory see each other's writes. The mutex only serializes
/// read-modify-write cycles within this process.
pub struct FileTokenStore {
    cache_dir: PathBuf,
    lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.cache_dir.join(TOKEN_FILE)
    }

    fn load(path: &Path) -> Result<Entries> {
        if !path.exists() {
            return Ok(Entries::new());
        }
        let contents = std::fs::read_to_string(path).context("Failed to read token file")?;
        let mut entries: Entries =
            serde_json::from_str(&contents).context("Failed to parse token file")?;
        entries.retain(|_, token| !token.is_expired());
        Ok(entries)
    }

    fn save(path: &Path, entries: &Entries) -> Result<()> {
        if entries.is_empty() {
            if path.exists() {
                std::fs::remove_file(path).context("Failed to remove token file")?;
            }
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        std::fs::write(path, contents).context("Failed to write token file")?;
        Ok(())
    }

    fn load_or_empty(path: &Path) -> Entries {
        Self::load(path).unwrap_or_else(|e| {
            warn!(error = %e, path = %path.display(), "Ignoring unreadable token file");
            Entries::new()
        })
    }

    fn update(&self, apply: impl FnOnce(&mut Entries)) {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let path = self.path();
        let mut entries = Self::load_or_empty(&path);
        apply(&mut entries);
        if let Err(e) = Self::save(&path, &entries) {
            warn!(error = %e, "Failed to persist tokens");
        }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, kind: TokenKind) -> Option<String> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Self::load_or_empty(&self.path())
            .get(&kind)
            .and_then(|token| token.live_value().map(str::to_string))
    }

    fn set(&self, kind: TokenKind, value: &str, ttl: Duration) {
        self.update(|entries| {
            if ttl <= Duration::zero() {
                entries.remove(&kind);
            } else {
                entries.insert(kind, StoredToken::new(value, ttl));
            }
        });
    }

    fn clear(&self) {
        self.update(|entries| entries.clear());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().to_path_buf());
        store.set_pair("access", "refresh");

        let reopened = FileTokenStore::new(dir.path().to_path_buf());
        assert_eq!(reopened.get(TokenKind::Access).as_deref(), Some("access"));
        assert_eq!(reopened.get(TokenKind::Refresh).as_deref(), Some("refresh"));
    }

    #[test]
    fn test_expired_entries_not_returned() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().to_path_buf());

        let mut entries = Entries::new();
        entries.insert(
            TokenKind::Access,
            StoredToken {
                value: "stale".to_string(),
                expires_at: Utc::now() - Duration::minutes(1),
            },
        );
        entries.insert(TokenKind::Refresh, StoredToken::new("fresh", Duration::days(1)));
        FileTokenStore::save(&store.path(), &entries).unwrap();

        assert_eq!(store.get(TokenKind::Access), None);
        assert_eq!(store.get(TokenKind::Refresh).as_deref(), Some("fresh"));
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().to_path_buf());
        store.clear();
        assert!(!store.path().exists());

        store.set_pair("a", "r");
        assert!(store.path().exists());
        store.clear();
        assert!(!store.path().exists());
        assert!(!store.has(TokenKind::Access));
    }

    #[test]
    fn test_corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().to_path_buf());
        std::fs::write(store.path(), "not json").unwrap();

        assert_eq!(store.get(TokenKind::Access), None);
        store.set(TokenKind::Access, "new", Duration::hours(1));
        assert_eq!(store.get(TokenKind::Access).as_deref(), Some("new"));
    }
}
