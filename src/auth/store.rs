//! Durable storage for the bearer token pair.
//!
//! The platform persists exactly two opaque tokens between runs: written on
//! login, replaced on refresh, cleared on logout or failed resolution.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Environment variable overriding the default token file location.
pub const TOKEN_FILE_ENV: &str = "PRICEWATCH_TOKEN_FILE";

/// The persisted token pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Where the token pair lives between runs.
///
/// `load` returning `Ok(None)` means "no stored session"; an `Err` from any
/// method is a storage fault, which callers treat the same as a failed
/// session resolution.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<StoredTokens>, AuthError>;
    fn save(&self, tokens: &StoredTokens) -> Result<(), AuthError>;
    fn clear(&self) -> Result<(), AuthError>;
}

// ─── FileTokenStore ──────────────────────────────────────────────────────────

/// JSON-file-backed store, the default for native clients.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolve the default location: `$PRICEWATCH_TOKEN_FILE`, falling back
    /// to `$HOME/.pricewatch/tokens.json`.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var(TOKEN_FILE_ENV) {
            return PathBuf::from(path);
        }
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        Path::new(&home).join(".pricewatch").join("tokens.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileTokenStore {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<StoredTokens>, AuthError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AuthError::TokenStorage(e.to_string())),
        };
        let tokens =
            serde_json::from_str(&raw).map_err(|e| AuthError::TokenStorage(e.to_string()))?;
        Ok(Some(tokens))
    }

    fn save(&self, tokens: &StoredTokens) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| AuthError::TokenStorage(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(tokens)
            .map_err(|e| AuthError::TokenStorage(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| AuthError::TokenStorage(e.to_string()))?;

        // Tokens are secrets: owner-only on platforms that can express it.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600));
        }

        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::TokenStorage(e.to_string())),
        }
    }
}

// ─── MemoryTokenStore ────────────────────────────────────────────────────────

/// In-memory store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    inner: Mutex<Option<StoredTokens>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start pre-populated, as if a previous run had logged in.
    pub fn with_tokens(tokens: StoredTokens) -> Self {
        Self {
            inner: Mutex::new(Some(tokens)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<StoredTokens>, AuthError> {
        let guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(guard.clone())
    }

    fn save(&self, tokens: &StoredTokens) -> Result<(), AuthError> {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(tokens.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> StoredTokens {
        StoredTokens {
            access_token: "acc".into(),
            refresh_token: "ref".into(),
        }
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.load().unwrap(), None);

        store.save(&pair()).unwrap();
        assert_eq!(store.load().unwrap(), Some(pair()));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = std::env::temp_dir().join("pricewatch-store-test");
        let _ = std::fs::remove_dir_all(&dir);
        let store = FileTokenStore::new(dir.join("tokens.json"));

        assert_eq!(store.load().unwrap(), None);
        store.save(&pair()).unwrap();
        assert_eq!(store.load().unwrap(), Some(pair()));

        // clear is idempotent
        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_file_store_corrupt_file_is_an_error() {
        let dir = std::env::temp_dir().join("pricewatch-store-corrupt");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tokens.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileTokenStore::new(&path);
        assert!(store.load().is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
