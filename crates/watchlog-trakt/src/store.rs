use chrono::{DateTime, Duration, Utc};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::{OnceCell, RwLock};
use tracing::debug;

use watchlog_config::CredentialStore;

use crate::error::TraktError;

/// Safety margin subtracted from the provider's `expires_in` at write time,
/// so a token is never used in its final minute.
const EXPIRY_BUFFER_SECS: i64 = 60;

/// Snapshot of everything the engine persists.
#[derive(Debug, Clone, Default)]
pub struct StoredSettings {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_sync_at: Option<DateTime<Utc>>,
}

/// Narrow contract to the persistence collaborator. The engine only ever
/// reads/writes the token triple and the last-sync cursor through this.
pub trait SyncStore: Send + Sync {
    fn settings(&self) -> Result<StoredSettings, TraktError>;
    fn save_tokens(
        &self,
        access: &str,
        refresh: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), TraktError>;
    fn clear_tokens(&self) -> Result<(), TraktError>;
    fn update_last_sync(&self, at: DateTime<Utc>) -> Result<(), TraktError>;
}

#[derive(Debug, Clone)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Single source of truth for the current OAuth token.
///
/// The persisted token is loaded into the in-memory cache at most once per
/// process lifetime; the load is single-flight. A token past its (already
/// buffered) expiry is treated as absent rather than served stale, so expiry
/// surfaces as an authentication error and the caller re-runs the OAuth
/// flow. No refresh-token exchange happens here.
pub struct TokenStore {
    store: Arc<dyn SyncStore>,
    loaded: OnceCell<()>,
    cached: RwLock<Option<Token>>,
}

impl TokenStore {
    pub fn new(store: Arc<dyn SyncStore>) -> Self {
        Self {
            store,
            loaded: OnceCell::new(),
            cached: RwLock::new(None),
        }
    }

    async fn ensure_loaded(&self) -> Result<(), TraktError> {
        self.loaded
            .get_or_try_init(|| async {
                let settings = self.store.settings()?;
                if let (Some(access), Some(expires_at)) =
                    (settings.access_token, settings.expires_at)
                {
                    let token = Token {
                        access_token: access,
                        refresh_token: settings.refresh_token.unwrap_or_default(),
                        expires_at,
                    };
                    debug!(expires_at = %token.expires_at, "loaded persisted Trakt token");
                    *self.cached.write().await = Some(token);
                }
                Ok(())
            })
            .await
            .map(|_| ())
    }

    pub async fn is_authenticated(&self) -> Result<bool, TraktError> {
        Ok(self.access_token().await?.is_some())
    }

    /// Current access token, or `None` when no token is stored or the stored
    /// one has expired.
    pub async fn access_token(&self) -> Result<Option<String>, TraktError> {
        self.ensure_loaded().await?;
        let cached = self.cached.read().await;
        Ok(cached
            .as_ref()
            .filter(|token| token.expires_at > Utc::now())
            .map(|token| token.access_token.clone()))
    }

    /// Persist a fresh token pair, buffering the expiry, then update the
    /// cache. Persistence is written through before the cache changes.
    pub async fn store_token(
        &self,
        access: &str,
        refresh: &str,
        expires_in_secs: u64,
    ) -> Result<(), TraktError> {
        self.ensure_loaded().await?;
        let expires_at = Utc::now() + Duration::seconds(expires_in_secs as i64 - EXPIRY_BUFFER_SECS);
        self.store.save_tokens(access, refresh, expires_at)?;
        *self.cached.write().await = Some(Token {
            access_token: access.to_string(),
            refresh_token: refresh.to_string(),
            expires_at,
        });
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), TraktError> {
        self.ensure_loaded().await?;
        self.store.clear_tokens()?;
        *self.cached.write().await = None;
        Ok(())
    }
}

/// `SyncStore` backed by the TOML credential file.
pub struct CredentialSyncStore {
    inner: Mutex<CredentialStore>,
}

impl CredentialSyncStore {
    pub fn open(path: PathBuf) -> Result<Self, TraktError> {
        let mut store = CredentialStore::new(path);
        store
            .load()
            .map_err(|e| TraktError::Store(e.to_string()))?;
        Ok(Self {
            inner: Mutex::new(store),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, CredentialStore>, TraktError> {
        self.inner
            .lock()
            .map_err(|_| TraktError::Store("credential store lock poisoned".to_string()))
    }
}

impl SyncStore for CredentialSyncStore {
    fn settings(&self) -> Result<StoredSettings, TraktError> {
        let store = self.lock()?;
        Ok(StoredSettings {
            access_token: store.get_access_token().cloned(),
            refresh_token: store.get_refresh_token().cloned(),
            expires_at: store.get_token_expires(),
            last_sync_at: store.get_last_sync(),
        })
    }

    fn save_tokens(
        &self,
        access: &str,
        refresh: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), TraktError> {
        let mut store = self.lock()?;
        store.set_access_token(access.to_string());
        store.set_refresh_token(refresh.to_string());
        store.set_token_expires(expires_at);
        store.save().map_err(|e| TraktError::Store(e.to_string()))
    }

    fn clear_tokens(&self) -> Result<(), TraktError> {
        let mut store = self.lock()?;
        store.clear_tokens();
        store.save().map_err(|e| TraktError::Store(e.to_string()))
    }

    fn update_last_sync(&self, at: DateTime<Utc>) -> Result<(), TraktError> {
        let mut store = self.lock()?;
        store.set_last_sync(at);
        store.save().map_err(|e| TraktError::Store(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// In-memory collaborator for exercising the token lifecycle.
    #[derive(Default)]
    struct MemoryStore {
        settings: Mutex<StoredSettings>,
    }

    impl SyncStore for MemoryStore {
        fn settings(&self) -> Result<StoredSettings, TraktError> {
            Ok(self.settings.lock().unwrap().clone())
        }

        fn save_tokens(
            &self,
            access: &str,
            refresh: &str,
            expires_at: DateTime<Utc>,
        ) -> Result<(), TraktError> {
            let mut settings = self.settings.lock().unwrap();
            settings.access_token = Some(access.to_string());
            settings.refresh_token = Some(refresh.to_string());
            settings.expires_at = Some(expires_at);
            Ok(())
        }

        fn clear_tokens(&self) -> Result<(), TraktError> {
            let mut settings = self.settings.lock().unwrap();
            settings.access_token = None;
            settings.refresh_token = None;
            settings.expires_at = None;
            Ok(())
        }

        fn update_last_sync(&self, at: DateTime<Utc>) -> Result<(), TraktError> {
            self.settings.lock().unwrap().last_sync_at = Some(at);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_store_token_applies_expiry_buffer() {
        let backend = Arc::new(MemoryStore::default());
        let tokens = TokenStore::new(backend.clone());

        let before = Utc::now();
        tokens.store_token("access", "refresh", 3600).await.unwrap();
        let after = Utc::now();

        let persisted = backend.settings().unwrap().expires_at.unwrap();
        assert!(persisted >= before + Duration::seconds(3600 - 60));
        assert!(persisted <= after + Duration::seconds(3600 - 60));
        assert!(tokens.is_authenticated().await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_token_is_treated_as_absent() {
        let backend = Arc::new(MemoryStore::default());
        let tokens = TokenStore::new(backend);

        // expires_in of 60 collapses to an expiry of "now" after the buffer
        tokens.store_token("access", "refresh", 60).await.unwrap();
        assert!(!tokens.is_authenticated().await.unwrap());
        assert_eq!(tokens.access_token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_persisted_token_is_loaded_once() {
        let backend = Arc::new(MemoryStore::default());
        backend
            .save_tokens("persisted", "r", Utc::now() + Duration::hours(1))
            .unwrap();

        let tokens = TokenStore::new(backend.clone());
        assert_eq!(
            tokens.access_token().await.unwrap(),
            Some("persisted".to_string())
        );

        // A change behind the store's back is not re-read; the cache is
        // loaded exactly once per process lifetime.
        backend.clear_tokens().unwrap();
        assert_eq!(
            tokens.access_token().await.unwrap(),
            Some("persisted".to_string())
        );
    }

    #[tokio::test]
    async fn test_clear_removes_cache_and_persistence() {
        let backend = Arc::new(MemoryStore::default());
        let tokens = TokenStore::new(backend.clone());

        tokens.store_token("access", "refresh", 3600).await.unwrap();
        tokens.clear().await.unwrap();

        assert!(!tokens.is_authenticated().await.unwrap());
        assert!(backend.settings().unwrap().access_token.is_none());
    }

    #[test]
    fn test_credential_sync_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.toml");

        let store = CredentialSyncStore::open(path.clone()).unwrap();
        let expires = Utc::now() + Duration::hours(2);
        store.save_tokens("a", "r", expires).unwrap();
        store.update_last_sync(Utc::now()).unwrap();

        let reopened = CredentialSyncStore::open(path).unwrap();
        let settings = reopened.settings().unwrap();
        assert_eq!(settings.access_token.as_deref(), Some("a"));
        assert_eq!(settings.refresh_token.as_deref(), Some("r"));
        assert!(settings.last_sync_at.is_some());
        assert!((settings.expires_at.unwrap() - expires).num_seconds().abs() < 2);
    }
}
