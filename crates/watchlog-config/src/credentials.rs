use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use toml;

const ACCESS_TOKEN_KEY: &str = "trakt_access_token";
const REFRESH_TOKEN_KEY: &str = "trakt_refresh_token";
const TOKEN_EXPIRES_KEY: &str = "trakt_token_expires";
const LAST_SYNC_KEY: &str = "last_sync_at";

#[derive(Debug, Serialize, Deserialize, Default)]
struct CredentialsData {
    #[serde(flatten)]
    data: HashMap<String, String>,
}

/// Flat key/value TOML file holding the Trakt token triple and the
/// last-sync cursor.
pub struct CredentialStore {
    path: PathBuf,
    credentials: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            credentials: HashMap::new(),
        }
    }

    pub fn load(&mut self) -> Result<()> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            let creds_data: CredentialsData = toml::from_str(&content)?;
            self.credentials = creds_data.data;
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let creds_data = CredentialsData {
            data: self.credentials.clone(),
        };
        let content = toml::to_string_pretty(&creds_data)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.credentials.get(key)
    }

    pub fn set(&mut self, key: String, value: String) {
        self.credentials.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) {
        self.credentials.remove(key);
    }

    // Convenience methods for the Trakt token triple

    pub fn get_access_token(&self) -> Option<&String> {
        self.get(ACCESS_TOKEN_KEY)
    }

    pub fn set_access_token(&mut self, token: String) {
        self.set(ACCESS_TOKEN_KEY.to_string(), token);
    }

    pub fn get_refresh_token(&self) -> Option<&String> {
        self.get(REFRESH_TOKEN_KEY)
    }

    pub fn set_refresh_token(&mut self, token: String) {
        self.set(REFRESH_TOKEN_KEY.to_string(), token);
    }

    pub fn get_token_expires(&self) -> Option<DateTime<Utc>> {
        self.get(TOKEN_EXPIRES_KEY)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn set_token_expires(&mut self, expires: DateTime<Utc>) {
        self.set(TOKEN_EXPIRES_KEY.to_string(), expires.to_rfc3339());
    }

    pub fn clear_tokens(&mut self) {
        self.remove(ACCESS_TOKEN_KEY);
        self.remove(REFRESH_TOKEN_KEY);
        self.remove(TOKEN_EXPIRES_KEY);
    }

    // Sync cursor

    pub fn get_last_sync(&self) -> Option<DateTime<Utc>> {
        self.get(LAST_SYNC_KEY)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn set_last_sync(&mut self, timestamp: DateTime<Utc>) {
        self.set(LAST_SYNC_KEY.to_string(), timestamp.to_rfc3339());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_credential_store_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();

        let mut store = CredentialStore::new(path.clone());
        store.set_access_token("test_token".to_string());
        store.set_refresh_token("test_refresh".to_string());
        store.save().unwrap();

        let mut loaded_store = CredentialStore::new(path);
        loaded_store.load().unwrap();
        assert_eq!(
            loaded_store.get_access_token(),
            Some(&"test_token".to_string())
        );
        assert_eq!(
            loaded_store.get_refresh_token(),
            Some(&"test_refresh".to_string())
        );
    }

    #[test]
    fn test_credential_store_token_expires_roundtrip() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();

        let mut store = CredentialStore::new(path.clone());
        let expires = Utc::now() + chrono::Duration::hours(1);
        store.set_token_expires(expires);
        store.save().unwrap();

        let mut loaded_store = CredentialStore::new(path);
        loaded_store.load().unwrap();
        let loaded_expires = loaded_store.get_token_expires().unwrap();
        // Allow 1 second difference for serialization
        assert!((loaded_expires - expires).num_seconds().abs() < 2);
    }

    #[test]
    fn test_credential_store_clear_tokens_keeps_cursor() {
        let mut store = CredentialStore::new(PathBuf::from("/tmp/test"));
        store.set_access_token("a".to_string());
        store.set_refresh_token("r".to_string());
        store.set_token_expires(Utc::now());
        store.set_last_sync(Utc::now());

        store.clear_tokens();
        assert_eq!(store.get_access_token(), None);
        assert_eq!(store.get_refresh_token(), None);
        assert!(store.get_token_expires().is_none());
        assert!(store.get_last_sync().is_some());
    }

    #[test]
    fn test_credential_store_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CredentialStore::new(dir.path().join("credentials.toml"));
        store.load().unwrap();
        assert_eq!(store.get_access_token(), None);
        assert!(store.get_last_sync().is_none());
    }
}
