//! Application state shared by all operations.
//!
//! Holds the two API clients, the session manager they report to, and the
//! in-memory copy of the current session.

use std::sync::Arc;

use tokio::sync::RwLock;
use zeroize::Zeroize;

use crate::api::client::ApiClient;
use crate::config::{AppConfig, ConfigError, StorageBackend};
use crate::session::{FileStore, KeyValueStore, KeychainStore, LogoutPrompt, MemoryStore, Session, SessionManager};

pub struct AppState {
    /// General client: every user-facing operation.
    pub api: Arc<ApiClient>,

    /// Upload client with a request ceiling. Shares the session provider, so
    /// it reports session-ending 401s the same way.
    pub upload: Arc<ApiClient>,

    /// Persisted session and the one-time logout prompt.
    pub session: Arc<SessionManager>,

    /// Session restored or created by this process.
    pub current: RwLock<Option<Session>>,
}

impl AppState {
    pub fn new(config: &AppConfig, store: Arc<dyn KeyValueStore>, prompt: Arc<dyn LogoutPrompt>) -> Self {
        let session = Arc::new(SessionManager::new(store, prompt));
        Self {
            api: Arc::new(ApiClient::new(&config.api_base_url, session.clone())),
            upload: Arc::new(ApiClient::upload(
                &config.api_base_url,
                session.clone(),
                config.upload_timeout,
            )),
            session,
            current: RwLock::new(None),
        }
    }

    /// Build the state with the storage backend named in `config`.
    pub fn from_config(config: &AppConfig, prompt: Arc<dyn LogoutPrompt>) -> Result<Self, ConfigError> {
        Ok(Self::new(config, open_store(config)?, prompt))
    }

    /// Drop the in-memory session, wiping the token.
    pub async fn clear_current(&self) {
        let mut current = self.current.write().await;
        if let Some(ref mut session) = *current {
            session.token.zeroize();
        }
        *current = None;
    }
}

/// Open the configured key-value store.
pub fn open_store(config: &AppConfig) -> Result<Arc<dyn KeyValueStore>, ConfigError> {
    let store: Arc<dyn KeyValueStore> = match config.storage {
        StorageBackend::File => {
            let dir = config.session_dir()?;
            log::debug!("Using session file in {}", dir.display());
            Arc::new(FileStore::in_dir(&dir))
        }
        StorageBackend::Keychain => Arc::new(KeychainStore::default()),
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
    };
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{keys, LogOnlyPrompt, UserRecord};

    #[tokio::test]
    async fn test_file_store_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            data_dir: Some(dir.path().to_path_buf()),
            ..AppConfig::default()
        };

        let state = AppState::from_config(&config, Arc::new(LogOnlyPrompt)).unwrap();
        state.session.store().set(keys::TOKEN, "t").await.unwrap();

        assert!(dir.path().join("session.json").exists());
        assert_eq!(state.upload.base_url(), "http://localhost:3000");
    }

    #[tokio::test]
    async fn test_clear_current() {
        let config = AppConfig {
            storage: StorageBackend::Memory,
            ..AppConfig::default()
        };
        let state = AppState::from_config(&config, Arc::new(LogOnlyPrompt)).unwrap();
        *state.current.write().await = Some(Session {
            token: "abc123".into(),
            user: UserRecord {
                nama: "Budi".into(),
                id_karyawan: Some("7".into()),
            },
        });

        state.clear_current().await;
        assert!(state.current.read().await.is_none());
    }
}
