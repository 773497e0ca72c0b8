//! Session state: persisted credentials, restore on start, and the one-time
//! logout flow when the server invalidates the session.
//!
//! `SessionManager` is the single owner of the prompt guard. The API client
//! only sees it through the `SessionProvider` trait, so tests can hand the
//! client an in-memory store and a scripted prompt.

pub mod guard;
pub mod invalidation;
pub mod keychain;
pub mod prompt;
pub mod store;

pub use guard::PromptGuard;
pub use invalidation::{Invalidation, InvalidationNotice};
pub use keychain::KeychainStore;
pub use prompt::{LogOnlyPrompt, LogoutPrompt, TerminalPrompt};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::api::types::lenient;

/// Storage keys written by the client.
pub mod keys {
    pub const TOKEN: &str = "token";
    pub const USER: &str = "user";
    pub const EMPLOYEE_ID: &str = "id_karyawan";
    pub const REMEMBER_USERNAME: &str = "remember_username";
    pub const REMEMBER_PASSWORD: &str = "remember_password";
    pub const REMEMBER_ME: &str = "remember_me";

    /// Keys that make up a logged-in session.
    pub const SESSION: [&str; 3] = [TOKEN, USER, EMPLOYEE_ID];

    /// Every key the client may write.
    pub const ALL: [&str; 6] = [
        TOKEN,
        USER,
        EMPLOYEE_ID,
        REMEMBER_USERNAME,
        REMEMBER_PASSWORD,
        REMEMBER_ME,
    ];
}

/// Minimal user record stored alongside the token.
///
/// The full login response is persisted; only these fields are read back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub nama: String,
    #[serde(default, deserialize_with = "lenient::option")]
    pub id_karyawan: Option<String>,
}

/// A restored or freshly created session.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: UserRecord,
}

impl Session {
    pub fn employee_id(&self) -> Option<&str> {
        self.user.id_karyawan.as_deref()
    }
}

/// Username and password saved by "remember me".
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// What the API client needs from the session layer.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// The persisted bearer token, if any.
    async fn access_token(&self) -> Result<Option<String>, StoreError>;

    /// Called for every 401 that ends the session. Must not block: the caller
    /// returns its error as soon as this returns.
    fn session_invalidated(&self, invalidation: Invalidation);
}

pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    prompt: Arc<dyn LogoutPrompt>,
    guard: Arc<PromptGuard>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn KeyValueStore>, prompt: Arc<dyn LogoutPrompt>) -> Self {
        Self {
            store,
            prompt,
            guard: Arc::new(PromptGuard::new()),
            pending: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Take the prompt guard. Returns `false` if a prompt is already showing.
    pub fn begin_invalidation_prompt(&self) -> bool {
        self.guard.begin()
    }

    pub fn end_invalidation_prompt(&self) {
        self.guard.end();
    }

    pub fn is_prompt_active(&self) -> bool {
        self.guard.is_active()
    }

    /// Persist a new session after login.
    ///
    /// `user_json` is stored verbatim; the employee id is also stored on its
    /// own when present.
    pub async fn save(&self, token: &str, user_json: &str, employee_id: Option<&str>) -> Result<(), StoreError> {
        self.store.set(keys::TOKEN, token).await?;
        self.store.set(keys::USER, user_json).await?;
        if let Some(id) = employee_id {
            self.store.set(keys::EMPLOYEE_ID, id).await?;
        }
        Ok(())
    }

    /// Read the persisted session. Returns `None` if the token or user record
    /// is missing, or the user record does not parse.
    pub async fn restore(&self) -> Result<Option<Session>, StoreError> {
        let Some(token) = self.store.get(keys::TOKEN).await? else {
            return Ok(None);
        };
        let Some(user_json) = self.store.get(keys::USER).await? else {
            return Ok(None);
        };

        let mut user: UserRecord = match serde_json::from_str(&user_json) {
            Ok(user) => user,
            Err(e) => {
                log::warn!("Stored user record is unreadable, ignoring session: {}", e);
                return Ok(None);
            }
        };
        if user.id_karyawan.is_none() {
            user.id_karyawan = self.store.get(keys::EMPLOYEE_ID).await?;
        }

        Ok(Some(Session { token, user }))
    }

    /// Employee id of the logged-in user.
    pub async fn employee_id(&self) -> Result<Option<String>, StoreError> {
        if let Some(id) = self.store.get(keys::EMPLOYEE_ID).await? {
            return Ok(Some(id));
        }
        Ok(self.restore().await?.and_then(|s| s.user.id_karyawan))
    }

    /// Remove the session keys. Remembered credentials are kept.
    pub async fn logout(&self) -> Result<(), StoreError> {
        for key in keys::SESSION {
            self.store.remove(key).await?;
        }
        Ok(())
    }

    /// Save or forget the login form credentials.
    pub async fn remember(&self, credentials: Option<&Credentials>) -> Result<(), StoreError> {
        match credentials {
            Some(c) => {
                self.store.set(keys::REMEMBER_USERNAME, &c.username).await?;
                self.store.set(keys::REMEMBER_PASSWORD, &c.password).await?;
                self.store.set(keys::REMEMBER_ME, "true").await?;
            }
            None => {
                self.store.remove(keys::REMEMBER_USERNAME).await?;
                self.store.remove(keys::REMEMBER_PASSWORD).await?;
                self.store.set(keys::REMEMBER_ME, "false").await?;
            }
        }
        Ok(())
    }

    /// Credentials saved by "remember me". Only returned when the flag is
    /// `"true"` and both fields are present.
    pub async fn remembered(&self) -> Result<Option<Credentials>, StoreError> {
        if self.store.get(keys::REMEMBER_ME).await?.as_deref() != Some("true") {
            return Ok(None);
        }
        let username = self.store.get(keys::REMEMBER_USERNAME).await?;
        let password = self.store.get(keys::REMEMBER_PASSWORD).await?;
        Ok(match (username, password) {
            (Some(username), Some(password)) => Some(Credentials { username, password }),
            _ => None,
        })
    }

    /// Wait for the in-flight logout prompt (if any) to be acknowledged and
    /// for local state to be cleared.
    pub async fn settle(&self) {
        let handle = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                log::warn!("Logout prompt task failed: {}", e);
            }
        }
    }
}

#[async_trait]
impl SessionProvider for SessionManager {
    async fn access_token(&self) -> Result<Option<String>, StoreError> {
        self.store.get(keys::TOKEN).await
    }

    fn session_invalidated(&self, invalidation: Invalidation) {
        let Some(notice) = invalidation.notice() else {
            return;
        };

        if !self.begin_invalidation_prompt() {
            log::debug!("Logout prompt already showing, suppressing {:?}", invalidation);
            return;
        }

        log::info!("Session ended by server ({:?}), prompting user", invalidation);

        let store = Arc::clone(&self.store);
        let prompt = Arc::clone(&self.prompt);
        let guard = Arc::clone(&self.guard);

        let handle = tokio::spawn(async move {
            prompt.acknowledge(&notice).await;
            // Everything goes, remembered credentials included
            if let Err(e) = store.clear().await {
                log::warn!("Failed to clear local session: {}", e);
            }
            guard.end();
            log::info!("Local session cleared after {:?}", notice.kind);
        });

        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }
}
