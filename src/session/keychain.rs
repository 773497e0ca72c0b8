//! OS keychain-backed session storage.
//!
//! Each key is a separate keychain entry under one service name. The keychain
//! cannot enumerate entries, so `clear` deletes every key the client is known
//! to write (see `session::keys::ALL`).
//!
//! Native stores are compiled in for macOS, Windows and Linux (kernel
//! keyutils). Elsewhere `keyring` falls back to its in-memory mock, which
//! keeps nothing between entries.

use async_trait::async_trait;
use keyring::Entry;

use super::keys;
use super::store::{KeyValueStore, StoreError};

/// Default keychain service name.
pub const SERVICE_NAME: &str = "id.absensi.client";

impl From<keyring::Error> for StoreError {
    fn from(err: keyring::Error) -> Self {
        StoreError::Keychain(err.to_string())
    }
}

pub struct KeychainStore {
    service: String,
}

impl KeychainStore {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry, StoreError> {
        Ok(Entry::new(&self.service, key)?)
    }
}

impl Default for KeychainStore {
    fn default() -> Self {
        Self::new(SERVICE_NAME)
    }
}

#[async_trait]
impl KeyValueStore for KeychainStore {
    /// Returns `None` if no entry exists.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entry(key)?.set_password(value)?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()), // already deleted
            Err(e) => Err(e.into()),
        }
    }

    async fn clear(&self) -> Result<(), StoreError> {
        for key in keys::ALL {
            self.remove(key).await?;
        }
        log::debug!("Cleared {} keychain entries for {}", keys::ALL.len(), self.service);
        Ok(())
    }
}
