//! Runtime configuration from environment variables.
//!
//! `.env` is loaded by the binary before `AppConfig::from_env` runs, so
//! values there behave like real environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::api::client::UPLOAD_TIMEOUT;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Directory under the platform data dir used by the file store.
pub const APP_DIR: &str = "absensi";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },

    #[error("No data directory available; set ABSENSI_DATA_DIR")]
    NoDataDir,
}

/// Where the session is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    File,
    /// OS keychain: macOS Keychain, Windows Credential Manager, or the Linux
    /// kernel keyring.
    Keychain,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "keychain" => Ok(StorageBackend::Keychain),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub upload_timeout: Duration,
    pub storage: StorageBackend,
    /// Override for the file store directory.
    pub data_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            upload_timeout: UPLOAD_TIMEOUT,
            storage: StorageBackend::default(),
            data_dir: None,
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which returns the value of a
    /// variable if it is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        // API base URL: ABSENSI_API_URL > API_BASE_URL > localhost default
        let api_base_url = set("ABSENSI_API_URL")
            .or_else(|| set("API_BASE_URL"))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let upload_timeout = match set("ABSENSI_UPLOAD_TIMEOUT_SECS") {
            None => UPLOAD_TIMEOUT,
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "ABSENSI_UPLOAD_TIMEOUT_SECS",
                        value,
                    })
                }
            },
        };

        let storage = match set("ABSENSI_STORAGE") {
            None => StorageBackend::default(),
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                name: "ABSENSI_STORAGE",
                value,
            })?,
        };

        Ok(Self {
            api_base_url,
            upload_timeout,
            storage,
            data_dir: set("ABSENSI_DATA_DIR").map(PathBuf::from),
        })
    }

    /// Directory for the file store: the override, else `<data dir>/absensi`.
    pub fn session_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_dir()
                .map(|d| d.join(APP_DIR))
                .ok_or(ConfigError::NoDataDir),
        }
    }
}
