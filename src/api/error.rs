//! Errors returned by the API client.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::session::{Invalidation, StoreError};

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connect, TLS, timeout, ...).
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("Server returned {status}: {}", .body.summary())]
    Status { status: StatusCode, body: ErrorBody },

    #[error("Failed to parse response: {0}")]
    Decode(String),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not logged in")]
    NotLoggedIn,
}

impl ApiError {
    /// HTTP status, if the server responded.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status(),
            _ => None,
        }
    }

    /// Server-supplied error body, if the server responded.
    pub fn body(&self) -> Option<&ErrorBody> {
        match self {
            ApiError::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Session classification of a 401 response.
    pub fn invalidation(&self) -> Option<Invalidation> {
        match self {
            ApiError::Status { status, body } => body.invalidation(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Transport(e) if e.is_timeout())
    }
}

#[derive(Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    status: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<serde_json::Value>,
}

/// Body of a failed response.
///
/// The raw text is always kept. If it is a JSON object, its `status` and
/// `message` string fields are extracted as well.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorBody {
    pub raw: String,
    pub status: Option<String>,
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn parse(raw: String) -> Self {
        let (status, message) = match serde_json::from_str::<ErrorPayload>(&raw) {
            Ok(payload) => (
                payload.status.and_then(|v| v.as_str().map(str::to_string)),
                payload.message.and_then(|v| v.as_str().map(str::to_string)),
            ),
            Err(_) => (None, None),
        };
        Self { raw, status, message }
    }

    pub fn invalidation(&self, status: StatusCode) -> Option<Invalidation> {
        Invalidation::classify(status.as_u16(), self.status.as_deref(), self.message.as_deref())
    }

    /// Best human-readable description: `message`, then `status`, then the raw text.
    pub fn summary(&self) -> &str {
        self.message
            .as_deref()
            .or(self.status.as_deref())
            .unwrap_or(self.raw.as_str())
    }
}
