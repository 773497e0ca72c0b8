//! Classification of 401 responses into session events.

/// Server message for a rejected login.
pub const MSG_INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Server message for an expired bearer token.
pub const MSG_TOKEN_EXPIRED: &str = "Token expired, Login ulang";

/// Server message when a login on another device replaced this session.
pub const MSG_SESSION_SUPERSEDED: &str = "Session invalid or expired";

/// Why a 401 was returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
    /// Wrong username or password at login. A normal login failure, not a
    /// session event.
    CredentialsRejected,
    /// The stored token expired.
    TokenExpired,
    /// The same account logged in on another device.
    Superseded,
}

impl Invalidation {
    /// Classify a failed response.
    ///
    /// Only 401 responses are classified. The backend puts its message in
    /// either the `status` or the `message` field, so both are checked.
    pub fn classify(status: u16, status_field: Option<&str>, message: Option<&str>) -> Option<Self> {
        if status != 401 {
            return None;
        }
        let is = |text: &str| status_field == Some(text) || message == Some(text);

        if is(MSG_INVALID_CREDENTIALS) {
            Some(Invalidation::CredentialsRejected)
        } else if is(MSG_TOKEN_EXPIRED) {
            Some(Invalidation::TokenExpired)
        } else if is(MSG_SESSION_SUPERSEDED) {
            Some(Invalidation::Superseded)
        } else {
            None
        }
    }

    /// Whether this event ends the local session (and prompts the user).
    pub fn ends_session(&self) -> bool {
        matches!(self, Invalidation::TokenExpired | Invalidation::Superseded)
    }

    /// Prompt text for a session-ending event. `None` for rejected credentials.
    pub fn notice(&self) -> Option<InvalidationNotice> {
        match self {
            Invalidation::CredentialsRejected => None,
            Invalidation::TokenExpired => Some(InvalidationNotice {
                kind: *self,
                title: "Sesi Berakhir",
                message: "Sesi Anda telah berakhir. Silakan login ulang.",
            }),
            Invalidation::Superseded => Some(InvalidationNotice {
                kind: *self,
                title: "Login di perangkat lain",
                message: "Anda login di perangkat lain. Silakan login kembali.",
            }),
        }
    }
}

/// Content of the one-button logout prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationNotice {
    pub kind: Invalidation,
    pub title: &'static str,
    pub message: &'static str,
}
