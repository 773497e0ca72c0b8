//! Employee login.

use super::client::ApiClient;
use super::error::ApiError;
use super::types::{LoginRequest, LoginResponse};

/// Successful login: the bearer token plus the raw response, which is
/// persisted as the stored user record.
#[derive(Debug, Clone)]
pub struct LoginGrant {
    pub access_token: String,
    pub nama: String,
    pub employee_id: Option<String>,
    pub user_json: String,
}

/// Authenticate with username and password.
///
/// POST /auth/login/karyawan with `{ username, password }`. A 2xx response
/// without `access_token` is treated as a failed login.
pub async fn login(client: &ApiClient, username: &str, password: &str) -> Result<LoginGrant, ApiError> {
    let body = LoginRequest { username, password };
    let raw: serde_json::Value = client.post_json("/auth/login/karyawan", &body).await?;

    let parsed: LoginResponse =
        serde_json::from_value(raw.clone()).map_err(|e| ApiError::Decode(format!("Login response: {}", e)))?;

    let access_token = parsed
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Decode("Token not found in login response".to_string()))?;

    Ok(LoginGrant {
        access_token,
        nama: parsed.nama,
        employee_id: parsed.id_karyawan,
        user_json: raw.to_string(),
    })
}
