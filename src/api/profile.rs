//! Employee profile.

use super::client::ApiClient;
use super::error::ApiError;
use super::types::{ApiEnvelope, EmployeeProfile};

/// GET /pegawai/{id}, returning the `data` object.
pub async fn fetch(client: &ApiClient, employee_id: &str) -> Result<EmployeeProfile, ApiError> {
    let path = format!("/pegawai/{}", urlencoding::encode(employee_id));
    let envelope: ApiEnvelope<EmployeeProfile> = client.get(&path).await?;
    envelope
        .data
        .ok_or_else(|| ApiError::Decode("Profile response has no data".to_string()))
}
