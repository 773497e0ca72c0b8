//! Attendance check-in and check-out.
//!
//! Both calls send the selfie as multipart field `file` and the device
//! location as query parameters. They go through the general client, so an
//! expired session during a check-in raises the logout prompt.

use reqwest::multipart::Form;
use reqwest::StatusCode;
use serde::Deserialize;

use super::client::ApiClient;
use super::error::ApiError;
use super::request::{ApiRequest, Attachment};
use super::types::Coordinates;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punch {
    CheckIn,
    CheckOut,
}

impl Punch {
    pub fn label(&self) -> &'static str {
        match self {
            Punch::CheckIn => "Check-in",
            Punch::CheckOut => "Check-out",
        }
    }

    fn request(&self, employee_id: &str) -> ApiRequest {
        let id = urlencoding::encode(employee_id);
        match self {
            Punch::CheckIn => ApiRequest::post(format!("/absensi/check-in/{}", id)),
            Punch::CheckOut => ApiRequest::put(format!("/absensi/check-out/{}", id)),
        }
    }
}

/// Server acknowledgment. Only `message` is read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PunchReceipt {
    #[serde(default)]
    pub message: Option<String>,
}

/// Send a check-in or check-out.
pub async fn punch(
    client: &ApiClient,
    kind: Punch,
    employee_id: &str,
    photo: Attachment,
    at: Coordinates,
) -> Result<PunchReceipt, ApiError> {
    let form = Form::new().part("file", photo.into_part()?);
    let request = kind
        .request(employee_id)
        .query("latitude", at.latitude)
        .query("longitude", at.longitude)
        .multipart(form);

    let response = client.send(request).await?;
    // Some deployments answer with an empty body
    let text = response.text().await?;
    if text.trim().is_empty() {
        return Ok(PunchReceipt::default());
    }
    serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
}

/// User-facing message for a failed check-in/check-out.
pub fn failure_message(err: &ApiError) -> &'static str {
    match err.status() {
        Some(StatusCode::BAD_REQUEST) => "Data absensi tidak lengkap atau tidak valid.",
        Some(StatusCode::FORBIDDEN) => "Anda berada di luar area kerja atau wajah tidak cocok.",
        _ => "Terjadi kesalahan sistem. Silakan coba lagi.",
    }
}
