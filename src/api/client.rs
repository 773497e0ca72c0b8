//! HTTP client with bearer-token injection and session-invalidation handling.
//!
//! Every backend call goes through `ApiClient::send`. Two variants exist:
//!
//! - `ApiClient::new`: the general client. No timeout beyond the transport
//!   default. Non-multipart requests always carry `Content-Type:
//!   application/json`. A 401 that ends the session is reported to the
//!   session provider, which shows the one-time logout prompt.
//! - `ApiClient::upload`: for large uploads. Each request is capped at a
//!   fixed timeout and sends `Accept: application/json`. It never forces a
//!   content type and logs every failed response.
//!
//! Both variants report session-ending 401s to the same provider, so one
//! prompt covers failures from either client.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::{ApiError, ErrorBody};
use super::request::{ApiRequest, RequestBody};
use crate::session::SessionProvider;

/// Default request ceiling for the upload client.
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

const JSON: &str = "application/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKind {
    General,
    Upload { timeout: Duration },
}

/// HTTP client wrapper for backend communication.
///
/// Holds no token itself: the token is read from the session provider before
/// each request, so a login or logout takes effect on the next call.
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<dyn SessionProvider>,
    kind: ClientKind,
}

impl ApiClient {
    /// Create the general-purpose client.
    pub fn new(base_url: &str, session: Arc<dyn SessionProvider>) -> Self {
        Self::with_kind(base_url, session, ClientKind::General)
    }

    /// Create the upload client with the given per-request timeout.
    pub fn upload(base_url: &str, session: Arc<dyn SessionProvider>, timeout: Duration) -> Self {
        Self::with_kind(base_url, session, ClientKind::Upload { timeout })
    }

    fn with_kind(base_url: &str, session: Arc<dyn SessionProvider>, kind: ClientKind) -> Self {
        let client = Client::builder()
            .user_agent(concat!("absensi-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            kind,
        }
    }

    pub fn kind(&self) -> ClientKind {
        self.kind
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request and return the response if its status is 2xx.
    ///
    /// Non-2xx responses become `ApiError::Status` carrying the body.
    /// Session-ending 401s are reported to the session provider before the
    /// error is returned; nothing is retried.
    pub async fn send(&self, request: ApiRequest) -> Result<Response, ApiError> {
        let ApiRequest {
            method,
            path,
            query,
            body,
        } = request;
        let url = format!("{}{}", self.base_url, path);

        let mut builder = self.client.request(method.clone(), &url);
        if !query.is_empty() {
            builder = builder.query(&query);
        }

        // 1. Bearer token, if a session is stored
        if let Some(token) = self.session.access_token().await? {
            builder = builder.bearer_auth(token);
        }

        // 2. Per-variant headers. The content type must be set before the
        //    body: reqwest only fills it in when absent.
        match self.kind {
            ClientKind::General => {
                if !body.is_multipart() {
                    builder = builder.header(CONTENT_TYPE, JSON);
                }
            }
            ClientKind::Upload { timeout } => {
                builder = builder.header(ACCEPT, JSON).timeout(timeout);
            }
        }

        // 3. Body. Multipart sets its own boundary-bearing content type.
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(form),
        };

        log::debug!("{} {}", method, path);

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                if matches!(self.kind, ClientKind::Upload { .. }) {
                    log::warn!("Upload error on {} {}: {}", method, path, e);
                }
                return Err(e.into());
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = ErrorBody::parse(response.text().await.unwrap_or_default());

        if matches!(self.kind, ClientKind::Upload { .. }) {
            log::warn!("Upload error on {} {} ({}): {}", method, path, status, body.summary());
        }

        if let Some(invalidation) = body.invalidation(status) {
            if invalidation.ends_session() {
                self.session.session_invalidated(invalidation);
            }
        }

        Err(ApiError::Status { status, body })
    }

    /// Send a request and decode the JSON response body.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_json(ApiRequest::get(path)).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(ApiRequest::post(path).json(body)?).await
    }
}
