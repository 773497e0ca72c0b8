//! API client module for the employee self-service backend.
//!
//! Provides the HTTP client with bearer injection and session-invalidation
//! handling, request/response types, and one module per backend area.

pub mod attendance;
pub mod auth;
pub mod client;
pub mod error;
pub mod leave;
pub mod overtime;
pub mod profile;
pub mod recap;
pub mod request;
pub mod types;


pub use client::{ApiClient, ClientKind, UPLOAD_TIMEOUT};
pub use error::{ApiError, ErrorBody};
pub use request::{ApiRequest, Attachment};
