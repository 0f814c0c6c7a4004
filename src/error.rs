//! Error types for the IMMO&CO client.

use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to the IMMO&CO backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network or transport failure.
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The backend rejected the request as malformed (400/422).
    #[error("rejected by server ({status}): {detail}")]
    Validation { status: StatusCode, detail: String },
    #[error("not found: {0}")]
    NotFound(String),
    /// Missing, expired or insufficient credentials (401/403).
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
    /// Upload refused before anything was sent.
    #[error("invalid upload: {0}")]
    InvalidUpload(String),
}

impl ApiError {
    /// Maps a non-success response to the error taxonomy, reading FastAPI's
    /// `{"detail": ...}` body when there is one.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("detail").cloned())
            .map(|d| match d {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .unwrap_or_else(|| body.trim().to_string());

        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ApiError::Validation { status, detail }
            }
            StatusCode::NOT_FOUND => ApiError::NotFound(detail),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(detail),
            _ => ApiError::Status {
                status,
                body: detail,
            },
        }
    }
}

/// Rejected edit of a search filter field.
#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("{field}: '{value}' is not a number")]
    InvalidNumber { field: &'static str, value: String },
    #[error("{field} cannot be negative")]
    Negative { field: &'static str },
    #[error("unknown listing type '{0}' (expected sale or rent)")]
    UnknownListingType(String),
    #[error("unknown filter field '{0}'")]
    UnknownField(String),
    #[error("search radius must be a positive number of kilometres")]
    InvalidRadius,
}

#[derive(Debug, Error, PartialEq)]
pub enum CoordinateError {
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
}

/// The listing form cannot be submitted as is.
#[derive(Debug, Error, PartialEq)]
pub enum DraftError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{field}: '{value}' is not a valid amount")]
    InvalidNumber { field: &'static str, value: String },
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
    #[error("no listing is being edited")]
    NoDraft,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("session store encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}
