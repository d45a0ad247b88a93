//! Typed errors for HTTP calls.
//!
//! Every helper on `ApiClient` returns `ApiError` instead of a stringly error, so
//! callers can branch on the status code and server message without parsing.

use rally_core::StoreError;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(
        "API request failed with status {status}: {}",
        .server_message.as_deref().unwrap_or("no message")
    )]
    Status {
        status: u16,
        server_message: Option<String>,
        request_id: Option<String>,
    },

    #[error("Request failed: {message}")]
    Transport { message: String, timed_out: bool },

    #[error("Failed to parse response: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to create HTTP client: {0}")]
    Client(String),
}

impl ApiError {
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        ApiError::Transport {
            message: err.to_string(),
            timed_out: err.is_timeout(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { server_message, .. } => server_message.as_deref(),
            _ => None,
        }
    }

    pub fn request_id(&self) -> Option<&str> {
        match self {
            ApiError::Status { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }

    /// Transport failures and 5xx: the backend could not serve the request.
    pub fn is_unavailable(&self) -> bool {
        match self {
            ApiError::Transport { .. } => true,
            ApiError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Server message when present, otherwise a generic status-coded message.
    pub fn describe(&self) -> String {
        match self {
            ApiError::Status {
                status,
                server_message: Some(message),
                ..
            } => format!("{} (status {})", message, status),
            ApiError::Status { status, .. } => format!("request failed with status {}", status),
            ApiError::Transport { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Extract `error` (preferred) or `message` from a JSON error body.
pub(crate) fn server_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.or(b.message))
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
}

impl From<ApiError> for StoreError {
    fn from(err: ApiError) -> Self {
        if err.is_unavailable() {
            return StoreError::Unavailable(err.describe());
        }

        let message = err.describe();
        match err {
            ApiError::Status { status, .. } => StoreError::Rejected { status, message },
            ApiError::InvalidRequest(_) => StoreError::Rejected {
                status: 400,
                message,
            },
            _ => StoreError::Unavailable(message),
        }
    }
}
