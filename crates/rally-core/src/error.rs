//! Error types module
//!
//! `UploadError` is the full failure taxonomy of the direct upload protocol.
//! Variants split into pre-flight failures (raised before any network call) and
//! post-flight failures (raised by the sign, transfer or verify step). Every
//! variant knows the stage it belongs to, so callers can tell where an attempt
//! stopped without parsing messages.
//!
//! `StoreError` covers the profile media stores (remote and local).

use crate::models::UploadStage;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for failures the caller may retry
    Warn,
    /// Error level - for contract violations
    Error,
}

/// Self-description of an error for callers and diagnostics.
pub trait ErrorMetadata {
    /// HTTP status code returned by the remote side, when there was one
    fn status_code(&self) -> Option<u16>;

    /// Machine-readable error code (e.g., "VERIFICATION_FAILED")
    fn error_code(&self) -> &'static str;

    /// Whether restarting the whole upload from signing may succeed
    fn is_recoverable(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Authentication required: an access token must be provided")]
    AuthenticationRequired,

    #[error("No file provided")]
    MissingFile,

    #[error("Invalid upload kind: {0} (allowed: avatar, banner)")]
    InvalidUploadKind(String),

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("File too small: {size} bytes (min: {min} bytes)")]
    FileTooSmall { size: u64, min: u64 },

    #[error("Unsupported media type: {content_type} (allowed: {allowed:?})")]
    UnsupportedMediaType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("Upload signing failed: {message}")]
    SigningFailed {
        status: Option<u16>,
        message: String,
        request_id: Option<String>,
    },

    #[error("Incomplete signing response: missing {missing}")]
    IncompleteSigningResponse {
        missing: &'static str,
        request_id: Option<String>,
    },

    #[error("Upload transfer failed: {message}")]
    UploadTransportError {
        status: Option<u16>,
        message: String,
        request_id: Option<String>,
    },

    #[error("Upload timed out after {timeout_ms} ms")]
    UploadTimedOut {
        timeout_ms: u64,
        request_id: Option<String>,
    },

    #[error("Upload verification failed: {message}")]
    VerificationFailed {
        status: Option<u16>,
        message: String,
        request_id: Option<String>,
    },
}

/// Static metadata for each variant: (error_code, stage, log_level).
fn upload_error_static_metadata(err: &UploadError) -> (&'static str, UploadStage, LogLevel) {
    match err {
        UploadError::AuthenticationRequired => (
            "AUTHENTICATION_REQUIRED",
            UploadStage::Validating,
            LogLevel::Debug,
        ),
        UploadError::MissingFile => ("MISSING_FILE", UploadStage::Validating, LogLevel::Debug),
        UploadError::InvalidUploadKind(_) => (
            "INVALID_UPLOAD_KIND",
            UploadStage::Validating,
            LogLevel::Debug,
        ),
        UploadError::FileTooLarge { .. } => {
            ("FILE_TOO_LARGE", UploadStage::Validating, LogLevel::Debug)
        }
        UploadError::FileTooSmall { .. } => {
            ("FILE_TOO_SMALL", UploadStage::Validating, LogLevel::Debug)
        }
        UploadError::UnsupportedMediaType { .. } => (
            "UNSUPPORTED_MEDIA_TYPE",
            UploadStage::Validating,
            LogLevel::Debug,
        ),
        UploadError::SigningFailed { .. } => {
            ("SIGNING_FAILED", UploadStage::Signing, LogLevel::Warn)
        }
        UploadError::IncompleteSigningResponse { .. } => (
            "INCOMPLETE_SIGNING_RESPONSE",
            UploadStage::Signing,
            LogLevel::Error,
        ),
        UploadError::UploadTransportError { .. } => (
            "UPLOAD_TRANSPORT_ERROR",
            UploadStage::Transferring,
            LogLevel::Warn,
        ),
        UploadError::UploadTimedOut { .. } => {
            ("UPLOAD_TIMED_OUT", UploadStage::Transferring, LogLevel::Warn)
        }
        UploadError::VerificationFailed { .. } => (
            "VERIFICATION_FAILED",
            UploadStage::Verifying,
            LogLevel::Warn,
        ),
    }
}

impl UploadError {
    /// Stage of the protocol at which this error was raised.
    pub fn stage(&self) -> UploadStage {
        upload_error_static_metadata(self).1
    }

    /// True for failures raised before any network call.
    pub fn is_preflight(&self) -> bool {
        self.stage() == UploadStage::Validating
    }

    /// Correlation id of the failing call (server-provided when available).
    pub fn request_id(&self) -> Option<&str> {
        match self {
            UploadError::SigningFailed { request_id, .. }
            | UploadError::IncompleteSigningResponse { request_id, .. }
            | UploadError::UploadTransportError { request_id, .. }
            | UploadError::UploadTimedOut { request_id, .. }
            | UploadError::VerificationFailed { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }
}

impl ErrorMetadata for UploadError {
    fn status_code(&self) -> Option<u16> {
        match self {
            UploadError::SigningFailed { status, .. }
            | UploadError::UploadTransportError { status, .. }
            | UploadError::VerificationFailed { status, .. } => *status,
            _ => None,
        }
    }

    fn error_code(&self) -> &'static str {
        upload_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        match self {
            UploadError::SigningFailed { status, .. } => {
                !matches!(status, Some(code) if (400..500).contains(code))
            }
            UploadError::UploadTransportError { .. }
            | UploadError::UploadTimedOut { .. }
            | UploadError::VerificationFailed { .. } => true,
            _ => false,
        }
    }

    fn log_level(&self) -> LogLevel {
        upload_error_static_metadata(self).2
    }
}

/// Errors raised by profile media stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached (transport failure or 5xx). Eligible for fallback.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid profile media kind: {0}")]
    InvalidKind(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preflight_errors_have_validating_stage() {
        let errors = vec![
            UploadError::AuthenticationRequired,
            UploadError::MissingFile,
            UploadError::InvalidUploadKind("movement-media".to_string()),
            UploadError::FileTooLarge { size: 10, max: 5 },
            UploadError::FileTooSmall { size: 0, min: 64 },
            UploadError::UnsupportedMediaType {
                content_type: "text/plain".to_string(),
                allowed: vec!["image/png".to_string()],
            },
        ];

        for err in errors {
            assert!(err.is_preflight(), "{} should be pre-flight", err);
            assert!(!err.is_recoverable());
            assert_eq!(err.status_code(), None);
            assert_eq!(err.log_level(), LogLevel::Debug);
        }
    }

    #[test]
    fn test_signing_failed_metadata() {
        let err = UploadError::SigningFailed {
            status: Some(403),
            message: "bucket not allowed".to_string(),
            request_id: Some("req-1".to_string()),
        };
        assert_eq!(err.stage(), UploadStage::Signing);
        assert_eq!(err.error_code(), "SIGNING_FAILED");
        assert_eq!(err.status_code(), Some(403));
        assert_eq!(err.request_id(), Some("req-1"));
        assert!(!err.is_recoverable());
        assert_eq!(err.to_string(), "Upload signing failed: bucket not allowed");

        let server_side = UploadError::SigningFailed {
            status: Some(503),
            message: "unavailable".to_string(),
            request_id: None,
        };
        assert!(server_side.is_recoverable());
    }

    #[test]
    fn test_incomplete_signing_response_is_fatal() {
        let err = UploadError::IncompleteSigningResponse {
            missing: "object_key",
            request_id: None,
        };
        assert_eq!(err.stage(), UploadStage::Signing);
        assert!(!err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Error);
        assert!(err.to_string().contains("object_key"));
    }

    #[test]
    fn test_transfer_and_verify_stages() {
        let transport = UploadError::UploadTransportError {
            status: Some(500),
            message: "storage rejected payload".to_string(),
            request_id: None,
        };
        assert_eq!(transport.stage(), UploadStage::Transferring);
        assert_eq!(transport.status_code(), Some(500));

        let timeout = UploadError::UploadTimedOut {
            timeout_ms: 30_000,
            request_id: None,
        };
        assert_eq!(timeout.stage(), UploadStage::Transferring);
        assert_eq!(timeout.error_code(), "UPLOAD_TIMED_OUT");

        let verify = UploadError::VerificationFailed {
            status: None,
            message: "size mismatch".to_string(),
            request_id: None,
        };
        assert_eq!(verify.stage(), UploadStage::Verifying);
        assert!(verify.is_recoverable());
    }

    #[test]
    fn test_store_error_unavailable() {
        assert!(StoreError::Unavailable("connection refused".to_string()).is_unavailable());
        assert!(!StoreError::Rejected {
            status: 404,
            message: "no profile".to_string()
        }
        .is_unavailable());
    }
}
