//! Signed direct uploads.
//!
//! One call to [`ApiClient::upload_direct`] runs three steps in order, each
//! feeding the next:
//!
//! 1. **Sign**: `POST /uploads/sign` returns a short-lived `upload_url` and the
//!    server-chosen `object_key`.
//! 2. **Transfer**: raw bytes are `PUT` to exactly that `upload_url` with the
//!    file's content type. The signed URL carries the authorization, so no
//!    bearer token is sent.
//! 3. **Verify**: `POST /uploads/verify` asks the server to compare the stored
//!    object's length with the original byte count. Only `{ "ok": true }` counts.
//!
//! Nothing is retried and nothing is cleaned up on failure; a failed attempt is
//! restarted from signing by the caller. All three calls share one
//! `x-request-id`.

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use rally_core::constants::{REQUEST_ID_HEADER, SIGN_PATH, TRANSFER_CHUNK_SIZE, VERIFY_PATH};
use rally_core::{
    ErrorMetadata, FailureReport, SignedUploadGrant, UploadError, UploadOutcome, UploadStage,
    ValidatedUpload, VerificationResult,
};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{server_message, ApiError};
use crate::{ensure_success, execute, response_request_id, ApiClient, LocalFile};

/// Receives transfer progress as a percentage in `0.0..=100.0`.
pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// Options for [`ApiClient::upload_direct`].
#[derive(Clone, Default)]
pub struct DirectUploadOptions {
    pub access_token: Option<String>,
    /// Raw kind as supplied by the caller; normalized during validation.
    pub kind: String,
    /// Overrides the policy ceiling for the kind.
    pub max_bytes: Option<u64>,
    pub on_progress: Option<ProgressCallback>,
    /// Transfer timeout. Defaults to the client's configured transfer timeout.
    pub timeout: Option<Duration>,
    /// Correlation id to send instead of a freshly generated one.
    pub request_id: Option<String>,
}

impl DirectUploadOptions {
    pub fn new(access_token: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    pub fn with_progress<F>(mut self, on_progress: F) -> Self
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(on_progress));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

impl Debug for DirectUploadOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("DirectUploadOptions")
            .field("authenticated", &self.access_token.is_some())
            .field("kind", &self.kind)
            .field("max_bytes", &self.max_bytes)
            .field("on_progress", &self.on_progress.is_some())
            .field("timeout", &self.timeout)
            .field("request_id", &self.request_id)
            .finish()
    }
}

#[derive(Serialize)]
struct SignRequest<'a> {
    bucket: &'a str,
    content_type: &'a str,
    bytes: u64,
}

#[derive(Deserialize)]
struct SignResponse {
    #[serde(default)]
    upload_url: Option<String>,
    #[serde(default)]
    object_key: Option<String>,
    #[serde(default)]
    public_url: Option<String>,
    #[serde(default)]
    bucket: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl SignResponse {
    fn into_grant(
        self,
        requested_bucket: &str,
        request_id: &str,
    ) -> Result<SignedUploadGrant, UploadError> {
        let incomplete = |missing| UploadError::IncompleteSigningResponse {
            missing,
            request_id: Some(request_id.to_string()),
        };

        let upload_url = non_empty(self.upload_url).ok_or_else(|| incomplete("upload_url"))?;
        let object_key = non_empty(self.object_key).ok_or_else(|| incomplete("object_key"))?;

        Ok(SignedUploadGrant {
            upload_url,
            object_key,
            public_url: non_empty(self.public_url),
            bucket: non_empty(self.bucket).unwrap_or_else(|| requested_bucket.to_string()),
            expires_in_seconds: self.expires_in,
        })
    }
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    kind: &'a str,
    object_key: &'a str,
    expected_bytes: u64,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// A post-flight failure plus the object key, once signing has produced one.
struct StageFailure {
    error: UploadError,
    object_key: Option<String>,
}

impl From<UploadError> for StageFailure {
    fn from(error: UploadError) -> Self {
        Self {
            error,
            object_key: None,
        }
    }
}

impl ApiClient {
    /// Upload `file` straight to storage through a signed URL and confirm its size.
    ///
    /// Validation failures return before any network call. Post-flight failures
    /// are also handed to the configured `FailureReporter`.
    #[tracing::instrument(
        skip(self, file, options),
        fields(
            kind = %options.kind,
            bytes = file.map(LocalFile::size),
            request_id = tracing::field::Empty,
        )
    )]
    pub async fn upload_direct(
        &self,
        file: Option<&LocalFile>,
        options: DirectUploadOptions,
    ) -> Result<UploadOutcome, UploadError> {
        let upload = self
            .policy
            .validate_direct(
                options.access_token.as_deref(),
                file,
                &options.kind,
                options.max_bytes,
            )
            .inspect_err(|e| tracing::debug!(error = %e, "Direct upload rejected before signing"))?;

        let request_id = options
            .request_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        tracing::Span::current().record("request_id", request_id.as_str());

        let timeout = options.timeout.unwrap_or(self.transfer_timeout);

        match self
            .run_signed_upload(&upload, &request_id, timeout, options.on_progress.as_ref())
            .await
        {
            Ok(outcome) => {
                tracing::info!(
                    bucket = %outcome.bucket,
                    object_key = %outcome.object_key,
                    "Direct upload verified"
                );
                Ok(outcome)
            }
            Err(failure) => {
                self.report_failure(&failure, &request_id).await;
                Err(failure.error)
            }
        }
    }

    async fn run_signed_upload(
        &self,
        upload: &ValidatedUpload<'_>,
        request_id: &str,
        timeout: Duration,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<UploadOutcome, StageFailure> {
        tracing::debug!(stage = %UploadStage::Signing, bucket = upload.bucket, "Requesting upload grant");
        let grant = self.sign(upload, request_id).await?;

        let with_key = |error: UploadError| StageFailure {
            error,
            object_key: Some(grant.object_key.clone()),
        };

        tracing::debug!(
            stage = %UploadStage::Transferring,
            object_key = %grant.object_key,
            upload_host = grant.upload_host(),
            "Transferring bytes to storage"
        );
        self.transfer(&grant, upload, request_id, timeout, on_progress)
            .await
            .map_err(with_key)?;

        tracing::debug!(stage = %UploadStage::Verifying, object_key = %grant.object_key, "Verifying stored object");
        self.verify(&grant, upload, request_id)
            .await
            .map_err(with_key)?;

        tracing::debug!(stage = %UploadStage::Done, "Upload complete");
        Ok(UploadOutcome::from_grant(upload.kind, grant))
    }

    async fn sign(
        &self,
        upload: &ValidatedUpload<'_>,
        request_id: &str,
    ) -> Result<SignedUploadGrant, UploadError> {
        let body = SignRequest {
            bucket: upload.bucket,
            content_type: &upload.content_type,
            bytes: upload.file.size(),
        };

        let request = self
            .client
            .post(self.build_url(SIGN_PATH))
            .bearer_auth(upload.access_token)
            .header(REQUEST_ID_HEADER, request_id)
            .timeout(self.metadata_timeout)
            .json(&body);

        let signing_failed = |e: ApiError| UploadError::SigningFailed {
            status: e.status(),
            message: e.describe(),
            request_id: Some(e.request_id().unwrap_or(request_id).to_string()),
        };

        let response = request
            .send()
            .await
            .map_err(|e| signing_failed(ApiError::from_transport(e)))?;
        let response_id = response_request_id(response.headers());
        let correlation_id = response_id.as_deref().unwrap_or(request_id);

        let response = ensure_success(response).await.map_err(signing_failed)?;
        let text = response
            .text()
            .await
            .map_err(|e| signing_failed(ApiError::from_transport(e)))?;

        // 2xx without a usable JSON body: the transport worked, the contract did not.
        let parsed: SignResponse =
            serde_json::from_str(&text).map_err(|_| UploadError::IncompleteSigningResponse {
                missing: "a JSON body",
                request_id: Some(correlation_id.to_string()),
            })?;

        parsed.into_grant(upload.bucket, correlation_id)
    }

    async fn transfer(
        &self,
        grant: &SignedUploadGrant,
        upload: &ValidatedUpload<'_>,
        request_id: &str,
        timeout: Duration,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<(), UploadError> {
        let request = self
            .client
            .put(&grant.upload_url)
            .header(CONTENT_TYPE, upload.content_type.as_str())
            .header(CONTENT_LENGTH, upload.file.size())
            .header(REQUEST_ID_HEADER, request_id)
            .timeout(timeout)
            .body(progress_body(upload.file.bytes.clone(), on_progress.cloned()));

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                UploadError::UploadTimedOut {
                    timeout_ms: timeout.as_millis() as u64,
                    request_id: Some(request_id.to_string()),
                }
            } else {
                UploadError::UploadTransportError {
                    status: e.status().map(|s| s.as_u16()),
                    message: e.to_string(),
                    request_id: Some(request_id.to_string()),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let response_id = response_request_id(response.headers());
            let body = response.text().await.unwrap_or_default();
            let message = server_message(&body)
                .unwrap_or_else(|| format!("storage responded with status {}", status.as_u16()));
            return Err(UploadError::UploadTransportError {
                status: Some(status.as_u16()),
                message,
                request_id: Some(response_id.unwrap_or_else(|| request_id.to_string())),
            });
        }

        if let Some(on_progress) = on_progress {
            on_progress(100.0);
        }
        Ok(())
    }

    async fn verify(
        &self,
        grant: &SignedUploadGrant,
        upload: &ValidatedUpload<'_>,
        request_id: &str,
    ) -> Result<VerificationResult, UploadError> {
        let expected_bytes = upload.file.size();
        let body = VerifyRequest {
            kind: upload.kind.as_str(),
            object_key: &grant.object_key,
            expected_bytes,
        };

        let request = self
            .client
            .post(self.build_url(VERIFY_PATH))
            .bearer_auth(upload.access_token)
            .header(REQUEST_ID_HEADER, request_id)
            .timeout(self.metadata_timeout)
            .json(&body);

        let failed = |status: Option<u16>, message: String, response_id: Option<&str>| {
            UploadError::VerificationFailed {
                status,
                message,
                request_id: Some(response_id.unwrap_or(request_id).to_string()),
            }
        };

        match execute::<VerificationResult>(request).await {
            Ok(result) if result.ok => Ok(result),
            Ok(result) => {
                let message = match result.confirmed_bytes {
                    Some(stored) if stored != expected_bytes => format!(
                        "stored size {} bytes does not match expected {} bytes",
                        stored, expected_bytes
                    ),
                    _ => "server did not confirm the stored object".to_string(),
                };
                Err(failed(None, message, None))
            }
            Err(ApiError::Decode(e)) => Err(failed(
                None,
                format!("unexpected verification response: {}", e),
                None,
            )),
            Err(e) => Err(failed(e.status(), e.describe(), e.request_id())),
        }
    }

    async fn report_failure(&self, failure: &StageFailure, request_id: &str) {
        let error = &failure.error;
        let report = FailureReport {
            stage: error.stage(),
            error_code: error.error_code(),
            status: error.status_code(),
            request_id: error.request_id().unwrap_or(request_id).to_string(),
            object_key: failure.object_key.clone(),
            message: error.to_string(),
        };
        self.reporter.report_failure(&report).await;
    }
}

// Held back until storage accepts the PUT.
const SENT_PROGRESS_CAP: f64 = 99.0;

/// Stream `data` in fixed-size chunks, reporting the share handed to the transport.
///
/// Never reports 100; `transfer` does that once the response is a 2xx.
fn progress_body(data: Bytes, on_progress: Option<ProgressCallback>) -> reqwest::Body {
    let total = data.len();
    let chunks: Vec<Bytes> = (0..total)
        .step_by(TRANSFER_CHUNK_SIZE)
        .map(|start| data.slice(start..(start + TRANSFER_CHUNK_SIZE).min(total)))
        .collect();

    let mut sent = 0usize;
    let body = stream::iter(chunks).map(move |chunk| {
        sent += chunk.len();
        if let Some(on_progress) = &on_progress {
            on_progress(percent(sent, total));
        }
        Ok::<Bytes, std::io::Error>(chunk)
    });

    reqwest::Body::wrap_stream(body)
}

fn percent(sent: usize, total: usize) -> f64 {
    if total == 0 {
        return SENT_PROGRESS_CAP;
    }
    (sent as f64 / total as f64 * 100.0).min(SENT_PROGRESS_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, 100), 0.0);
        assert_eq!(percent(50, 200), 25.0);
        assert_eq!(percent(196, 200), 98.0);
        assert_eq!(percent(200, 200), 99.0);
        assert_eq!(percent(0, 0), 99.0);
    }

    #[test]
    fn test_sign_response_requires_url_and_key() {
        let missing_key: SignResponse =
            serde_json::from_str(r#"{"upload_url":"https://s.example/put"}"#).unwrap();
        let err = missing_key.into_grant("avatars", "req-1").unwrap_err();
        assert!(matches!(
            err,
            UploadError::IncompleteSigningResponse {
                missing: "object_key",
                ..
            }
        ));

        let empty_url: SignResponse =
            serde_json::from_str(r#"{"upload_url":"","object_key":"avatars/a.png"}"#).unwrap();
        let err = empty_url.into_grant("avatars", "req-1").unwrap_err();
        assert!(matches!(
            err,
            UploadError::IncompleteSigningResponse {
                missing: "upload_url",
                ..
            }
        ));
    }

    #[test]
    fn test_sign_response_defaults_bucket() {
        let response: SignResponse = serde_json::from_str(
            r#"{"upload_url":"https://s.example/put","object_key":"avatars/a.png","expires_in":900}"#,
        )
        .unwrap();
        let grant = response.into_grant("avatars", "req-1").unwrap();
        assert_eq!(grant.bucket, "avatars");
        assert_eq!(grant.public_url, None);
        assert_eq!(grant.expires_in_seconds, Some(900));
    }

    #[test]
    fn test_options_debug_hides_token() {
        let options = DirectUploadOptions::new("secret-token", "avatar").with_progress(|_| {});
        let printed = format!("{:?}", options);
        assert!(!printed.contains("secret-token"));
        assert!(printed.contains("avatar"));
    }
}
