//! HTTP client for the Rally backend.
//!
//! Provides a client built from an explicit [`ClientConfig`] (no process-wide
//! base URL), generic JSON helpers that return typed [`ApiError`]s, and the
//! domain operations: signed direct uploads (`uploads`), multipart media
//! uploads (`media`) and the remote profile media store (`profile`).

pub mod error;
pub mod media;
pub mod profile;
pub mod uploads;

use anyhow::{Context, Result};
use rally_core::{
    ClientConfig, FailureReporter, TracingFailureReporter, UploadPolicy,
};
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Duration;

pub use error::ApiError;
pub use profile::RemoteProfileStore;
pub use uploads::{DirectUploadOptions, ProgressCallback};

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// HTTP client for the Rally backend.
///
/// Cheap to clone; clones share the connection pool and the failure reporter.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    access_token: Option<String>,
    policy: UploadPolicy,
    transfer_timeout: Duration,
    metadata_timeout: Duration,
    reporter: Arc<dyn FailureReporter>,
}

impl Debug for ApiClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.access_token.is_some())
            .field("transfer_timeout", &self.transfer_timeout)
            .field("metadata_timeout", &self.metadata_timeout)
            .finish()
    }
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.backend_base_url.trim().trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            policy: config.policy,
            transfer_timeout: config.transfer_timeout,
            metadata_timeout: config.metadata_timeout,
            reporter: Arc::new(TracingFailureReporter),
        })
    }

    /// Create client from environment: RALLY_API_URL (or API_URL), RALLY_ACCESS_TOKEN, ...
    pub fn from_env() -> Result<Self> {
        let config = ClientConfig::from_env().context("Failed to load client configuration")?;
        Self::new(&config).context("Failed to create HTTP client")
    }

    /// Replace the collaborator that receives post-flight upload failures.
    pub fn with_failure_reporter(mut self, reporter: Arc<dyn FailureReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// GET request. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self
            .client
            .get(self.build_url(path))
            .timeout(self.metadata_timeout);
        execute(self.apply_auth(request)).await
    }

    /// PATCH JSON body and deserialize response.
    pub async fn patch_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self
            .client
            .patch(self.build_url(path))
            .timeout(self.metadata_timeout)
            .json(body);
        execute(self.apply_auth(request)).await
    }

    /// POST multipart form and deserialize response. Uses the transfer timeout.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, ApiError> {
        let request = self
            .client
            .post(self.build_url(path))
            .timeout(self.transfer_timeout)
            .multipart(form);
        execute(self.apply_auth(request)).await
    }
}

/// Send a request, map non-2xx to [`ApiError::Status`] and decode the JSON body.
pub(crate) async fn execute<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
    let response = request.send().await.map_err(ApiError::from_transport)?;
    let response = ensure_success(response).await?;

    let text = response.text().await.map_err(ApiError::from_transport)?;
    serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Pass 2xx responses through; turn anything else into [`ApiError::Status`].
pub(crate) async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let request_id = response_request_id(response.headers());
    let error_text = response.text().await.unwrap_or_default();

    Err(ApiError::Status {
        status: status.as_u16(),
        server_message: error::server_message(&error_text),
        request_id,
    })
}

pub(crate) fn response_request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(rally_core::constants::REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .filter(|id| !id.is_empty())
}

// Re-export domain types for convenience.
pub use rally_core::{
    LocalFile, MediaReference, MediaUploadResponse, ProfileMedia, UploadError, UploadKind,
    UploadOutcome,
};
