//! Collaborator traits
//!
//! The client calls out through these traits instead of depending on concrete
//! implementations: `FailureReporter` receives diagnostics when an upload
//! fails after leaving the client, `ProfileMediaStore` persists the avatar and
//! banner references a caller records after a successful upload.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{MediaReference, ProfileMedia, UploadKind, UploadStage};

/// Diagnostics for one failed upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    pub stage: UploadStage,
    pub error_code: &'static str,
    pub status: Option<u16>,
    /// Server-provided request id when the failing response carried one,
    /// otherwise the id the client generated for this attempt.
    pub request_id: String,
    /// Set once signing succeeded; the object may exist in storage without being valid.
    pub object_key: Option<String>,
    pub message: String,
}

/// Receives post-flight upload failures. Never called for pre-flight validation errors.
#[async_trait]
pub trait FailureReporter: Send + Sync {
    async fn report_failure(&self, report: &FailureReport);
}

/// Logs failures through `tracing`. The default reporter.
pub struct TracingFailureReporter;

#[async_trait]
impl FailureReporter for TracingFailureReporter {
    async fn report_failure(&self, report: &FailureReport) {
        tracing::warn!(
            stage = %report.stage,
            error_code = report.error_code,
            status = ?report.status,
            request_id = %report.request_id,
            object_key = ?report.object_key,
            "Direct upload failed: {}",
            report.message
        );
    }
}

/// No-op implementation for when diagnostics are not wanted
pub struct NoOpFailureReporter;

#[async_trait]
impl FailureReporter for NoOpFailureReporter {
    async fn report_failure(&self, _report: &FailureReport) {}
}

/// Persistence for the signed-in profile's avatar and banner references.
#[async_trait]
pub trait ProfileMediaStore: Send + Sync {
    async fn get_profile_media(&self) -> Result<ProfileMedia, StoreError>;

    /// Replace the reference for `kind` and return the updated record.
    async fn set_profile_media(
        &self,
        kind: UploadKind,
        reference: MediaReference,
    ) -> Result<ProfileMedia, StoreError>;

    /// Short name used in logs ("remote", "local", ...).
    fn name(&self) -> &'static str;
}
