//! Pre-flight checks for direct uploads
//!
//! Everything here runs before the first network call. Order of checks:
//! - access token present
//! - file present
//! - kind allowed on the direct path
//! - size within `[MIN_IMAGE_BYTES, max]`
//! - content type allowed for the kind

use std::fmt::{Debug, Formatter, Result as FmtResult};

use crate::constants::{
    DEFAULT_AVATAR_MAX_BYTES, DEFAULT_BANNER_MAX_BYTES, IMAGE_CONTENT_TYPES, MIN_IMAGE_BYTES,
};
use crate::error::UploadError;
use crate::models::{LocalFile, UploadKind};

/// Size limits for the direct upload path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    pub avatar_max_bytes: u64,
    pub banner_max_bytes: u64,
    pub min_image_bytes: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            avatar_max_bytes: DEFAULT_AVATAR_MAX_BYTES,
            banner_max_bytes: DEFAULT_BANNER_MAX_BYTES,
            min_image_bytes: MIN_IMAGE_BYTES,
        }
    }
}

/// Inputs that passed every pre-flight check.
pub struct ValidatedUpload<'a> {
    pub access_token: &'a str,
    pub file: &'a LocalFile,
    pub kind: UploadKind,
    pub bucket: &'static str,
    /// Lowercased MIME type without parameters; sent on sign and PUT.
    pub content_type: String,
}

impl Debug for ValidatedUpload<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ValidatedUpload")
            .field("authenticated", &!self.access_token.is_empty())
            .field("file", &self.file)
            .field("kind", &self.kind)
            .field("bucket", &self.bucket)
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// Lowercase a MIME type and drop parameters (`image/PNG; q=1` → `image/png`).
pub fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

impl UploadPolicy {
    /// Default size ceiling for a kind, used when the caller passes no `max_bytes`.
    pub fn max_bytes_for(&self, kind: UploadKind) -> Option<u64> {
        match kind {
            UploadKind::Avatar => Some(self.avatar_max_bytes),
            UploadKind::Banner => Some(self.banner_max_bytes),
            UploadKind::MovementMedia => None,
        }
    }

    pub fn allowed_content_types(&self, kind: UploadKind) -> &'static [&'static str] {
        if kind.is_image() {
            IMAGE_CONTENT_TYPES
        } else {
            &[]
        }
    }

    /// Run every pre-flight check for the direct path.
    pub fn validate_direct<'a>(
        &self,
        access_token: Option<&'a str>,
        file: Option<&'a LocalFile>,
        raw_kind: &str,
        max_bytes: Option<u64>,
    ) -> Result<ValidatedUpload<'a>, UploadError> {
        let access_token = access_token
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(UploadError::AuthenticationRequired)?;

        let file = file.ok_or(UploadError::MissingFile)?;

        let kind = raw_kind
            .parse::<UploadKind>()
            .ok()
            .filter(UploadKind::is_direct)
            .ok_or_else(|| UploadError::InvalidUploadKind(raw_kind.to_string()))?;
        let bucket = crate::models::map_kind_to_bucket(kind)
            .ok_or_else(|| UploadError::InvalidUploadKind(raw_kind.to_string()))?;

        self.validate_size(kind, file.size(), max_bytes)?;
        let content_type = self.validate_content_type(kind, &file.content_type)?;

        Ok(ValidatedUpload {
            access_token,
            file,
            kind,
            bucket,
            content_type,
        })
    }

    pub fn validate_size(
        &self,
        kind: UploadKind,
        size: u64,
        max_bytes: Option<u64>,
    ) -> Result<(), UploadError> {
        if let Some(max) = max_bytes.or_else(|| self.max_bytes_for(kind)) {
            if size > max {
                return Err(UploadError::FileTooLarge { size, max });
            }
        }

        if kind.is_image() && size < self.min_image_bytes {
            return Err(UploadError::FileTooSmall {
                size,
                min: self.min_image_bytes,
            });
        }

        Ok(())
    }

    pub fn validate_content_type(
        &self,
        kind: UploadKind,
        content_type: &str,
    ) -> Result<String, UploadError> {
        let normalized = normalize_content_type(content_type);
        let allowed = self.allowed_content_types(kind);

        if !allowed.contains(&normalized.as_str()) {
            return Err(UploadError::UnsupportedMediaType {
                content_type: content_type.to_string(),
                allowed: allowed.iter().map(|ct| ct.to_string()).collect(),
            });
        }

        Ok(normalized)
    }
}
