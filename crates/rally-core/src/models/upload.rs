use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::constants::{AVATARS_BUCKET, BANNERS_BUCKET};
use crate::models::MediaReference;

/// What an upload is for. Determines the bucket and the accepted formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UploadKind {
    Avatar,
    Banner,
    /// Generic movement media, uploaded through the multipart endpoint.
    MovementMedia,
}

impl UploadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadKind::Avatar => "avatar",
            UploadKind::Banner => "banner",
            UploadKind::MovementMedia => "movement-media",
        }
    }

    /// Kinds that go through sign → PUT → verify.
    pub fn is_direct(&self) -> bool {
        matches!(self, UploadKind::Avatar | UploadKind::Banner)
    }

    pub fn is_image(&self) -> bool {
        matches!(self, UploadKind::Avatar | UploadKind::Banner)
    }
}

impl FromStr for UploadKind {
    type Err = String;

    /// Accepts any casing, surrounding whitespace and `_` in place of `-`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "avatar" => Ok(UploadKind::Avatar),
            "banner" => Ok(UploadKind::Banner),
            "movement-media" => Ok(UploadKind::MovementMedia),
            _ => Err(format!("Invalid upload kind: {}", s)),
        }
    }
}

impl Display for UploadKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Storage bucket for a direct-upload kind. `None` for kinds that never use the direct path.
pub fn map_kind_to_bucket(kind: UploadKind) -> Option<&'static str> {
    match kind {
        UploadKind::Avatar => Some(AVATARS_BUCKET),
        UploadKind::Banner => Some(BANNERS_BUCKET),
        UploadKind::MovementMedia => None,
    }
}

/// A file held in memory together with its declared MIME type.
#[derive(Clone)]
pub struct LocalFile {
    pub bytes: Bytes,
    pub content_type: String,
    pub file_name: Option<String>,
}

impl LocalFile {
    pub fn new(bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

impl Debug for LocalFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("LocalFile")
            .field("size", &self.bytes.len())
            .field("content_type", &self.content_type)
            .field("file_name", &self.file_name)
            .finish()
    }
}

/// Authorization to PUT one object, issued by the sign step.
///
/// Used once by the transfer step and then dropped; never cached.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedUploadGrant {
    pub upload_url: String,
    pub object_key: String,
    pub public_url: Option<String>,
    pub bucket: String,
    pub expires_in_seconds: Option<u64>,
}

impl SignedUploadGrant {
    /// Host of the signed URL, safe to log.
    pub fn upload_host(&self) -> &str {
        let without_scheme = self
            .upload_url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.upload_url);
        without_scheme
            .split(['/', '?', '#'])
            .next()
            .unwrap_or_default()
    }
}

// The signed URL embeds credentials, so only its host is printed.
impl Debug for SignedUploadGrant {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SignedUploadGrant")
            .field("upload_host", &self.upload_host())
            .field("object_key", &self.object_key)
            .field("public_url", &self.public_url)
            .field("bucket", &self.bucket)
            .field("expires_in_seconds", &self.expires_in_seconds)
            .finish()
    }
}

/// Body of `POST /uploads/verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    #[serde(default)]
    pub ok: bool,
    /// Stored size as seen by the server. Diagnostic only; never overrides `ok`.
    #[serde(default, alias = "bytes")]
    pub confirmed_bytes: Option<u64>,
}

/// What a successful direct upload hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    pub ok: bool,
    pub kind: UploadKind,
    pub bucket: String,
    pub object_key: String,
    #[serde(rename = "url")]
    pub public_url: Option<String>,
    pub expires_in_seconds: Option<u64>,
}

impl UploadOutcome {
    pub fn from_grant(kind: UploadKind, grant: SignedUploadGrant) -> Self {
        Self {
            ok: true,
            kind,
            bucket: grant.bucket,
            object_key: grant.object_key,
            public_url: grant.public_url,
            expires_in_seconds: grant.expires_in_seconds,
        }
    }

    /// Reference to persist on the owning record (profile avatar or banner).
    pub fn to_media_reference(&self) -> MediaReference {
        MediaReference::new(
            self.object_key.clone(),
            self.public_url.clone(),
            self.bucket.clone(),
        )
    }
}

/// Response of the multipart `POST /uploads` path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaUploadResponse {
    pub url: String,
    #[serde(default)]
    pub object_key: Option<String>,
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub bytes: Option<u64>,
}

/// Per-invocation progress of the direct upload protocol.
///
/// `Idle → Validating → Signing → Transferring → Verifying → Done`. A failure
/// is reported with the stage it happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStage {
    Idle,
    Validating,
    Signing,
    Transferring,
    Verifying,
    Done,
}

impl Display for UploadStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            UploadStage::Idle => "idle",
            UploadStage::Validating => "validating",
            UploadStage::Signing => "signing",
            UploadStage::Transferring => "transferring",
            UploadStage::Verifying => "verifying",
            UploadStage::Done => "done",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_kind_normalization() {
        assert_eq!("avatar".parse::<UploadKind>(), Ok(UploadKind::Avatar));
        assert_eq!("  BANNER ".parse::<UploadKind>(), Ok(UploadKind::Banner));
        assert_eq!(
            "movement_media".parse::<UploadKind>(),
            Ok(UploadKind::MovementMedia)
        );
        assert!("cover".parse::<UploadKind>().is_err());
        assert!("".parse::<UploadKind>().is_err());
    }

    #[test]
    fn test_map_kind_to_bucket() {
        assert_eq!(map_kind_to_bucket(UploadKind::Avatar), Some("avatars"));
        assert_eq!(map_kind_to_bucket(UploadKind::Banner), Some("banners"));
        assert_eq!(map_kind_to_bucket(UploadKind::MovementMedia), None);
    }

    #[test]
    fn test_grant_debug_hides_signed_url() {
        let grant = SignedUploadGrant {
            upload_url: "https://storage.example.com/avatars/u1.png?X-Signature=secret"
                .to_string(),
            object_key: "avatars/u1.png".to_string(),
            public_url: None,
            bucket: "avatars".to_string(),
            expires_in_seconds: Some(600),
        };

        let printed = format!("{:?}", grant);
        assert!(!printed.contains("secret"));
        assert!(printed.contains("storage.example.com"));
        assert_eq!(grant.upload_host(), "storage.example.com");
    }

    #[test]
    fn test_outcome_wire_shape() {
        let outcome = UploadOutcome {
            ok: true,
            kind: UploadKind::Avatar,
            bucket: "avatars".to_string(),
            object_key: "avatars/u1/abc.png".to_string(),
            public_url: None,
            expires_in_seconds: None,
        };

        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(value["kind"], "avatar");
        assert_eq!(value["bucket"], "avatars");
        assert_eq!(value["objectKey"], "avatars/u1/abc.png");
        assert!(value["url"].is_null());
    }

    #[test]
    fn test_verification_result_shapes() {
        let ok: VerificationResult = serde_json::from_str(r#"{"ok":true,"bytes":2048}"#).unwrap();
        assert!(ok.ok);
        assert_eq!(ok.confirmed_bytes, Some(2048));

        let missing: VerificationResult = serde_json::from_str(r#"{"status":"done"}"#).unwrap();
        assert!(!missing.ok);

        assert!(serde_json::from_str::<VerificationResult>(r#"{"ok":"yes"}"#).is_err());
    }
}
