//! Protocol paths, header names and policy defaults.

/// Header used to correlate the sign, transfer and verify calls of one upload.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Upload authorization endpoint (relative to the backend base URL).
pub const SIGN_PATH: &str = "/uploads/sign";

/// Post-transfer size confirmation endpoint.
pub const VERIFY_PATH: &str = "/uploads/verify";

/// Single-POST multipart upload endpoint used by `movement-media`.
pub const MEDIA_UPLOAD_PATH: &str = "/uploads";

/// Profile avatar/banner references.
pub const PROFILE_MEDIA_PATH: &str = "/profiles/me/media";

pub const AVATARS_BUCKET: &str = "avatars";
pub const BANNERS_BUCKET: &str = "banners";

/// 5 MiB
pub const DEFAULT_AVATAR_MAX_BYTES: u64 = 5 * 1024 * 1024;

/// 10 MiB
pub const DEFAULT_BANNER_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// Smallest image accepted on the direct path. Rejects empty and placeholder files.
pub const MIN_IMAGE_BYTES: u64 = 64;

/// Image formats accepted for avatars and banners.
pub const IMAGE_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

pub const DEFAULT_TRANSFER_TIMEOUT_MS: u64 = 30_000;

/// Sign and verify carry metadata only, so they get a shorter budget than the PUT.
pub const DEFAULT_METADATA_TIMEOUT_MS: u64 = 15_000;

/// Chunk size used when streaming the PUT body (drives progress granularity).
pub const TRANSFER_CHUNK_SIZE: usize = 64 * 1024;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_LOCAL_STORE_PATH: &str = ".rally/profile_media.json";
