//! Single-POST multipart upload for movement media.
//!
//! Unlike avatars and banners this path has no sign/verify round-trips: the
//! backend receives the bytes itself and answers with the stored object's URL.

use rally_core::constants::MEDIA_UPLOAD_PATH;
use rally_core::{LocalFile, MediaUploadResponse, UploadKind};
use reqwest::multipart::{Form, Part};

use crate::{ApiClient, ApiError};

const DEFAULT_FILE_NAME: &str = "upload.bin";

impl ApiClient {
    /// Upload `file` as a multipart form (`file` part + `kind` field).
    ///
    /// Avatars and banners are refused here; they must go through
    /// [`ApiClient::upload_direct`].
    #[tracing::instrument(skip(self, file), fields(kind = %kind, bytes = file.size()))]
    pub async fn upload_media(
        &self,
        file: &LocalFile,
        kind: UploadKind,
    ) -> Result<MediaUploadResponse, ApiError> {
        if kind.is_direct() {
            return Err(ApiError::InvalidRequest(format!(
                "{} uploads must use the direct upload path",
                kind
            )));
        }
        if file.bytes.is_empty() {
            return Err(ApiError::InvalidRequest("file is empty".to_string()));
        }

        let file_name = file
            .file_name
            .clone()
            .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());

        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file_name)
            .mime_str(&file.content_type)
            .map_err(|e| {
                ApiError::InvalidRequest(format!(
                    "invalid content type {}: {}",
                    file.content_type, e
                ))
            })?;

        let form = Form::new().part("file", part).text("kind", kind.as_str());

        let response: MediaUploadResponse = self.post_multipart(MEDIA_UPLOAD_PATH, form).await?;
        tracing::info!(url = %response.url, "Media uploaded");
        Ok(response)
    }
}
