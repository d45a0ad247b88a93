//! Backend-backed profile media store.

use async_trait::async_trait;
use rally_core::constants::PROFILE_MEDIA_PATH;
use rally_core::{MediaReference, ProfileMedia, ProfileMediaStore, StoreError, UploadKind};
use serde::Serialize;

use crate::ApiClient;

#[derive(Serialize)]
struct ProfileMediaUpdate<'a> {
    kind: &'a str,
    object_key: &'a str,
    url: Option<&'a str>,
    bucket: &'a str,
}

/// Reads and writes `/profiles/me/media` with the client's bearer token.
#[derive(Debug, Clone)]
pub struct RemoteProfileStore {
    client: ApiClient,
}

impl RemoteProfileStore {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProfileMediaStore for RemoteProfileStore {
    async fn get_profile_media(&self) -> Result<ProfileMedia, StoreError> {
        Ok(self.client.get(PROFILE_MEDIA_PATH).await?)
    }

    async fn set_profile_media(
        &self,
        kind: UploadKind,
        reference: MediaReference,
    ) -> Result<ProfileMedia, StoreError> {
        if !kind.is_image() {
            return Err(StoreError::InvalidKind(kind.as_str().to_string()));
        }

        let update = ProfileMediaUpdate {
            kind: kind.as_str(),
            object_key: &reference.object_key,
            url: reference.url.as_deref(),
            bucket: &reference.bucket,
        };

        Ok(self.client.patch_json(PROFILE_MEDIA_PATH, &update).await?)
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}
