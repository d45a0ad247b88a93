use async_trait::async_trait;
use rally_core::{MediaReference, ProfileMedia, ProfileMediaStore, StoreError, UploadKind};
use std::sync::Arc;

/// Profile media store with an optional fallback.
///
/// Calls go to `primary`. The fallback is only consulted when the primary is
/// unavailable ([`StoreError::Unavailable`]); rejections and invalid input are
/// returned as-is.
#[derive(Clone)]
pub struct ProfileStore {
    primary: Arc<dyn ProfileMediaStore>,
    fallback: Option<Arc<dyn ProfileMediaStore>>,
}

impl ProfileStore {
    pub fn new(primary: Arc<dyn ProfileMediaStore>) -> Self {
        Self {
            primary,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn ProfileMediaStore>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    fn fallback_for(&self, err: &StoreError) -> Option<&Arc<dyn ProfileMediaStore>> {
        let fallback = self.fallback.as_ref().filter(|_| err.is_unavailable())?;
        tracing::warn!(
            primary = self.primary.name(),
            fallback = fallback.name(),
            error = %err,
            "Profile store unavailable, using fallback"
        );
        Some(fallback)
    }
}

#[async_trait]
impl ProfileMediaStore for ProfileStore {
    async fn get_profile_media(&self) -> Result<ProfileMedia, StoreError> {
        match self.primary.get_profile_media().await {
            Ok(media) => Ok(media),
            Err(err) => match self.fallback_for(&err) {
                Some(fallback) => fallback.get_profile_media().await,
                None => Err(err),
            },
        }
    }

    async fn set_profile_media(
        &self,
        kind: UploadKind,
        reference: MediaReference,
    ) -> Result<ProfileMedia, StoreError> {
        match self
            .primary
            .set_profile_media(kind, reference.clone())
            .await
        {
            Ok(media) => Ok(media),
            Err(err) => match self.fallback_for(&err) {
                Some(fallback) => fallback.set_profile_media(kind, reference).await,
                None => Err(err),
            },
        }
    }

    fn name(&self) -> &'static str {
        self.primary.name()
    }
}
