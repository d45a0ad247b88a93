#[cfg(feature = "storage-local")]
use crate::LocalProfileStore;
use crate::ProfileStore;
use rally_core::{ClientConfig, DataMode, ProfileMediaStore, StoreError};
use std::sync::Arc;

/// Create the profile media store for the configured data mode.
///
/// `remote` is the backend store; it is only wrapped, never constructed here,
/// so this crate does not depend on the HTTP client.
pub fn create_profile_store(
    config: &ClientConfig,
    remote: Arc<dyn ProfileMediaStore>,
) -> Result<ProfileStore, StoreError> {
    match config.data_mode {
        DataMode::Remote => Ok(ProfileStore::new(remote)),

        #[cfg(feature = "storage-local")]
        DataMode::RemoteWithLocalFallback => {
            let local = LocalProfileStore::new(config.local_store_path.clone());
            Ok(ProfileStore::new(remote).with_fallback(Arc::new(local)))
        }

        #[cfg(feature = "storage-local")]
        DataMode::Local => {
            let local = LocalProfileStore::new(config.local_store_path.clone());
            Ok(ProfileStore::new(Arc::new(local)))
        }

        #[cfg(not(feature = "storage-local"))]
        DataMode::RemoteWithLocalFallback | DataMode::Local => Err(StoreError::Unavailable(
            "Local profile store not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use rally_core::MediaReference;
    use rally_core::UploadKind;
    use tempfile::tempdir;

    fn config(mode: DataMode, path: std::path::PathBuf) -> ClientConfig {
        ClientConfig {
            data_mode: mode,
            local_store_path: path,
            ..ClientConfig::default()
        }
    }

    #[tokio::test]
    async fn test_local_mode_ignores_remote() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("media.json");
        let remote: Arc<dyn ProfileMediaStore> =
            Arc::new(LocalProfileStore::new(dir.path().join("remote.json")));

        let store = create_profile_store(&config(DataMode::Local, path.clone()), remote).unwrap();
        assert_eq!(store.name(), "local");

        store
            .set_profile_media(
                UploadKind::Avatar,
                MediaReference::new("avatars/a.png".to_string(), None, "avatars".to_string()),
            )
            .await
            .unwrap();
        assert!(path.exists());
        assert!(!dir.path().join("remote.json").exists());
    }

    struct DownRemote;

    #[async_trait::async_trait]
    impl ProfileMediaStore for DownRemote {
        async fn get_profile_media(&self) -> Result<rally_core::ProfileMedia, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn set_profile_media(
            &self,
            _kind: UploadKind,
            _reference: MediaReference,
        ) -> Result<rally_core::ProfileMedia, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        fn name(&self) -> &'static str {
            "remote"
        }
    }

    #[tokio::test]
    async fn test_fallback_mode_writes_locally_when_remote_down() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("media.json");

        let remote_only =
            create_profile_store(&config(DataMode::Remote, path.clone()), Arc::new(DownRemote))
                .unwrap();
        assert_eq!(remote_only.name(), "remote");
        assert!(remote_only.get_profile_media().await.is_err());

        let with_fallback = create_profile_store(
            &config(DataMode::RemoteWithLocalFallback, path.clone()),
            Arc::new(DownRemote),
        )
        .unwrap();
        assert_eq!(with_fallback.name(), "remote");

        let media = with_fallback
            .set_profile_media(
                UploadKind::Banner,
                MediaReference::new("banners/b.png".to_string(), None, "banners".to_string()),
            )
            .await
            .unwrap();
        assert!(media.banner.is_some());
        assert!(path.exists());
    }
}
