use async_trait::async_trait;
use rally_core::{MediaReference, ProfileMedia, ProfileMediaStore, StoreError, UploadKind};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Profile media kept in a single JSON file.
///
/// Writes go to a sibling temp file that is renamed over the target, so a
/// crash mid-write leaves the previous record intact. A missing file reads as
/// an empty profile.
pub struct LocalProfileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl LocalProfileStore {
    /// Create a store backed by `path` (e.g. ".rally/profile_media.json").
    /// Parent directories are created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<ProfileMedia, StoreError> {
        let data = match fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ProfileMedia::default()),
            Err(e) => return Err(e.into()),
        };

        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(ProfileMedia::default());
        }

        Ok(serde_json::from_slice(&data)?)
    }

    async fn write(&self, media: &ProfileMedia) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let data = serde_json::to_vec_pretty(media)?;
        let tmp_path = self.tmp_path();

        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&tmp_path, &self.path).await?;

        tracing::debug!(
            path = %self.path.display(),
            size_bytes = data.len(),
            "Profile media written"
        );
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl ProfileMediaStore for LocalProfileStore {
    async fn get_profile_media(&self) -> Result<ProfileMedia, StoreError> {
        self.read().await
    }

    async fn set_profile_media(
        &self,
        kind: UploadKind,
        reference: MediaReference,
    ) -> Result<ProfileMedia, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut media = self.read().await?;
        media.set(kind, reference)?;
        self.write(&media).await?;

        tracing::info!(
            kind = %kind,
            path = %self.path.display(),
            "Local profile media updated"
        );
        Ok(media)
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
