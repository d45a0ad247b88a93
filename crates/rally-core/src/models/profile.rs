use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::models::UploadKind;

/// Pointer to an uploaded object, as persisted on the owning record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaReference {
    pub object_key: String,
    pub url: Option<String>,
    pub bucket: String,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl MediaReference {
    pub fn new(object_key: String, url: Option<String>, bucket: String) -> Self {
        Self {
            object_key,
            url,
            bucket,
            updated_at: Utc::now(),
        }
    }
}

/// Avatar and banner references of the signed-in profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileMedia {
    #[serde(default)]
    pub avatar: Option<MediaReference>,
    #[serde(default)]
    pub banner: Option<MediaReference>,
}

impl ProfileMedia {
    pub fn get(&self, kind: UploadKind) -> Option<&MediaReference> {
        match kind {
            UploadKind::Avatar => self.avatar.as_ref(),
            UploadKind::Banner => self.banner.as_ref(),
            UploadKind::MovementMedia => None,
        }
    }

    /// Replace the reference for `kind`. Only avatar and banner live on a profile.
    pub fn set(&mut self, kind: UploadKind, reference: MediaReference) -> Result<(), StoreError> {
        match kind {
            UploadKind::Avatar => self.avatar = Some(reference),
            UploadKind::Banner => self.banner = Some(reference),
            UploadKind::MovementMedia => {
                return Err(StoreError::InvalidKind(kind.as_str().to_string()))
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_reference() {
        let mut media = ProfileMedia::default();
        media
            .set(
                UploadKind::Avatar,
                MediaReference::new("avatars/a.png".to_string(), None, "avatars".to_string()),
            )
            .unwrap();
        media
            .set(
                UploadKind::Avatar,
                MediaReference::new("avatars/b.png".to_string(), None, "avatars".to_string()),
            )
            .unwrap();

        assert_eq!(
            media.get(UploadKind::Avatar).map(|r| r.object_key.as_str()),
            Some("avatars/b.png")
        );
        assert!(media.get(UploadKind::Banner).is_none());
    }

    #[test]
    fn test_set_rejects_movement_media() {
        let mut media = ProfileMedia::default();
        let result = media.set(
            UploadKind::MovementMedia,
            MediaReference::new("media/x.mp4".to_string(), None, "media".to_string()),
        );
        assert!(matches!(result, Err(StoreError::InvalidKind(_))));
    }
}
