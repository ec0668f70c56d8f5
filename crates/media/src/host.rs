//! The [`MediaHost`] abstraction shared by all storage backends.

use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::MediaError;

/// Kind of asset, as understood by the media host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Image,
    Video,
    /// Let the host detect the type. Only meaningful for uploads.
    Auto,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Auto => "auto",
        }
    }
}

/// A file stored on the media host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadedAsset {
    /// Public HTTPS URL of the asset.
    pub url: String,
    /// Host-side identifier, needed to delete the asset later.
    pub public_id: String,
    /// Playback length in seconds for audio/video assets.
    pub duration: Option<f64>,
}

/// A remote store for user media.
#[async_trait]
pub trait MediaHost: Send + Sync {
    /// Upload the local file at `path`. `file_name` is the client-supplied
    /// name, used only as a hint.
    async fn upload(
        &self,
        path: &Path,
        file_name: &str,
        kind: ResourceKind,
    ) -> Result<UploadedAsset, MediaError>;

    /// Delete a previously uploaded asset. Deleting an asset that no longer
    /// exists succeeds.
    async fn delete(&self, public_id: &str, kind: ResourceKind) -> Result<(), MediaError>;
}

/// Best-effort delete for cleanup paths: failures are logged, not returned.
pub async fn discard(host: &dyn MediaHost, public_id: &str, kind: ResourceKind) {
    if let Err(e) = host.delete(public_id, kind).await {
        tracing::warn!(public_id, kind = kind.as_str(), error = %e, "Failed to delete remote asset");
    }
}
