//! In-process [`MediaHost`] for tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::MediaError;
use crate::host::{MediaHost, ResourceKind, UploadedAsset};

/// Duration reported for every uploaded video.
pub const FAKE_VIDEO_DURATION: f64 = 42.5;

#[derive(Debug, Clone)]
struct StoredAsset {
    kind: ResourceKind,
    bytes: Vec<u8>,
}

/// Keeps uploaded files in memory and records deletions.
#[derive(Debug, Default)]
pub struct MemoryMediaHost {
    assets: Mutex<HashMap<String, StoredAsset>>,
    deleted: Mutex<Vec<String>>,
    next_id: AtomicU64,
    uploads: AtomicU64,
    fail_uploads: AtomicBool,
}

impl MemoryMediaHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent upload fail with a 500 from the "host".
    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Number of successful uploads so far.
    pub fn upload_count(&self) -> u64 {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn contains(&self, public_id: &str) -> bool {
        self.lock_assets().contains_key(public_id)
    }

    /// Stored bytes of an asset, if present.
    pub fn bytes(&self, public_id: &str) -> Option<Vec<u8>> {
        self.lock_assets().get(public_id).map(|a| a.bytes.clone())
    }

    /// Public ids of currently stored assets, sorted.
    pub fn public_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock_assets().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Public ids passed to [`MediaHost::delete`], in call order.
    pub fn deleted(&self) -> Vec<String> {
        self.deleted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn lock_assets(&self) -> std::sync::MutexGuard<'_, HashMap<String, StoredAsset>> {
        self.assets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl MediaHost for MemoryMediaHost {
    async fn upload(
        &self,
        path: &Path,
        file_name: &str,
        kind: ResourceKind,
    ) -> Result<UploadedAsset, MediaError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(MediaError::Api {
                status: 500,
                body: "upload rejected".into(),
            });
        }

        let bytes = tokio::fs::read(path).await?;
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let public_id = format!("{}-{n}", kind.as_str());
        let duration = (kind == ResourceKind::Video).then_some(FAKE_VIDEO_DURATION);

        self.lock_assets()
            .insert(public_id.clone(), StoredAsset { kind, bytes });
        self.uploads.fetch_add(1, Ordering::SeqCst);

        Ok(UploadedAsset {
            url: format!("memory://{}/{public_id}/{file_name}", kind.as_str()),
            public_id,
            duration,
        })
    }

    async fn delete(&self, public_id: &str, kind: ResourceKind) -> Result<(), MediaError> {
        self.deleted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(public_id.to_string());

        let mut assets = self.lock_assets();
        if let Some(stored) = assets.get(public_id) {
            if kind != ResourceKind::Auto && stored.kind != ResourceKind::Auto && stored.kind != kind
            {
                return Err(MediaError::Api {
                    status: 400,
                    body: format!("{public_id} is not a {}", kind.as_str()),
                });
            }
            assets.remove(public_id);
        }
        Ok(())
    }
}
