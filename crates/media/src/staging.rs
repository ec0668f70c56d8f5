//! Local staging of incoming uploads.
//!
//! An upload is streamed into a uniquely named file under the staging
//! directory. The file lives exactly as long as its [`StagedFile`]; dropping
//! the guard removes it, whichever way the request ends.

use std::path::{Path, PathBuf};

use futures::{Stream, StreamExt};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

use crate::error::MediaError;
use crate::host::{MediaHost, ResourceKind, UploadedAsset};

/// Longest file extension carried over from the client's file name.
const MAX_EXTENSION_LEN: usize = 10;

/// An upload on local disk, removed when dropped.
#[derive(Debug)]
pub struct StagedFile {
    file: NamedTempFile,
    file_name: String,
    content_type: Option<String>,
    size: u64,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Client-supplied file name.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Writes uploads into a staging directory with a size cap.
#[derive(Debug, Clone)]
pub struct Stager {
    dir: PathBuf,
    max_bytes: u64,
}

impl Stager {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the staging directory if it does not exist.
    pub async fn ensure_dir(&self) -> Result<(), MediaError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Stream `body` into a new staged file.
    ///
    /// Fails with [`MediaError::TooLarge`] once more than `max_bytes` have
    /// been received and with [`MediaError::Empty`] for a zero-byte upload.
    /// On any error the partial file is removed before returning.
    pub async fn stage<S, B, E>(
        &self,
        file_name: Option<&str>,
        content_type: Option<&str>,
        body: S,
    ) -> Result<StagedFile, MediaError>
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: std::fmt::Display,
    {
        let file_name = file_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or("upload")
            .to_string();

        let (temp, file) = self.create_temp(&file_name).await?;
        let mut writer = tokio::fs::File::from_std(file);

        let mut body = std::pin::pin!(body);
        let mut size: u64 = 0;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| MediaError::Stream(e.to_string()))?;
            let bytes = chunk.as_ref();
            size += bytes.len() as u64;
            if size > self.max_bytes {
                return Err(MediaError::TooLarge {
                    limit: self.max_bytes,
                });
            }
            writer.write_all(bytes).await?;
        }
        writer.flush().await?;

        if size == 0 {
            return Err(MediaError::Empty);
        }

        tracing::debug!(
            path = %temp.path().display(),
            file_name = %file_name,
            size,
            "Staged upload",
        );

        Ok(StagedFile {
            file: temp,
            file_name,
            content_type: content_type.map(str::to_string),
            size,
        })
    }

    /// Create the staged file and a second handle to write through.
    ///
    /// `tempfile` only has blocking calls, so both run on the blocking pool.
    async fn create_temp(
        &self,
        file_name: &str,
    ) -> Result<(NamedTempFile, std::fs::File), MediaError> {
        let dir = self.dir.clone();
        let suffix = extension_suffix(file_name);
        let created = tokio::task::spawn_blocking(move || {
            let temp = tempfile::Builder::new()
                .prefix("upload-")
                .suffix(&suffix)
                .tempfile_in(&dir)?;
            let file = temp.reopen()?;
            Ok::<_, std::io::Error>((temp, file))
        })
        .await
        .map_err(std::io::Error::other)??;
        Ok(created)
    }
}

/// `.ext` taken from the client's file name, if it is short and plain.
fn extension_suffix(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            format!(".{}", ext.to_ascii_lowercase())
        }
        _ => String::new(),
    }
}

/// Forward a staged file to the media host.
///
/// Returns `None` when there is nothing to upload or the upload fails; the
/// failure is logged here and the caller decides what it means for the
/// request. The staged file is removed before this returns in every case.
pub async fn upload_staged(
    host: &dyn MediaHost,
    staged: Option<StagedFile>,
    kind: ResourceKind,
) -> Option<UploadedAsset> {
    let staged = staged?;
    let result = host.upload(staged.path(), staged.file_name(), kind).await;
    drop(staged);

    match result {
        Ok(asset) => Some(asset),
        Err(e) => {
            tracing::error!(kind = kind.as_str(), error = %e, "Media upload failed");
            None
        }
    }
}
