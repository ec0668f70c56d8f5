//! Remote media storage for uploaded images and videos.
//!
//! Uploads are staged to a local temp file ([`staging`]) and then forwarded
//! to a [`MediaHost`]. [`CloudinaryHost`] talks to Cloudinary's signed REST
//! API; `MemoryMediaHost` (feature `test-support`) keeps everything in
//! process for tests.

pub mod cloudinary;
pub mod error;
pub mod host;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod staging;

pub use cloudinary::{CloudinaryConfig, CloudinaryHost};
pub use error::MediaError;
pub use host::{discard, MediaHost, ResourceKind, UploadedAsset};
#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryMediaHost;
pub use staging::{upload_staged, StagedFile, Stager};
