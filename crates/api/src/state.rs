use std::sync::Arc;

use vidshare_media::{MediaHost, Stager};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: everything is behind an `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    pub pool: vidshare_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Remote store for avatars, thumbnails and video files.
    pub media: Arc<dyn MediaHost>,
    /// Writes incoming uploads to `config.upload_tmp_dir`.
    pub stager: Stager,
}

impl AppState {
    pub fn new(pool: vidshare_db::DbPool, config: ServerConfig, media: Arc<dyn MediaHost>) -> Self {
        let stager = Stager::new(config.upload_tmp_dir.clone(), config.max_upload_bytes);
        Self {
            pool,
            config: Arc::new(config),
            media,
            stager,
        }
    }
}
