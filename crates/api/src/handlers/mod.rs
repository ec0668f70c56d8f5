pub mod comment;
pub mod likes;
pub mod playlist;
pub mod posts;
pub mod subscriptions;
pub mod users;
pub mod video;

use serde::Deserialize;
use vidshare_core::error::CoreError;
use vidshare_core::listing::{lenient_number, PageRequest};
use vidshare_core::types::DbId;
use vidshare_media::{upload_staged, ResourceKind, StagedFile, UploadedAsset};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// `?page=&limit=` query parameters for paged lists other than videos.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default, deserialize_with = "lenient_number")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub limit: Option<i64>,
}

impl PageQuery {
    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

/// Reject a mutation of `entity` unless `user` owns it.
pub(crate) fn ensure_owner(owner_id: DbId, user: &AuthUser, entity: &str) -> AppResult<()> {
    if owner_id != user.user_id {
        return Err(AppError::Core(CoreError::forbidden(format!(
            "You are not the owner of this {entity}"
        ))));
    }
    Ok(())
}

/// Upload a staged file that the request must carry.
///
/// `label` names the file in the user-facing error, e.g. "avatar".
pub(crate) async fn upload_required(
    state: &AppState,
    staged: Option<StagedFile>,
    kind: ResourceKind,
    label: &str,
) -> AppResult<UploadedAsset> {
    let staged = staged.ok_or_else(|| {
        AppError::Core(CoreError::validation(format!("{label} file is required")))
    })?;
    upload_staged(state.media.as_ref(), Some(staged), kind)
        .await
        .ok_or_else(|| AppError::UploadFailed(format!("Failed to upload {label}")))
}
