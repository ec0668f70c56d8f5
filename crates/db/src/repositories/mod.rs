//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod comment_repo;
pub mod dashboard_repo;
pub mod like_repo;
pub mod playlist_repo;
pub mod post_repo;
pub mod subscription_repo;
pub mod user_repo;
pub mod video_repo;

pub use comment_repo::CommentRepo;
pub use dashboard_repo::DashboardRepo;
pub use like_repo::LikeRepo;
pub use playlist_repo::PlaylistRepo;
pub use post_repo::PostRepo;
pub use subscription_repo::SubscriptionRepo;
pub use user_repo::UserRepo;
pub use video_repo::VideoRepo;

/// Select list for [`crate::models::user::UserSummary`]; expects `users`
/// to be aliased as `u`.
pub const USER_SUMMARY_COLUMNS: &str =
    "u.id AS u_id, u.username AS u_username, u.full_name AS u_full_name, u.avatar_url AS u_avatar";

/// Select list for [`crate::models::video::VideoSummary`]; expects `videos`
/// as `v` joined to `users` as `u`.
pub const VIDEO_SUMMARY_COLUMNS: &str = "v.id, v.video_file_url AS video_file, \
     v.thumbnail_url AS thumbnail, v.title, v.description, v.duration, v.views, \
     v.is_published, v.created_at, \
     u.id AS u_id, u.username AS u_username, u.full_name AS u_full_name, u.avatar_url AS u_avatar";

/// Visibility rule for videos: published, or owned by the viewer bound at
/// `$n`. A `NULL` viewer only sees published videos.
pub(crate) fn visible_to(param: u32) -> String {
    format!("(v.is_published OR v.owner_id = ${param})")
}
