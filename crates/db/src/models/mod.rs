//! Row structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - `Serialize` response shapes (camelCase on the wire)
//! - Plain create/update DTOs consumed by the repositories

pub mod comment;
pub mod dashboard;
pub mod like;
pub mod playlist;
pub mod post;
pub mod subscription;
pub mod user;
pub mod video;
