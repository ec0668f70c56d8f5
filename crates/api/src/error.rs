//! HTTP error type and its failure envelope.

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use vidshare_core::error::CoreError;
use vidshare_media::MediaError;

/// Message shown for every 5xx whose cause must not leak.
const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// Errors returned by handlers.
///
/// Domain failures arrive as [`CoreError`]; the remaining variants are
/// HTTP-specific. Each renders as
/// `{ statusCode, data: null, message, success: false, code }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Staging or media host failure.
    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Not found, for lookups that are not keyed by id (e.g. username).
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// A file could not be stored on the media host. The message names the
    /// field and is shown to the caller; the cause was logged at upload time.
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        match err.status() {
            StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge(err.body_text()),
            _ => AppError::BadRequest(err.body_text()),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Oversized bodies keep their 413; every other JSON failure is a 400.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge(rejection.body_text()),
            _ => AppError::BadRequest(rejection.body_text()),
        }
    }
}

/// What a failed request reports to the caller.
struct Failure {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl Failure {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// 500 with the cause logged and replaced by [`INTERNAL_MESSAGE`].
    fn internal(cause: &dyn std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %cause, "{context}");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", INTERNAL_MESSAGE)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FailureBody<'a> {
    status_code: u16,
    data: Option<()>,
    message: &'a str,
    success: bool,
    code: &'a str,
}

impl AppError {
    fn failure(&self) -> Failure {
        match self {
            AppError::Core(err) => core_failure(err),
            AppError::Database(err) => database_failure(err),
            AppError::Media(err) => media_failure(err),
            AppError::BadRequest(msg) => Failure::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            AppError::NotFound(msg) => Failure::new(StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            AppError::PayloadTooLarge(msg) => {
                Failure::new(StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg)
            }
            AppError::UploadFailed(msg) => {
                Failure::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
            AppError::InternalError(msg) => Failure::internal(msg, "Internal error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let failure = self.failure();
        let body = FailureBody {
            status_code: failure.status.as_u16(),
            data: None,
            message: &failure.message,
            success: false,
            code: failure.code,
        };
        (failure.status, Json(body)).into_response()
    }
}

fn core_failure(err: &CoreError) -> Failure {
    match err {
        CoreError::NotFound { entity, id } => Failure::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => Failure::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
        CoreError::Conflict(msg) => Failure::new(StatusCode::CONFLICT, "CONFLICT", msg),
        CoreError::Unauthorized(msg) => Failure::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
        CoreError::Forbidden(msg) => Failure::new(StatusCode::FORBIDDEN, "FORBIDDEN", msg),
        CoreError::Internal(msg) => Failure::internal(msg, "Internal core error"),
    }
}

/// `RowNotFound` is 404 and a unique violation on a `uq_*` constraint is
/// 409. Anything else is a sanitized 500.
fn database_failure(err: &sqlx::Error) -> Failure {
    match err {
        sqlx::Error::RowNotFound => {
            Failure::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Resource not found")
        }
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            match db_err.constraint().and_then(|c| c.strip_prefix("uq_")) {
                Some(constraint) => {
                    Failure::new(StatusCode::CONFLICT, "CONFLICT", conflict_message(constraint))
                }
                None => Failure::internal(db_err, "Unique violation on unnamed constraint"),
            }
        }
        other => Failure::internal(other, "Database error"),
    }
}

fn conflict_message(constraint: &str) -> String {
    match constraint {
        "users_username" => "Username is already taken".to_string(),
        "users_email" => "Email is already registered".to_string(),
        other => format!("Duplicate value violates unique constraint: uq_{other}"),
    }
}

fn media_failure(err: &MediaError) -> Failure {
    match err {
        MediaError::TooLarge { .. } => {
            Failure::new(StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", err.to_string())
        }
        MediaError::Empty | MediaError::Stream(_) => {
            Failure::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", err.to_string())
        }
        other => Failure::internal(other, "Media error"),
    }
}
