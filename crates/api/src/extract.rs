//! Extractors whose rejections render as the failure envelope.
//!
//! axum's own `Path`, `Query` and `Json` reject with a plain-text body.
//! Handlers use these wrappers instead so a malformed id, query string or
//! JSON body still answers `{ statusCode, data: null, message, success }`.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// `axum::extract::Path` rejecting with [`AppError::BadRequest`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);

/// `axum::extract::Query` rejecting with [`AppError::BadRequest`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);

/// `axum::Json` rejecting with [`AppError::BadRequest`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);
