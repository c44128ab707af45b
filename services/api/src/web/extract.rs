//! services/api/src/web/extract.rs

use crate::error::ApiError;
use axum::extract::FromRequest;

/// `axum::Json` whose rejections render as an `ApiError` 400 with a JSON body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);
