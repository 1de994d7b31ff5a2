use axum::extract::FromRequest;

use crate::error::ApiError;

/// `axum::Json` whose rejection is reported as an [`ApiError`], so a body
/// that fails to parse still gets the `{"error": ...}` shape.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
