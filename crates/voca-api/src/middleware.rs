use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};

use crate::auth::AppState;
use crate::error::ApiError;

/// Header carrying the group token on requests that also send a bearer
/// user token.
pub const GROUP_TOKEN_HEADER: &str = "x-group-token";

/// Identity resolved from a verified user token, valid for one request only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub i64);

/// User token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub fn group_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(GROUP_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve the bearer user token and stash the identity for the handler.
pub async fn require_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = bearer_token(req.headers())
        .and_then(|token| state.tokens.resolve_user_id(token))
        .ok_or(ApiError::Unauthorized)?;

    req.extensions_mut().insert(CurrentUser(user_id));
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn bearer_prefix_is_required() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("abc.def.ghi"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer  abc.def.ghi "));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn group_header_is_read() {
        let mut headers = HeaderMap::new();
        assert_eq!(group_token(&headers), None);
        headers.insert(GROUP_TOKEN_HEADER, HeaderValue::from_static("g.t.k"));
        assert_eq!(group_token(&headers), Some("g.t.k"));
    }
}
