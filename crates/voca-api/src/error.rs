use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use voca_db::DbError;
use voca_types::api::{ErrorResponse, ValidationDetails};

/// Everything a route can fail with, mapped onto one HTTP status each.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// One or more profile fields were rejected.
    #[error("Validation failed")]
    Validation(ValidationDetails),

    /// Any token failure. The response never says which check failed.
    #[error("Invalid or expired token")]
    Unauthorized,

    /// Body was not JSON or did not match the route's shape.
    #[error("{0}")]
    BadRequest(String),

    #[error("Incorrect password!")]
    WrongPassword,

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Username or email already exists!")]
    Conflict,

    /// Logged with full context; the client only sees a generic message.
    #[error("Internal server error!")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) | Self::Conflict => StatusCode::BAD_REQUEST,
            Self::Unauthorized | Self::WrongPassword => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Conflict => Self::Conflict,
            other => Self::internal(other),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::Validation(details) => ErrorResponse {
                error: "Validation failed".to_string(),
                details: Some(details),
            },
            Self::Internal(e) => {
                error!("Internal error: {:#}", e);
                ErrorResponse {
                    error: "Internal server error!".to_string(),
                    details: None,
                }
            }
            other => ErrorResponse {
                error: other.to_string(),
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(ApiError::Conflict.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::WrongPassword.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NotFound("User not found!").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::BadRequest("missing field `text`".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::internal(anyhow::anyhow!("disk full")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn db_conflict_maps_to_conflict() {
        assert!(matches!(ApiError::from(DbError::Conflict), ApiError::Conflict));
        assert!(matches!(
            ApiError::from(DbError::LockPoisoned),
            ApiError::Internal(_)
        ));
    }

    #[test]
    fn internal_details_stay_server_side() {
        let err = ApiError::internal(anyhow::anyhow!("table users is locked"));
        assert_eq!(err.to_string(), "Internal server error!");
    }
}
