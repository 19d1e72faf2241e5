use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::QueryRejection;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;
use tracing::error;

use crate::pricing::PricingError;
use crate::repo::RepoError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(anyhow::Error),
    #[error("Resource not found")]
    NotFound,
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Invalid rating: {0}")]
    InvalidRating(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),
}

impl From<anyhow::Error> for ApiError {
    /// Maps repository failures onto HTTP errors
    ///
    /// Typed repository errors and unique-constraint violations keep their
    /// meaning; anything else is reported as an internal error.
    fn from(err: anyhow::Error) -> Self {
        if let Some(repo_err) = err.downcast_ref::<RepoError>() {
            return match repo_err {
                RepoError::NotFound(_) => ApiError::NotFound,
                RepoError::Conflict(msg) => ApiError::Conflict(msg.clone()),
                RepoError::InvalidTransition(msg) => ApiError::InvalidTransition(msg.clone()),
                RepoError::Validation(msg) => ApiError::Validation(msg.clone()),
            };
        }
        if let Some(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)) =
            err.downcast_ref::<DieselError>()
        {
            return ApiError::Conflict(format!("Duplicate value: {}", info.message()));
        }
        ApiError::Database(err)
    }
}

impl From<PricingError> for ApiError {
    fn from(err: PricingError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Database(err) => {
                error!("Internal error: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Resource not found".to_string()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InvalidRating(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::InvalidTransition(msg) => (StatusCode::CONFLICT, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
