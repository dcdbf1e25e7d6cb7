//! HTTP mapping for domain errors
//!
//! Every handler returns `ApiResult<T>`; failures leave as `{ "error": "..." }`
//! with a status derived from the `DomainError` variant.

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::domain::DomainError;

#[derive(Debug)]
pub struct ApiError(pub DomainError);

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DomainError::Unauthenticated => StatusCode::UNAUTHORIZED,
            DomainError::Forbidden => StatusCode::FORBIDDEN,
            DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Upstream(_) => StatusCode::BAD_GATEWAY,
            DomainError::DependencyFailed(_)
            | DomainError::Database(_)
            | DomainError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self(DomainError::from(err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(DomainError::validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(DomainError::validation(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self(DomainError::validation(rejection.body_text()))
    }
}

/// `Json` body extractor whose rejections leave as 400 `{ "error": ... }`
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Query` extractor with the same rejection shape as [`ApiJson`]
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            DomainError::Upstream(cause) => {
                tracing::error!("Upstream failure: {}", cause);
                "Book catalog is currently unavailable".to_string()
            }
            DomainError::DependencyFailed(cause) => {
                tracing::error!("Dependent write failed: {}", cause);
                "Could not prepare the user profile".to_string()
            }
            DomainError::Database(cause) | DomainError::Configuration(cause) => {
                tracing::error!("Internal error: {}", cause);
                "Internal server error".to_string()
            }
            DomainError::Validation(msg) => msg.clone(),
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Reject a missing or non-positive id parameter
pub fn require_id(value: Option<i32>, name: &str) -> Result<i32, ApiError> {
    match value {
        Some(id) if id > 0 => Ok(id),
        _ => Err(DomainError::validation(format!("{} is required", name)).into()),
    }
}
