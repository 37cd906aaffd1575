//! Mapping from domain errors to HTTP responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::chat::ChatError;
use crate::core::error::DbError;

/// Error returned by every handler; renders as `{"error": "..."}`
#[derive(Debug)]
pub enum ApiError {
    Db(DbError),
    Chat(ChatError),
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Db(err) => match err {
                DbError::NotFound { .. } => StatusCode::NOT_FOUND,
                DbError::Conflict(_) => StatusCode::CONFLICT,
                DbError::Invalid(_) => StatusCode::BAD_REQUEST,
                DbError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                DbError::Forbidden(_) => StatusCode::FORBIDDEN,
                DbError::Schema { .. } | DbError::Sqlite(_) | DbError::Io(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Chat(err) => match err {
                ChatError::EmptyMessage => StatusCode::BAD_REQUEST,
                ChatError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
                ChatError::Upstream(_) => StatusCode::BAD_GATEWAY,
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::Db(DbError::Invalid(message.into()))
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Db(DbError::Unauthorized(message.into()))
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Db(DbError::Forbidden(message.into()))
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        ApiError::Db(err)
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        ApiError::Chat(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            let detail = match &self {
                ApiError::Db(err) => err.to_string(),
                ApiError::Chat(err) => err.to_string(),
                ApiError::Internal(msg) => msg.clone(),
            };
            tracing::error!(error = %detail, "request failed");
            "internal server error".to_string()
        } else {
            match self {
                ApiError::Db(err) => err.to_string(),
                ApiError::Chat(err) => err.to_string(),
                ApiError::Internal(msg) => msg,
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::from(DbError::not_found("supplier", 1)), StatusCode::NOT_FOUND),
            (ApiError::from(DbError::Conflict("dup".into())), StatusCode::CONFLICT),
            (ApiError::bad_request("bad"), StatusCode::BAD_REQUEST),
            (ApiError::unauthorized("who"), StatusCode::UNAUTHORIZED),
            (ApiError::forbidden("no"), StatusCode::FORBIDDEN),
            (ApiError::from(ChatError::NotConfigured), StatusCode::SERVICE_UNAVAILABLE),
            (ApiError::from(ChatError::Upstream("down".into())), StatusCode::BAD_GATEWAY),
            (
                ApiError::from(DbError::Schema { found: 9, supported: 1 }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status);
        }
    }
}
