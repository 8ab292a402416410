use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;
use tracing::error;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Field-level validation failures, serialized as a `field -> message` map.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldErrors(pub BTreeMap<String, String>);

impl FieldErrors {
    pub fn single(field: &str, message: &str) -> Self {
        let mut map = BTreeMap::new();
        map.insert(field.to_string(), message.to_string());
        Self(map)
    }

    pub fn insert(&mut self, field: &str, message: &str) {
        self.0.insert(field.to_string(), message.to_string());
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("You do not have permission to perform this action.")]
    Forbidden,

    #[error("{0}")]
    Validation(FieldErrors),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn unauthorized(message: &str) -> Self {
        Self::Unauthorized(message.to_string())
    }

    pub fn validation(field: &str, message: &str) -> Self {
        Self::Validation(FieldErrors::single(field, message))
    }

    pub fn not_found(message: &str) -> Self {
        Self::NotFound(message.to_string())
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Not found.".to_string()),
            other => ApiError::Database(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "detail": msg }))).into_response()
            }
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                Json(json!({ "detail": "You do not have permission to perform this action." })),
            )
                .into_response(),
            ApiError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(json!(errors.0))).into_response()
            }
            ApiError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, Json(json!({ "detail": msg }))).into_response()
            }
            ApiError::Conflict(msg) => {
                (StatusCode::CONFLICT, Json(json!({ "detail": msg }))).into_response()
            }
            ApiError::Database(err) => {
                error!(error = %err, "database error");
                internal_response()
            }
            ApiError::Internal(err) => {
                error!(error = %err, "internal error");
                internal_response()
            }
        }
    }
}

fn internal_response() -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": "Internal server error." })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_body_is_a_field_message_map() {
        let mut errors = FieldErrors::single("email", "This field is required.");
        errors.insert("password", "Password too short.");
        let response = ApiError::Validation(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn field_errors_display_joins_fields() {
        let mut errors = FieldErrors::single("a", "x");
        errors.insert("b", "y");
        assert_eq!(errors.to_string(), "a: x; b: y");
    }
}
