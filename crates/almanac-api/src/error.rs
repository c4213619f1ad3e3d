//! API error handling

use almanac_core::AlmanacError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Error code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new("NOT_FOUND", format!("{resource} not found"))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn unauthorized() -> Self {
        Self::new(
            "UNAUTHORIZED",
            "authentication information missing or invalid",
        )
    }

    pub fn internal_error() -> Self {
        Self::new("INTERNAL_ERROR", "Internal server error")
    }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Unauthorized,
    Internal(String),
    Database(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::not_found(&msg)),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ApiError::bad_request(msg)),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, ApiError::unauthorized()),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::internal_error().with_details(msg),
            ),
            AppError::Database(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("DATABASE_ERROR", "Database operation failed").with_details(msg),
            ),
        };

        (status, Json(error)).into_response()
    }
}

impl From<AlmanacError> for AppError {
    fn from(err: AlmanacError) -> Self {
        match err {
            AlmanacError::Authentication => AppError::Unauthorized,
            AlmanacError::NotFound(msg) => AppError::NotFound(msg),
            AlmanacError::Validation(msg) => AppError::BadRequest(msg),
            AlmanacError::Database(msg) => AppError::Database(msg),
            AlmanacError::Config(msg) => AppError::Internal(format!("Configuration error: {msg}")),
            AlmanacError::Other(err) => AppError::Internal(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_maps_to_generic_unauthorized() {
        let app_error = AppError::from(AlmanacError::Authentication);
        assert!(matches!(app_error, AppError::Unauthorized));

        let rendered = ApiError::unauthorized();
        assert_eq!(rendered.message, "authentication information missing or invalid");
        assert!(rendered.details.is_none());
    }

    #[test]
    fn test_validation_maps_to_bad_request() {
        let app_error = AppError::from(AlmanacError::Validation("nope".to_string()));
        assert!(matches!(app_error, AppError::BadRequest(_)));
    }
}
