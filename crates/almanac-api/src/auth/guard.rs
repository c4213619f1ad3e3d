//! Request authentication guards
//!
//! The access guard is an extractor: protected handlers take an
//! [`AuthenticatedAdmin`] argument and the extraction verifies the bearer
//! token with the codec alone, no store round-trip. Access tokens trade
//! instant revocation for keeping the hot write paths off the database.
//!
//! The refresh guard has no code of its own here; handlers pass the
//! body-supplied refresh token to
//! [`SessionService::verify_refresh_session`](super::service::SessionService).

use super::token::{verify_token, TokenError, TokenPurpose};
use crate::audit::{audit_log, AuditEvent};
use crate::state::AppState;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use thiserror::Error;

/// Admin identity extracted from a verified access token
#[derive(Debug, Clone)]
pub struct AuthenticatedAdmin {
    pub username: String,
}

/// Access guard errors
///
/// The variants exist for audit logging; every one of them renders as the
/// same generic 401 so callers learn nothing about why they were refused.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingAuthHeader,

    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] TokenError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "code": "UNAUTHORIZED",
            "message": "authentication information missing or invalid",
        });

        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthenticatedAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidAuthHeader)?;

        match verify_token(&state.config.auth, token, TokenPurpose::Access) {
            Ok(claims) => Ok(AuthenticatedAdmin {
                username: claims.sub,
            }),
            Err(e) => {
                audit_log(&AuditEvent::InvalidToken {
                    reason: e.to_string(),
                });
                Err(AuthError::InvalidToken(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn response_body(error: AuthError) -> (StatusCode, String) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_every_guard_failure_renders_identically() {
        let (missing_status, missing_body) = response_body(AuthError::MissingAuthHeader).await;
        let (format_status, format_body) = response_body(AuthError::InvalidAuthHeader).await;
        let (token_status, token_body) =
            response_body(AuthError::InvalidToken(TokenError::ExpiredToken)).await;

        assert_eq!(missing_status, StatusCode::UNAUTHORIZED);
        assert_eq!(format_status, StatusCode::UNAUTHORIZED);
        assert_eq!(token_status, StatusCode::UNAUTHORIZED);

        // No distinguishable detail in any of the three
        assert_eq!(missing_body, format_body);
        assert_eq!(missing_body, token_body);
    }
}
