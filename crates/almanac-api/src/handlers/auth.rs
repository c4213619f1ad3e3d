//! Authentication API handlers
//!
//! HTTP endpoints for admin login, logout, token renewal, and password
//! change. The handlers are thin: every protocol decision lives in
//! [`SessionService`].

use crate::auth::{
    ChangePasswordRequest, ChangePasswordResponse, LoginRequest, LoginResponse, RefreshRequest,
    RenewResponse, SessionService,
};
use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Logout response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogoutResponse {
    pub message: String,
}

fn service(state: &AppState) -> &SessionService {
    &state.sessions
}

/// Login with username and password
///
/// Returns an access token (15 minutes) and a refresh token (120 minutes).
/// Opening a session replaces any prior session for the same admin. An
/// unknown username and a wrong password produce the same response.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.increment_requests();

    let response = service(&state)
        .login(&request.username, &request.password)
        .await?;

    Ok(Json(response))
}

/// Renew the access token
///
/// Exchanges a valid refresh token for a fresh access token. When the
/// refresh token is within 20 minutes of expiry it is rotated and the
/// response additionally carries the replacement refresh token; outside the
/// window the presented token remains valid and no refresh token is
/// returned.
#[utoipa::path(
    post,
    path = "/api/v1/auth/renew",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token renewed", body = RenewResponse),
        (status = 401, description = "Invalid refresh token", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn renew_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RefreshRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.increment_requests();

    let response = service(&state).renew(&request.refresh_token).await?;

    Ok(Json(response))
}

/// Logout the current session
///
/// Deletes the session bound to the presented refresh token. If verification
/// rotates the token first, the rotated session is the one closed, so
/// nothing is left dangling.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Logout successful", body = LogoutResponse),
        (status = 401, description = "Invalid refresh token", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RefreshRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.increment_requests();

    service(&state).logout(&request.refresh_token).await?;

    Ok(Json(LogoutResponse {
        message: "Logged out successfully".to_string(),
    }))
}

/// Change the admin password
///
/// Requires a valid refresh token and the current password. A rotation that
/// occurs during verification is kept even when the password change itself
/// is rejected; the response carries the rotated refresh token when one was
/// produced.
#[utoipa::path(
    post,
    path = "/api/v1/auth/password",
    tag = "auth",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ChangePasswordResponse),
        (status = 400, description = "Password change rejected", body = crate::error::ApiError),
        (status = 401, description = "Invalid refresh token", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn change_password_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.increment_requests();

    let response = service(&state)
        .change_password(
            &request.refresh_token,
            &request.current_password,
            &request.new_password,
        )
        .await?;

    Ok(Json(response))
}
