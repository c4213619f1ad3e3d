//! Authentication and session management
//!
//! This module implements the session/token protocol:
//! - Token codec: signed, purpose-tagged access and refresh tokens
//! - Session service: login, logout, renewal, rotation, password change
//! - Request guards: bearer-token extraction for protected handlers

pub mod guard;
pub mod service;
pub mod token;

pub use guard::{AuthError, AuthenticatedAdmin};
pub use service::{
    ChangePasswordRequest, ChangePasswordResponse, LoginRequest, LoginResponse, RefreshRequest,
    RenewResponse, SessionService, VerifiedSession,
};
pub use token::{
    issue_token, issue_token_with_validity, verify_token, IssuedToken, TokenClaims, TokenError,
    TokenPurpose,
};
