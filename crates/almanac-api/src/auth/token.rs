//! Token generation and validation
//!
//! Signed JWTs with HMAC-SHA256, one symmetric secret per token purpose so a
//! leaked access secret cannot forge refresh tokens or the other way around.
//! Access tokens are short-lived and self-verifying; refresh tokens are the
//! only kind cross-checked against the session store (by the session
//! service, not here).

use almanac_core::AuthConfig;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Token issuer identifier
const ISSUER: &str = "almanac-api";

/// What a token is allowed to authenticate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    /// Authorizes a single protected write, never store-checked
    Access,
    /// Re-authenticates session-bound operations, always store-checked
    Refresh,
}

/// JWT claims carried by both token kinds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Token issuer (always "almanac-api")
    pub iss: String,
    /// Subject - admin username
    pub sub: String,
    /// Unique token identifier; keeps tokens minted within the same second
    /// from colliding
    pub jti: String,
    /// Token purpose; must match the endpoint's expectation
    pub purpose: TokenPurpose,
    /// Issued at timestamp (Unix epoch)
    pub iat: i64,
    /// Expiration timestamp (Unix epoch)
    pub exp: i64,
}

/// Token generation and validation errors
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Failed to encode token: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token format")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token purpose does not match the expected purpose")]
    WrongPurpose,
}

/// A freshly minted token together with its expiry metadata.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

fn secret_for(config: &AuthConfig, purpose: TokenPurpose) -> &str {
    match purpose {
        TokenPurpose::Access => &config.access_secret,
        TokenPurpose::Refresh => &config.refresh_secret,
    }
}

fn validity_for(config: &AuthConfig, purpose: TokenPurpose) -> Duration {
    match purpose {
        TokenPurpose::Access => Duration::minutes(config.access_validity_mins),
        TokenPurpose::Refresh => Duration::minutes(config.refresh_validity_mins),
    }
}

/// Issue a token with the purpose's configured validity window.
pub fn issue_token(
    config: &AuthConfig,
    username: &str,
    purpose: TokenPurpose,
) -> Result<IssuedToken, TokenError> {
    issue_token_with_validity(config, username, purpose, validity_for(config, purpose))
}

/// Issue a token with an explicit validity window.
///
/// The session service and the near-expiry tests use this directly; everyone
/// else goes through [`issue_token`].
pub fn issue_token_with_validity(
    config: &AuthConfig,
    username: &str,
    purpose: TokenPurpose,
    validity: Duration,
) -> Result<IssuedToken, TokenError> {
    let now = Utc::now();
    let expires_at = now + validity;

    let claims = TokenClaims {
        iss: ISSUER.to_string(),
        sub: username.to_string(),
        jti: Uuid::new_v4().to_string(),
        purpose,
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret_for(config, purpose).as_bytes()),
    )?;

    Ok(IssuedToken { token, expires_at })
}

/// Validate a token against the expected purpose and extract its claims.
///
/// Fails on bad signature, expiry (no leeway), or purpose mismatch. A
/// mismatched purpose is rejected even when the signature happens to verify,
/// which matters when both secrets are configured to the same value.
pub fn verify_token(
    config: &AuthConfig,
    token: &str,
    expected_purpose: TokenPurpose,
) -> Result<TokenClaims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.leeway = 0;

    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret_for(config, expected_purpose).as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::ExpiredToken,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        _ => TokenError::InvalidToken,
    })?;

    if token_data.claims.purpose != expected_purpose {
        return Err(TokenError::WrongPurpose);
    }

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig {
            access_secret: "access-test-secret".to_string(),
            refresh_secret: "refresh-test-secret".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_issue_and_verify_access_token() {
        let config = config();

        let issued = issue_token(&config, "u1", TokenPurpose::Access).expect("issue failed");
        let claims = verify_token(&config, &issued.token, TokenPurpose::Access)
            .expect("verify failed");

        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.purpose, TokenPurpose::Access);
        assert_eq!(claims.iss, "almanac-api");
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let config = config();

        let issued = issue_token(&config, "u1", TokenPurpose::Refresh).unwrap();
        let result = verify_token(&config, &issued.token, TokenPurpose::Access);

        // Distinct secrets, so the signature check already fails
        assert!(result.is_err());
    }

    #[test]
    fn test_purpose_mismatch_detected_with_shared_secret() {
        let shared = AuthConfig {
            access_secret: "shared-secret".to_string(),
            refresh_secret: "shared-secret".to_string(),
            ..Default::default()
        };

        let issued = issue_token(&shared, "u1", TokenPurpose::Refresh).unwrap();
        let result = verify_token(&shared, &issued.token, TokenPurpose::Access);

        assert!(matches!(result, Err(TokenError::WrongPurpose)));
    }

    #[test]
    fn test_invalid_token() {
        let config = config();
        let result = verify_token(&config, "invalid.token.here", TokenPurpose::Access);
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let config1 = config();
        let config2 = AuthConfig {
            access_secret: "different-secret".to_string(),
            ..config()
        };

        let issued = issue_token(&config1, "u1", TokenPurpose::Access).unwrap();
        let result = verify_token(&config2, &issued.token, TokenPurpose::Access);

        assert!(matches!(result, Err(TokenError::InvalidSignature)));
    }

    #[test]
    fn test_expired_token() {
        let config = config();

        let issued = issue_token_with_validity(
            &config,
            "u1",
            TokenPurpose::Refresh,
            Duration::minutes(-5),
        )
        .unwrap();

        let result = verify_token(&config, &issued.token, TokenPurpose::Refresh);
        assert!(matches!(result, Err(TokenError::ExpiredToken)));
    }

    #[test]
    fn test_tokens_minted_back_to_back_are_distinct() {
        let config = config();

        let first = issue_token(&config, "u1", TokenPurpose::Refresh).unwrap();
        let second = issue_token(&config, "u1", TokenPurpose::Refresh).unwrap();

        assert_ne!(first.token, second.token);
    }

    #[test]
    fn test_access_validity_matches_config() {
        let config = config();
        let before = Utc::now();
        let issued = issue_token(&config, "u1", TokenPurpose::Access).unwrap();
        let after = Utc::now();

        assert!(issued.expires_at - before >= Duration::minutes(15));
        assert!(issued.expires_at - after <= Duration::minutes(15));
    }
}
