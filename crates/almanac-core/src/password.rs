//! Password hashing and verification
//!
//! Argon2id with a deterministic salt derived from the admin's username and
//! enrollment timestamp. The derived salt keeps the hash recomputable at
//! login time, which the credential-compatibility contract requires; it is
//! NOT the random-salt-per-write scheme normally recommended, and the
//! derivation must not change once admins exist.

use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Algorithm, Argon2, Params, Version,
};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Password hashing and verification errors
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    #[error("Invalid salt material")]
    InvalidSalt,
}

// Argon2id parameters: 19 MB memory, 2 iterations, 1 lane, 32-byte output.
// Fixed for the lifetime of the deployment: stored hashes are only
// recomputable while these stay put.
const MEMORY_COST: u32 = 19456;
const TIME_COST: u32 = 2;
const PARALLELISM: u32 = 1;
const OUTPUT_LEN: usize = 32;

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(MEMORY_COST, TIME_COST, PARALLELISM, Some(OUTPUT_LEN))
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Derive the per-admin salt from the username and enrollment second.
///
/// Truncating the enrollment time to whole seconds keeps the salt stable
/// across database round-trips regardless of sub-second precision.
fn derive_salt(username: &str, enrolled_at: DateTime<Utc>) -> Result<SaltString, PasswordError> {
    let digest = Sha256::digest(format!("{}:{}", username, enrolled_at.timestamp()).as_bytes());
    SaltString::encode_b64(&digest[..16]).map_err(|_| PasswordError::InvalidSalt)
}

/// Hash a plaintext password for the given admin identity.
///
/// The same (username, enrolled_at, password) triple always produces the same
/// PHC string, so verification is recompute-and-compare.
pub fn hash_admin_password(
    username: &str,
    enrolled_at: DateTime<Utc>,
    password: &str,
) -> Result<String, PasswordError> {
    let salt = derive_salt(username, enrolled_at)?;
    let hash = hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verify a plaintext password by recomputing the deterministic hash.
pub fn verify_admin_password(
    username: &str,
    enrolled_at: DateTime<Utc>,
    password: &str,
    stored_hash: &str,
) -> Result<bool, PasswordError> {
    let recomputed = hash_admin_password(username, enrolled_at, password)?;
    Ok(recomputed == stored_hash)
}

/// Validate password strength
///
/// Business rules re-checked by the password-change flow independently of any
/// outer request validation:
/// - At least 8 characters
/// - At least 1 uppercase letter
/// - At least 1 lowercase letter
/// - At least 1 digit
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if !password.chars().any(|c| c.is_uppercase()) {
        return Err("Password must contain at least one uppercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_lowercase()) {
        return Err("Password must contain at least one lowercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one digit".to_string());
    }

    Ok(())
}
