//! Almanac Core - Domain models, store contracts, and shared types
//!
//! This crate defines the core abstractions used throughout the Almanac system:
//! - Admin and session models for the authentication subsystem
//! - Event and participation models for the public calendar
//! - Common error types
//! - Store traits for credentials, sessions, and calendar data
//! - Configuration management
//! - Password hashing
//! - PostgreSQL and in-memory store backends

pub mod config;
pub mod memory;
pub mod password;
pub mod store;

pub use config::{AppConfig, AuthConfig, ConfigError, DatabaseConfig, ServerConfig};
pub use memory::MemoryStore;
pub use store::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Maximum length of an admin username.
pub const MAX_USERNAME_LEN: usize = 12;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for Almanac operations
///
/// Every credential or token failure collapses into the one payload-free
/// `Authentication` variant so callers cannot tell a wrong password from an
/// unknown username or a stale token.
#[derive(Error, Debug)]
pub enum AlmanacError {
    #[error("authentication information missing or invalid")]
    Authentication,

    #[error("{0} not found")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AlmanacError>;

// ============================================================================
// Authentication Models
// ============================================================================

/// Administrator account
///
/// Usernames are immutable and at most [`MAX_USERNAME_LEN`] characters. The
/// enrollment timestamp doubles as salt material for the password hash, so it
/// never changes after provisioning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    /// Unique login name
    pub username: String,

    /// Deterministic Argon2id hash, see [`password`]
    /// This field is never serialized in API responses
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Name shown in the admin UI
    pub display_name: String,

    /// Provisioning time; salt material for the password hash
    pub enrolled_at: DateTime<Utc>,
}

impl Admin {
    /// Provision a new admin from plaintext credentials.
    ///
    /// Validates the username, stamps the enrollment time, and derives the
    /// password hash from it.
    pub fn provision(username: &str, display_name: &str, plain_password: &str) -> Result<Self> {
        validate_username(username)?;
        password::validate_password_strength(plain_password)
            .map_err(AlmanacError::Validation)?;

        let enrolled_at = Utc::now();
        let password_hash = password::hash_admin_password(username, enrolled_at, plain_password)
            .map_err(|e| AlmanacError::Other(e.into()))?;

        Ok(Self {
            username: username.to_string(),
            password_hash,
            display_name: display_name.to_string(),
            enrolled_at,
        })
    }
}

/// Validate an admin username: non-empty, at most 12 chars, ASCII alphanumeric.
pub fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(AlmanacError::Validation("username must not be empty".to_string()));
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err(AlmanacError::Validation(format!(
            "username must be at most {MAX_USERNAME_LEN} characters"
        )));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AlmanacError::Validation(
            "username must be ASCII alphanumeric".to_string(),
        ));
    }
    Ok(())
}

/// Server-side session record
///
/// Binds one admin to exactly one live refresh token. The store enforces
/// uniqueness on `admin_name`; writing a session for an admin replaces any
/// prior one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Owning admin username (unique per store)
    pub admin_name: String,

    /// Refresh token value; primary lookup key
    pub token: String,

    /// When the refresh token stops being acceptable
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(admin_name: impl Into<String>, token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            admin_name: admin_name.into(),
            token: token.into(),
            expires_at,
        }
    }

    /// Check whether the stored expiry has passed.
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

// ============================================================================
// Calendar Models
// ============================================================================

/// A calendar event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier
    pub id: Uuid,

    /// Event title
    pub title: String,

    /// Longer description shown on the event page
    pub description: String,

    /// Venue, free-form
    pub location: Option<String>,

    /// Start of the event
    pub starts_at: DateTime<Utc>,

    /// End of the event
    pub ends_at: DateTime<Utc>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        location: Option<String>,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            location,
            starts_at,
            ends_at,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Review state of a participation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipationStatus {
    /// Submitted, awaiting admin review
    Pending,
    /// Accepted by an admin
    Confirmed,
    /// Turned down by an admin
    Declined,
}

impl ParticipationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ParticipationStatus::Pending => "pending",
            ParticipationStatus::Confirmed => "confirmed",
            ParticipationStatus::Declined => "declined",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(ParticipationStatus::Pending),
            "confirmed" => Some(ParticipationStatus::Confirmed),
            "declined" => Some(ParticipationStatus::Declined),
            _ => None,
        }
    }
}

impl std::fmt::Display for ParticipationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A public participation (RSVP) ticket for an event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participation {
    /// Unique identifier
    pub id: Uuid,

    /// Event this ticket belongs to
    pub event_id: Uuid,

    /// Visitor name
    pub name: String,

    /// How to reach the visitor (email or phone, free-form)
    pub contact: String,

    /// Optional note from the visitor
    pub note: Option<String>,

    /// Review state
    pub status: ParticipationStatus,

    /// Submission timestamp
    pub created_at: DateTime<Utc>,
}

impl Participation {
    /// Create a fresh submission in the pending state.
    pub fn new(
        event_id: Uuid,
        name: impl Into<String>,
        contact: impl Into<String>,
        note: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            name: name.into(),
            contact: contact.into(),
            note,
            status: ParticipationStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

// ============================================================================
// Store Traits
// ============================================================================

/// Persistence contract for admin identities
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up an admin by username
    async fn find_admin(&self, username: &str) -> Result<Option<Admin>>;

    /// Persist a newly provisioned admin
    async fn create_admin(&self, admin: &Admin) -> Result<()>;

    /// Remove an admin; the admin's session row goes with it.
    /// Returns false when no such admin existed.
    async fn delete_admin(&self, username: &str) -> Result<bool>;

    /// Replace an admin's password hash
    async fn update_password(&self, username: &str, password_hash: &str) -> Result<()>;

    /// List all admins, newest enrollment first
    async fn list_admins(&self) -> Result<Vec<Admin>>;
}

/// Persistence contract for refresh sessions
///
/// The uniqueness of `admin_name` is the store's job: `put` must be an atomic
/// conditional write so concurrent logins for one admin end with exactly one
/// row, even across server processes.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Write a session, replacing any existing session owned by the same
    /// admin in the same atomic operation.
    async fn put(&self, session: &Session) -> Result<()>;

    /// Look up a session by its exact token value
    async fn find_by_token(&self, token: &str) -> Result<Option<Session>>;

    /// Delete the session carrying this token value, if any
    async fn delete_by_token(&self, token: &str) -> Result<()>;

    /// Delete the session owned by this admin, if any
    async fn delete_for_admin(&self, username: &str) -> Result<()>;
}

/// Persistence contract for events and participation tickets
#[async_trait]
pub trait CalendarStore: Send + Sync {
    async fn create_event(&self, event: &Event) -> Result<()>;

    async fn update_event(&self, event: &Event) -> Result<()>;

    /// Returns false when no such event existed
    async fn delete_event(&self, id: Uuid) -> Result<bool>;

    async fn get_event(&self, id: Uuid) -> Result<Option<Event>>;

    /// Events starting within `[start, end)`, ordered by start time
    async fn list_events_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Event>>;

    async fn create_participation(&self, participation: &Participation) -> Result<()>;

    async fn get_participation(&self, id: Uuid) -> Result<Option<Participation>>;

    /// Tickets for one event, oldest first
    async fn list_participations(&self, event_id: Uuid) -> Result<Vec<Participation>>;

    /// Returns false when no such ticket existed
    async fn update_participation_status(
        &self,
        id: Uuid,
        status: ParticipationStatus,
    ) -> Result<bool>;

    /// Returns false when no such ticket existed
    async fn delete_participation(&self, id: Uuid) -> Result<bool>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("u1").is_ok());
        assert!(validate_username("twelvechars1").is_ok());

        assert!(validate_username("").is_err());
        assert!(validate_username("thirteenchars").is_err());
        assert!(validate_username("bad name").is_err());
        assert!(validate_username("bad/name").is_err());
    }

    #[test]
    fn test_participation_status_conversion() {
        assert_eq!(ParticipationStatus::Pending.as_str(), "pending");
        assert_eq!(ParticipationStatus::Confirmed.as_str(), "confirmed");
        assert_eq!(ParticipationStatus::Declined.as_str(), "declined");

        assert_eq!(
            ParticipationStatus::parse("CONFIRMED"),
            Some(ParticipationStatus::Confirmed)
        );
        assert_eq!(ParticipationStatus::parse("unknown"), None);
    }

    #[test]
    fn test_participation_starts_pending() {
        let participation = Participation::new(Uuid::new_v4(), "Visitor", "v@example.com", None);
        assert_eq!(participation.status, ParticipationStatus::Pending);
        assert!(participation.note.is_none());
    }

    #[test]
    fn test_session_expiry() {
        let live = Session::new("u1", "tok", Utc::now() + Duration::minutes(5));
        let stale = Session::new("u1", "tok", Utc::now() - Duration::minutes(5));

        assert!(!live.is_expired());
        assert!(stale.is_expired());
    }

    #[test]
    fn test_admin_provision_rejects_long_username() {
        let result = Admin::provision("waytoolongusername", "X", "CorrectHorse1!");
        assert!(matches!(result, Err(AlmanacError::Validation(_))));
    }

    #[test]
    fn test_admin_hash_is_not_serialized() {
        let admin = Admin {
            username: "u1".to_string(),
            password_hash: "secret-hash".to_string(),
            display_name: "User One".to_string(),
            enrolled_at: Utc::now(),
        };

        let json = serde_json::to_string(&admin).unwrap();
        assert!(!json.contains("secret-hash"));
    }
}
