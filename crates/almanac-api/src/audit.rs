//! Security audit logging for authentication events
//!
//! Structured audit records for logins, rotations, logouts, password changes,
//! and invalid tokens, emitted at INFO level with the "audit" target so they
//! can be filtered and routed to monitoring separately from application logs.
//!
//! Events carry usernames and outcomes only. Passwords and token values never
//! appear here or anywhere else in a log line.

use serde::{Deserialize, Serialize};
use tracing::info;

/// Security audit events for the session subsystem
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// Login attempt, successful or not
    LoginAttempt { username: String, success: bool },

    /// A refresh token entered its trailing window and was replaced
    SessionRotated { username: String },

    /// Session closed by the admin
    Logout { username: String },

    /// Access token minted from a refresh token
    TokenRenewed { username: String },

    /// Password change attempt
    PasswordChanged { username: String, success: bool },

    /// A presented token failed verification
    InvalidToken { reason: String },
}

/// Emit an audit event.
pub fn audit_log(event: &AuditEvent) {
    match serde_json::to_string(event) {
        Ok(json) => info!(target: "audit", event = %json, "audit event"),
        Err(e) => tracing::warn!("failed to serialize audit event: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = AuditEvent::LoginAttempt {
            username: "u1".to_string(),
            success: false,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event_type\":\"login_attempt\""));
        assert!(json.contains("\"username\":\"u1\""));
        assert!(json.contains("\"success\":false"));
    }

    #[test]
    fn test_rotation_event_names_only_the_admin() {
        let event = AuditEvent::SessionRotated {
            username: "u1".to_string(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            "{\"event_type\":\"session_rotated\",\"username\":\"u1\"}"
        );
    }
}
