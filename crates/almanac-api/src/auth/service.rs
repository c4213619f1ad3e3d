//! Session service
//!
//! Business logic for admin login, logout, token renewal, and password
//! change. Combines the token codec with the credential and session stores to
//! enforce the authentication protocol: one live session per admin, refresh
//! tokens cross-checked against the store, and rotation when a refresh token
//! enters its trailing expiry window.

use super::token::{issue_token, verify_token, IssuedToken, TokenPurpose};
use crate::audit::{audit_log, AuditEvent};
use almanac_core::{
    password, AlmanacError, AuthConfig, CredentialStore, Result, Session, SessionStore,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Refresh-token-bearing request used by renew and logout
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Password change request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub refresh_token: String,
    pub current_password: String,
    pub new_password: String,
}

/// Login response with both tokens and their expiry metadata
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    /// Access token lifetime in seconds
    pub expires_in: u64,
    pub refresh_token: String,
    /// Refresh token lifetime in seconds
    pub refresh_expires_in: u64,
    pub token_type: String,
}

/// Renewal response; the refresh fields are present only when rotation occurred
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RenewResponse {
    pub access_token: String,
    pub expires_in: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_expires_in: Option<u64>,
}

/// Password change response; carries the rotated refresh token when one was
/// produced during verification
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChangePasswordResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_expires_in: Option<u64>,
}

/// Outcome of verifying a presented refresh token
#[derive(Debug)]
pub struct VerifiedSession {
    pub username: String,
    /// The replacement refresh token when rotation occurred
    pub rotated: Option<IssuedToken>,
}

impl VerifiedSession {
    /// The refresh token value in effect after verification.
    pub fn current_token<'a>(&'a self, presented: &'a str) -> &'a str {
        match &self.rotated {
            Some(issued) => &issued.token,
            None => presented,
        }
    }
}

/// Session service
#[derive(Clone)]
pub struct SessionService {
    credentials: Arc<dyn CredentialStore>,
    sessions: Arc<dyn SessionStore>,
    auth: AuthConfig,
}

impl SessionService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        auth: AuthConfig,
    ) -> Self {
        Self {
            credentials,
            sessions,
            auth,
        }
    }

    fn access_expires_in(&self) -> u64 {
        (self.auth.access_validity_mins * 60).max(0) as u64
    }

    fn refresh_expires_in(&self) -> u64 {
        (self.auth.refresh_validity_mins * 60).max(0) as u64
    }

    /// Authenticate an admin and open a session.
    ///
    /// An unknown username and a wrong password fail identically so callers
    /// cannot enumerate accounts. A successful login replaces any prior
    /// session for the admin in one atomic store write.
    pub async fn login(&self, username: &str, plain_password: &str) -> Result<LoginResponse> {
        let admin = match self.credentials.find_admin(username).await? {
            Some(admin) => admin,
            None => {
                audit_log(&AuditEvent::LoginAttempt {
                    username: username.to_string(),
                    success: false,
                });
                return Err(AlmanacError::Authentication);
            }
        };

        let matches = password::verify_admin_password(
            &admin.username,
            admin.enrolled_at,
            plain_password,
            &admin.password_hash,
        )
        .map_err(|e| AlmanacError::Other(e.into()))?;

        if !matches {
            audit_log(&AuditEvent::LoginAttempt {
                username: username.to_string(),
                success: false,
            });
            return Err(AlmanacError::Authentication);
        }

        let access = issue_token(&self.auth, &admin.username, TokenPurpose::Access)
            .map_err(|e| AlmanacError::Other(e.into()))?;
        let refresh = issue_token(&self.auth, &admin.username, TokenPurpose::Refresh)
            .map_err(|e| AlmanacError::Other(e.into()))?;

        self.sessions
            .put(&Session::new(
                &admin.username,
                &refresh.token,
                refresh.expires_at,
            ))
            .await?;

        audit_log(&AuditEvent::LoginAttempt {
            username: admin.username.clone(),
            success: true,
        });

        Ok(LoginResponse {
            access_token: access.token,
            expires_in: self.access_expires_in(),
            refresh_token: refresh.token,
            refresh_expires_in: self.refresh_expires_in(),
            token_type: "Bearer".to_string(),
        })
    }

    /// Verify a presented refresh token against the codec and the session
    /// store, rotating it when its remaining validity has dropped under the
    /// configured window.
    ///
    /// Rotation is written through the store before this returns, so a later
    /// failure in the calling operation never resurrects the old token.
    pub async fn verify_refresh_session(&self, presented: &str) -> Result<VerifiedSession> {
        if presented.is_empty() {
            return Err(AlmanacError::Authentication);
        }

        if let Err(e) = verify_token(&self.auth, presented, TokenPurpose::Refresh) {
            audit_log(&AuditEvent::InvalidToken {
                reason: e.to_string(),
            });
            return Err(AlmanacError::Authentication);
        }

        let session = self
            .sessions
            .find_by_token(presented)
            .await?
            .ok_or(AlmanacError::Authentication)?;

        if session.is_expired() {
            return Err(AlmanacError::Authentication);
        }

        let remaining = session.expires_at - Utc::now();
        if remaining >= Duration::minutes(self.auth.rotation_window_mins) {
            return Ok(VerifiedSession {
                username: session.admin_name,
                rotated: None,
            });
        }

        // Inside the trailing window: replace the session with a fresh
        // refresh token. The owner-keyed upsert deletes the old row and
        // inserts the new one as a single failure-atomic write.
        let next = issue_token(&self.auth, &session.admin_name, TokenPurpose::Refresh)
            .map_err(|e| AlmanacError::Other(e.into()))?;
        self.sessions
            .put(&Session::new(
                &session.admin_name,
                &next.token,
                next.expires_at,
            ))
            .await?;

        audit_log(&AuditEvent::SessionRotated {
            username: session.admin_name.clone(),
        });

        Ok(VerifiedSession {
            username: session.admin_name,
            rotated: Some(next),
        })
    }

    /// Close the session bound to the presented refresh token.
    ///
    /// Deletes the row for the token in effect at call time: when
    /// verification just rotated, the freshly issued token is the one removed
    /// so it is not left dangling.
    pub async fn logout(&self, presented: &str) -> Result<()> {
        let verified = self.verify_refresh_session(presented).await?;

        self.sessions
            .delete_by_token(verified.current_token(presented))
            .await?;

        audit_log(&AuditEvent::Logout {
            username: verified.username,
        });

        Ok(())
    }

    /// Exchange a refresh token for a fresh access token.
    ///
    /// The response carries a new refresh token only when rotation occurred.
    pub async fn renew(&self, presented: &str) -> Result<RenewResponse> {
        let verified = self.verify_refresh_session(presented).await?;

        let access = issue_token(&self.auth, &verified.username, TokenPurpose::Access)
            .map_err(|e| AlmanacError::Other(e.into()))?;

        audit_log(&AuditEvent::TokenRenewed {
            username: verified.username.clone(),
        });

        Ok(RenewResponse {
            access_token: access.token,
            expires_in: self.access_expires_in(),
            refresh_token: verified.rotated.as_ref().map(|t| t.token.clone()),
            refresh_expires_in: verified.rotated.as_ref().map(|_| self.refresh_expires_in()),
        })
    }

    /// Change an admin's password.
    ///
    /// The refresh session is verified first; a rotation produced there is
    /// already committed, deliberately in a separate transaction from the
    /// password write, so it survives any validation failure below (by then
    /// the old refresh token is no longer valid). The current-password check
    /// and the strength check both surface the same generic rejection.
    pub async fn change_password(
        &self,
        presented: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<ChangePasswordResponse> {
        let verified = self.verify_refresh_session(presented).await?;

        let admin = self
            .credentials
            .find_admin(&verified.username)
            .await?
            .ok_or(AlmanacError::Authentication)?;

        let rejection = || AlmanacError::Validation("password change rejected".to_string());

        if password::validate_password_strength(new_password).is_err() {
            audit_log(&AuditEvent::PasswordChanged {
                username: admin.username.clone(),
                success: false,
            });
            return Err(rejection());
        }

        let matches = password::verify_admin_password(
            &admin.username,
            admin.enrolled_at,
            current_password,
            &admin.password_hash,
        )
        .map_err(|e| AlmanacError::Other(e.into()))?;

        if !matches {
            audit_log(&AuditEvent::PasswordChanged {
                username: admin.username.clone(),
                success: false,
            });
            return Err(rejection());
        }

        let new_hash =
            password::hash_admin_password(&admin.username, admin.enrolled_at, new_password)
                .map_err(|e| AlmanacError::Other(e.into()))?;
        self.credentials
            .update_password(&admin.username, &new_hash)
            .await?;

        audit_log(&AuditEvent::PasswordChanged {
            username: admin.username.clone(),
            success: true,
        });

        Ok(ChangePasswordResponse {
            refresh_token: verified.rotated.as_ref().map(|t| t.token.clone()),
            refresh_expires_in: verified.rotated.as_ref().map(|_| self.refresh_expires_in()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::issue_token_with_validity;
    use almanac_core::{Admin, MemoryStore};

    fn auth_config() -> AuthConfig {
        AuthConfig {
            access_secret: "access-test-secret".to_string(),
            refresh_secret: "refresh-test-secret".to_string(),
            ..Default::default()
        }
    }

    async fn service_with_admin() -> (SessionService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let admin = Admin::provision("u1", "User One", "Password1").unwrap();
        store.create_admin(&admin).await.unwrap();

        let service = SessionService::new(store.clone(), store.clone(), auth_config());
        (service, store)
    }

    /// Plant a session whose refresh token has the given remaining validity.
    async fn plant_session(
        service: &SessionService,
        store: &MemoryStore,
        username: &str,
        remaining: Duration,
    ) -> String {
        let issued = issue_token_with_validity(
            &service.auth,
            username,
            TokenPurpose::Refresh,
            remaining,
        )
        .unwrap();
        store
            .put(&Session::new(username, &issued.token, issued.expires_at))
            .await
            .unwrap();
        issued.token
    }

    #[tokio::test]
    async fn test_login_issues_purpose_correct_tokens() {
        let (service, _store) = service_with_admin().await;

        let response = service.login("u1", "Password1").await.unwrap();

        let access =
            verify_token(&service.auth, &response.access_token, TokenPurpose::Access).unwrap();
        assert_eq!(access.sub, "u1");
        assert_eq!(access.purpose, TokenPurpose::Access);

        let refresh =
            verify_token(&service.auth, &response.refresh_token, TokenPurpose::Refresh).unwrap();
        assert_eq!(refresh.sub, "u1");
        assert_eq!(refresh.purpose, TokenPurpose::Refresh);

        assert_eq!(response.expires_in, 15 * 60);
        assert_eq!(response.refresh_expires_in, 120 * 60);
    }

    #[tokio::test]
    async fn test_unknown_user_and_wrong_password_fail_identically() {
        let (service, _store) = service_with_admin().await;

        let unknown = service.login("nobody", "Password1").await.unwrap_err();
        let wrong = service.login("u1", "WrongPass1").await.unwrap_err();

        assert!(matches!(unknown, AlmanacError::Authentication));
        assert!(matches!(wrong, AlmanacError::Authentication));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn test_second_login_replaces_first_session() {
        let (service, store) = service_with_admin().await;

        let first = service.login("u1", "Password1").await.unwrap();
        let second = service.login("u1", "Password1").await.unwrap();

        assert_eq!(store.session_count(), 1);

        // The loser's refresh token points at a row that no longer exists
        let stale = service
            .verify_refresh_session(&first.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(stale, AlmanacError::Authentication));

        assert!(service
            .verify_refresh_session(&second.refresh_token)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_no_rotation_outside_trailing_window() {
        let (service, store) = service_with_admin().await;

        let login = service.login("u1", "Password1").await.unwrap();
        let renewed = service.renew(&login.refresh_token).await.unwrap();

        assert!(renewed.refresh_token.is_none());
        assert_eq!(store.session_count(), 1);

        // The original refresh token stays valid
        assert!(service
            .verify_refresh_session(&login.refresh_token)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_rotation_inside_trailing_window() {
        let (service, store) = service_with_admin().await;

        // 19 minutes left, under the 20-minute window
        let old_token = plant_session(&service, &store, "u1", Duration::minutes(19)).await;

        let renewed = service.renew(&old_token).await.unwrap();
        let new_token = renewed.refresh_token.expect("rotation expected");

        assert_eq!(store.session_count(), 1);
        assert_ne!(new_token, old_token);

        // The old value is rejected by any subsequent call
        let stale = service.verify_refresh_session(&old_token).await.unwrap_err();
        assert!(matches!(stale, AlmanacError::Authentication));

        assert!(service.verify_refresh_session(&new_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_logout_deletes_session() {
        let (service, store) = service_with_admin().await;

        let login = service.login("u1", "Password1").await.unwrap();
        service.logout(&login.refresh_token).await.unwrap();

        assert_eq!(store.session_count(), 0);

        let replay = service.renew(&login.refresh_token).await.unwrap_err();
        assert!(matches!(replay, AlmanacError::Authentication));
    }

    #[tokio::test]
    async fn test_logout_after_rotation_deletes_rotated_row() {
        let (service, store) = service_with_admin().await;

        let old_token = plant_session(&service, &store, "u1", Duration::minutes(10)).await;

        // Rotation happens during logout verification; the rotated row is the
        // one that must be deleted so no token is left dangling.
        service.logout(&old_token).await.unwrap();
        assert_eq!(store.session_count(), 0);

        // A second logout with the pre-rotation token fails
        let replay = service.logout(&old_token).await.unwrap_err();
        assert!(matches!(replay, AlmanacError::Authentication));
    }

    #[tokio::test]
    async fn test_admin_deletion_cascades_to_session() {
        let (service, store) = service_with_admin().await;

        let login = service.login("u1", "Password1").await.unwrap();
        assert!(store.delete_admin("u1").await.unwrap());

        let orphaned = service.renew(&login.refresh_token).await.unwrap_err();
        assert!(matches!(orphaned, AlmanacError::Authentication));
    }

    #[tokio::test]
    async fn test_expired_session_row_is_rejected() {
        let (service, store) = service_with_admin().await;

        // Token itself still verifies, but the stored expiry has passed
        let issued = issue_token_with_validity(
            &service.auth,
            "u1",
            TokenPurpose::Refresh,
            Duration::minutes(30),
        )
        .unwrap();
        store
            .put(&Session::new(
                "u1",
                &issued.token,
                Utc::now() - Duration::minutes(1),
            ))
            .await
            .unwrap();

        let result = service.verify_refresh_session(&issued.token).await;
        assert!(matches!(result, Err(AlmanacError::Authentication)));
    }

    #[tokio::test]
    async fn test_empty_and_garbage_tokens_rejected() {
        let (service, _store) = service_with_admin().await;

        assert!(matches!(
            service.verify_refresh_session("").await,
            Err(AlmanacError::Authentication)
        ));
        assert!(matches!(
            service.verify_refresh_session("not.a.token").await,
            Err(AlmanacError::Authentication)
        ));
    }

    #[tokio::test]
    async fn test_access_token_not_accepted_as_refresh() {
        let (service, _store) = service_with_admin().await;

        let login = service.login("u1", "Password1").await.unwrap();
        let result = service.verify_refresh_session(&login.access_token).await;

        assert!(matches!(result, Err(AlmanacError::Authentication)));
    }

    #[tokio::test]
    async fn test_change_password_success() {
        let (service, _store) = service_with_admin().await;

        let login = service.login("u1", "Password1").await.unwrap();
        let response = service
            .change_password(&login.refresh_token, "Password1", "NewPassword2")
            .await
            .unwrap();

        // Fresh token, so no rotation happened
        assert!(response.refresh_token.is_none());

        assert!(service.login("u1", "NewPassword2").await.is_ok());
        assert!(matches!(
            service.login("u1", "Password1").await,
            Err(AlmanacError::Authentication)
        ));
    }

    #[tokio::test]
    async fn test_change_password_wrong_current_rejected_generically() {
        let (service, _store) = service_with_admin().await;

        let login = service.login("u1", "Password1").await.unwrap();
        let wrong_current = service
            .change_password(&login.refresh_token, "WrongPass1", "NewPassword2")
            .await
            .unwrap_err();
        let weak_new = service
            .change_password(&login.refresh_token, "Password1", "short")
            .await
            .unwrap_err();

        // Both rejections carry the same generic message
        assert!(matches!(wrong_current, AlmanacError::Validation(_)));
        assert_eq!(wrong_current.to_string(), weak_new.to_string());

        // Password unchanged
        assert!(service.login("u1", "Password1").await.is_ok());
    }

    #[tokio::test]
    async fn test_failed_change_password_still_persists_rotation() {
        let (service, store) = service_with_admin().await;

        let old_token = plant_session(&service, &store, "u1", Duration::minutes(5)).await;

        let result = service
            .change_password(&old_token, "WrongPass1", "NewPassword2")
            .await;
        assert!(matches!(result, Err(AlmanacError::Validation(_))));

        // The rotation that happened during verification stuck: the old
        // token is dead and exactly one (rotated) session remains.
        assert_eq!(store.session_count(), 1);
        let stale = service.verify_refresh_session(&old_token).await.unwrap_err();
        assert!(matches!(stale, AlmanacError::Authentication));

        // And the password itself was not changed
        assert!(service.login("u1", "Password1").await.is_ok());
    }

    #[tokio::test]
    async fn test_change_password_returns_rotated_token() {
        let (service, store) = service_with_admin().await;

        let old_token = plant_session(&service, &store, "u1", Duration::minutes(5)).await;

        let response = service
            .change_password(&old_token, "Password1", "NewPassword2")
            .await
            .unwrap();

        let rotated = response.refresh_token.expect("rotation expected");
        assert!(service.verify_refresh_session(&rotated).await.is_ok());
    }

    #[tokio::test]
    async fn test_near_expiry_renewal_scenario() {
        // login -> wait until under 20 minutes remain -> renew rotates ->
        // old token dead, new token live. The wait is simulated by planting
        // the session with 19 minutes left.
        let (service, store) = service_with_admin().await;

        let login = service.login("u1", "Password1").await.unwrap();
        assert!(service.renew(&login.refresh_token).await.unwrap().refresh_token.is_none());

        let near_expiry = plant_session(&service, &store, "u1", Duration::minutes(19)).await;
        let renewed = service.renew(&near_expiry).await.unwrap();
        let rotated = renewed.refresh_token.expect("rotation expected");

        assert!(matches!(
            service.verify_refresh_session(&near_expiry).await,
            Err(AlmanacError::Authentication)
        ));
        assert!(service.verify_refresh_session(&rotated).await.is_ok());
    }
}
