//! In-memory store backend
//!
//! Mutex-guarded maps implementing the same store contracts as [`PgStore`].
//! Used by the test suites and for running the server locally without a
//! database. Not suitable for multi-process deployments: the single-session
//! invariant is only as wide as this process.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::{
    Admin, AlmanacError, CalendarStore, CredentialStore, Event, Participation,
    ParticipationStatus, Result, Session, SessionStore,
};

/// In-memory store
#[derive(Default)]
pub struct MemoryStore {
    admins: Mutex<HashMap<String, Admin>>,
    /// Keyed by token value; owner uniqueness enforced on write
    sessions: Mutex<HashMap<String, Session>>,
    events: Mutex<HashMap<Uuid, Event>>,
    participations: Mutex<HashMap<Uuid, Participation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live sessions; test hook for the one-per-admin invariant
    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_admin(&self, username: &str) -> Result<Option<Admin>> {
        Ok(self.admins.lock().unwrap().get(username).cloned())
    }

    async fn create_admin(&self, admin: &Admin) -> Result<()> {
        let mut admins = self.admins.lock().unwrap();
        if admins.contains_key(&admin.username) {
            return Err(AlmanacError::Database(format!(
                "duplicate key: admin {} already exists",
                admin.username
            )));
        }
        admins.insert(admin.username.clone(), admin.clone());
        Ok(())
    }

    async fn delete_admin(&self, username: &str) -> Result<bool> {
        let removed = self.admins.lock().unwrap().remove(username).is_some();
        if removed {
            // Cascade, mirroring the FK in the PostgreSQL schema
            self.sessions
                .lock()
                .unwrap()
                .retain(|_, s| s.admin_name != username);
        }
        Ok(removed)
    }

    async fn update_password(&self, username: &str, password_hash: &str) -> Result<()> {
        let mut admins = self.admins.lock().unwrap();
        match admins.get_mut(username) {
            Some(admin) => {
                admin.password_hash = password_hash.to_string();
                Ok(())
            }
            None => Err(AlmanacError::NotFound(format!("admin {username}"))),
        }
    }

    async fn list_admins(&self) -> Result<Vec<Admin>> {
        let mut admins: Vec<Admin> = self.admins.lock().unwrap().values().cloned().collect();
        admins.sort_by(|a, b| b.enrolled_at.cmp(&a.enrolled_at));
        Ok(admins)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn put(&self, session: &Session) -> Result<()> {
        let mut sessions = self.sessions.lock().unwrap();
        // Same single lock for evict-and-insert, so two concurrent logins
        // for one admin still end with exactly one row.
        sessions.retain(|_, s| s.admin_name != session.admin_name);
        sessions.insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Session>> {
        Ok(self.sessions.lock().unwrap().get(token).cloned())
    }

    async fn delete_by_token(&self, token: &str) -> Result<()> {
        self.sessions.lock().unwrap().remove(token);
        Ok(())
    }

    async fn delete_for_admin(&self, username: &str) -> Result<()> {
        self.sessions
            .lock()
            .unwrap()
            .retain(|_, s| s.admin_name != username);
        Ok(())
    }
}

#[async_trait]
impl CalendarStore for MemoryStore {
    async fn create_event(&self, event: &Event) -> Result<()> {
        self.events.lock().unwrap().insert(event.id, event.clone());
        Ok(())
    }

    async fn update_event(&self, event: &Event) -> Result<()> {
        self.events.lock().unwrap().insert(event.id, event.clone());
        Ok(())
    }

    async fn delete_event(&self, id: Uuid) -> Result<bool> {
        let removed = self.events.lock().unwrap().remove(&id).is_some();
        if removed {
            self.participations
                .lock()
                .unwrap()
                .retain(|_, p| p.event_id != id);
        }
        Ok(removed)
    }

    async fn get_event(&self, id: Uuid) -> Result<Option<Event>> {
        Ok(self.events.lock().unwrap().get(&id).cloned())
    }

    async fn list_events_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        let mut events: Vec<Event> = self
            .events
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.starts_at >= start && e.starts_at < end)
            .cloned()
            .collect();
        events.sort_by(|a, b| a.starts_at.cmp(&b.starts_at));
        Ok(events)
    }

    async fn create_participation(&self, participation: &Participation) -> Result<()> {
        self.participations
            .lock()
            .unwrap()
            .insert(participation.id, participation.clone());
        Ok(())
    }

    async fn get_participation(&self, id: Uuid) -> Result<Option<Participation>> {
        Ok(self.participations.lock().unwrap().get(&id).cloned())
    }

    async fn list_participations(&self, event_id: Uuid) -> Result<Vec<Participation>> {
        let mut participations: Vec<Participation> = self
            .participations
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.event_id == event_id)
            .cloned()
            .collect();
        participations.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(participations)
    }

    async fn update_participation_status(
        &self,
        id: Uuid,
        status: ParticipationStatus,
    ) -> Result<bool> {
        let mut participations = self.participations.lock().unwrap();
        match participations.get_mut(&id) {
            Some(p) => {
                p.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_participation(&self, id: Uuid) -> Result<bool> {
        Ok(self.participations.lock().unwrap().remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn admin(username: &str) -> Admin {
        Admin {
            username: username.to_string(),
            password_hash: "hash".to_string(),
            display_name: username.to_string(),
            enrolled_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_put_replaces_prior_session_for_same_admin() {
        let store = MemoryStore::new();
        let expires = Utc::now() + Duration::minutes(120);

        store.put(&Session::new("u1", "first", expires)).await.unwrap();
        store.put(&Session::new("u1", "second", expires)).await.unwrap();

        assert_eq!(store.session_count(), 1);
        assert!(store.find_by_token("first").await.unwrap().is_none());
        assert!(store.find_by_token("second").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sessions_for_different_admins_coexist() {
        let store = MemoryStore::new();
        let expires = Utc::now() + Duration::minutes(120);

        store.put(&Session::new("u1", "t1", expires)).await.unwrap();
        store.put(&Session::new("u2", "t2", expires)).await.unwrap();

        assert_eq!(store.session_count(), 2);
    }

    #[tokio::test]
    async fn test_delete_admin_cascades_session() {
        let store = MemoryStore::new();
        store.create_admin(&admin("u1")).await.unwrap();
        store
            .put(&Session::new("u1", "tok", Utc::now() + Duration::minutes(120)))
            .await
            .unwrap();

        assert!(store.delete_admin("u1").await.unwrap());
        assert!(store.find_by_token("tok").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_admin_rejected() {
        let store = MemoryStore::new();
        store.create_admin(&admin("u1")).await.unwrap();

        let result = store.create_admin(&admin("u1")).await;
        assert!(matches!(result, Err(AlmanacError::Database(_))));
    }

    #[tokio::test]
    async fn test_list_events_between_filters_and_orders() {
        let store = MemoryStore::new();
        let base = Utc::now();

        let inside_late = Event::new("late", "", None, base + Duration::days(3), base + Duration::days(3));
        let inside_early = Event::new("early", "", None, base + Duration::days(1), base + Duration::days(1));
        let outside = Event::new("outside", "", None, base + Duration::days(40), base + Duration::days(40));

        store.create_event(&inside_late).await.unwrap();
        store.create_event(&inside_early).await.unwrap();
        store.create_event(&outside).await.unwrap();

        let listed = store
            .list_events_between(base, base + Duration::days(30))
            .await
            .unwrap();

        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].title, "early");
        assert_eq!(listed[1].title, "late");
    }

    #[tokio::test]
    async fn test_delete_event_cascades_participations() {
        let store = MemoryStore::new();
        let event = Event::new("e", "", None, Utc::now(), Utc::now());
        store.create_event(&event).await.unwrap();

        let ticket = Participation::new(event.id, "Visitor", "v@example.com", None);
        store.create_participation(&ticket).await.unwrap();

        assert!(store.delete_event(event.id).await.unwrap());
        assert!(store.get_participation(ticket.id).await.unwrap().is_none());
    }
}
