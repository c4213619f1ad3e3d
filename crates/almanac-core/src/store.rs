//! PostgreSQL store backend
//!
//! Implements the credential, session, and calendar store contracts using
//! SQLx. The single-session-per-admin invariant lives here: the sessions
//! table carries a UNIQUE constraint on the owner and writes go through one
//! `INSERT .. ON CONFLICT DO UPDATE` statement, so the invariant holds under
//! concurrent logins across any number of server processes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    Admin, AlmanacError, CalendarStore, CredentialStore, Event, Participation,
    ParticipationStatus, Result, Session, SessionStore,
};

/// PostgreSQL-backed store
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect a new store
    pub async fn new(database_url: &str, pool_size: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(pool_size)
            .connect(database_url)
            .await
            .map_err(|e| AlmanacError::Database(format!("PostgreSQL connection failed: {e}")))?;

        Ok(Self { pool })
    }

    /// Create from an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Admin row from database
#[derive(Debug, FromRow)]
struct AdminRow {
    username: String,
    password_hash: String,
    display_name: String,
    enrolled_at: DateTime<Utc>,
}

impl From<AdminRow> for Admin {
    fn from(row: AdminRow) -> Self {
        Admin {
            username: row.username,
            password_hash: row.password_hash,
            display_name: row.display_name,
            enrolled_at: row.enrolled_at,
        }
    }
}

/// Session row from database
#[derive(Debug, FromRow)]
struct SessionRow {
    token: String,
    admin_name: String,
    expires_at: DateTime<Utc>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Session {
            admin_name: row.admin_name,
            token: row.token,
            expires_at: row.expires_at,
        }
    }
}

/// Event row from database
#[derive(Debug, FromRow)]
struct EventRow {
    id: Uuid,
    title: String,
    description: String,
    location: Option<String>,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event {
            id: row.id,
            title: row.title,
            description: row.description,
            location: row.location,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Participation row from database
#[derive(Debug, FromRow)]
struct ParticipationRow {
    id: Uuid,
    event_id: Uuid,
    name: String,
    contact: String,
    note: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl From<ParticipationRow> for Participation {
    fn from(row: ParticipationRow) -> Self {
        Participation {
            id: row.id,
            event_id: row.event_id,
            name: row.name,
            contact: row.contact,
            note: row.note,
            status: ParticipationStatus::parse(&row.status)
                .unwrap_or(ParticipationStatus::Pending),
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_admin(&self, username: &str) -> Result<Option<Admin>> {
        let row: Option<AdminRow> = sqlx::query_as(
            "SELECT username, password_hash, display_name, enrolled_at FROM admins WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AlmanacError::Database(format!("Failed to fetch admin: {e}")))?;

        Ok(row.map(Admin::from))
    }

    async fn create_admin(&self, admin: &Admin) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO admins (username, password_hash, display_name, enrolled_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&admin.username)
        .bind(&admin.password_hash)
        .bind(&admin.display_name)
        .bind(admin.enrolled_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AlmanacError::Database(format!("Failed to create admin: {e}")))?;

        Ok(())
    }

    async fn delete_admin(&self, username: &str) -> Result<bool> {
        // The sessions FK is ON DELETE CASCADE, so the admin's session row
        // disappears in the same statement.
        let result = sqlx::query("DELETE FROM admins WHERE username = $1")
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(|e| AlmanacError::Database(format!("Failed to delete admin: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_password(&self, username: &str, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE admins SET password_hash = $1 WHERE username = $2")
            .bind(password_hash)
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(|e| AlmanacError::Database(format!("Failed to update password: {e}")))?;

        Ok(())
    }

    async fn list_admins(&self) -> Result<Vec<Admin>> {
        let rows: Vec<AdminRow> = sqlx::query_as(
            "SELECT username, password_hash, display_name, enrolled_at FROM admins ORDER BY enrolled_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AlmanacError::Database(format!("Failed to list admins: {e}")))?;

        Ok(rows.into_iter().map(Admin::from).collect())
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn put(&self, session: &Session) -> Result<()> {
        // One conditional write; the admin_name uniqueness does the
        // delete-then-insert atomically.
        sqlx::query(
            r#"
            INSERT INTO sessions (token, admin_name, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (admin_name)
            DO UPDATE SET token = EXCLUDED.token, expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(&session.token)
        .bind(&session.admin_name)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AlmanacError::Database(format!("Failed to write session: {e}")))?;

        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Session>> {
        let row: Option<SessionRow> = sqlx::query_as(
            "SELECT token, admin_name, expires_at FROM sessions WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AlmanacError::Database(format!("Failed to fetch session: {e}")))?;

        Ok(row.map(Session::from))
    }

    async fn delete_by_token(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| AlmanacError::Database(format!("Failed to delete session: {e}")))?;

        Ok(())
    }

    async fn delete_for_admin(&self, username: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE admin_name = $1")
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(|e| AlmanacError::Database(format!("Failed to delete session: {e}")))?;

        Ok(())
    }
}

#[async_trait]
impl CalendarStore for PgStore {
    async fn create_event(&self, event: &Event) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO events (id, title, description, location, starts_at, ends_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.starts_at)
        .bind(event.ends_at)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AlmanacError::Database(format!("Failed to create event: {e}")))?;

        Ok(())
    }

    async fn update_event(&self, event: &Event) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE events SET
                title = $1,
                description = $2,
                location = $3,
                starts_at = $4,
                ends_at = $5,
                updated_at = $6
            WHERE id = $7
            "#,
        )
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.starts_at)
        .bind(event.ends_at)
        .bind(event.updated_at)
        .bind(event.id)
        .execute(&self.pool)
        .await
        .map_err(|e| AlmanacError::Database(format!("Failed to update event: {e}")))?;

        Ok(())
    }

    async fn delete_event(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AlmanacError::Database(format!("Failed to delete event: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_event(&self, id: Uuid) -> Result<Option<Event>> {
        let row: Option<EventRow> = sqlx::query_as(
            r#"
            SELECT id, title, description, location, starts_at, ends_at, created_at, updated_at
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AlmanacError::Database(format!("Failed to fetch event: {e}")))?;

        Ok(row.map(Event::from))
    }

    async fn list_events_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        let rows: Vec<EventRow> = sqlx::query_as(
            r#"
            SELECT id, title, description, location, starts_at, ends_at, created_at, updated_at
            FROM events
            WHERE starts_at >= $1 AND starts_at < $2
            ORDER BY starts_at ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AlmanacError::Database(format!("Failed to list events: {e}")))?;

        Ok(rows.into_iter().map(Event::from).collect())
    }

    async fn create_participation(&self, participation: &Participation) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO participations (id, event_id, name, contact, note, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(participation.id)
        .bind(participation.event_id)
        .bind(&participation.name)
        .bind(&participation.contact)
        .bind(&participation.note)
        .bind(participation.status.as_str())
        .bind(participation.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AlmanacError::Database(format!("Failed to create participation: {e}")))?;

        Ok(())
    }

    async fn get_participation(&self, id: Uuid) -> Result<Option<Participation>> {
        let row: Option<ParticipationRow> = sqlx::query_as(
            r#"
            SELECT id, event_id, name, contact, note, status, created_at
            FROM participations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AlmanacError::Database(format!("Failed to fetch participation: {e}")))?;

        Ok(row.map(Participation::from))
    }

    async fn list_participations(&self, event_id: Uuid) -> Result<Vec<Participation>> {
        let rows: Vec<ParticipationRow> = sqlx::query_as(
            r#"
            SELECT id, event_id, name, contact, note, status, created_at
            FROM participations
            WHERE event_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AlmanacError::Database(format!("Failed to list participations: {e}")))?;

        Ok(rows.into_iter().map(Participation::from).collect())
    }

    async fn update_participation_status(
        &self,
        id: Uuid,
        status: ParticipationStatus,
    ) -> Result<bool> {
        let result = sqlx::query("UPDATE participations SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AlmanacError::Database(format!("Failed to update participation: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_participation(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM participations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AlmanacError::Database(format!("Failed to delete participation: {e}")))?;

        Ok(result.rows_affected() > 0)
    }
}
