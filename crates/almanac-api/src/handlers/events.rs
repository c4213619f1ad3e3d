//! Event management handlers
//!
//! Visitors browse events by month and read single events without
//! authenticating; creating, editing, and deleting events requires a valid
//! access token.

use crate::auth::AuthenticatedAdmin;
use crate::error::AppError;
use crate::state::AppState;
use almanac_core::Event;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Event information
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventResponse {
    /// Event UUID
    pub id: Uuid,

    /// Event title
    #[schema(example = "Summer concert")]
    pub title: String,

    /// Longer description
    pub description: String,

    /// Venue, free-form
    pub location: Option<String>,

    /// Start of the event
    pub starts_at: DateTime<Utc>,

    /// End of the event
    pub ends_at: DateTime<Utc>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            title: event.title,
            description: event.description,
            location: event.location,
            starts_at: event.starts_at,
            ends_at: event.ends_at,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}

/// Event list response
#[derive(Debug, Serialize, ToSchema)]
pub struct EventListResponse {
    /// Events in the requested month
    pub events: Vec<EventResponse>,

    /// Total count
    pub total: usize,

    /// Requested year
    pub year: i32,

    /// Requested month (1-12)
    pub month: u32,
}

/// Query parameters for month browsing
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListEventsQuery {
    /// Calendar year
    pub year: i32,

    /// Month, 1-12
    pub month: u32,
}

/// Compute the UTC window `[first of month, first of next month)`.
fn month_window(year: i32, month: u32) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
    if !(1..=12).contains(&month) {
        return Err(AppError::BadRequest("month must be between 1 and 12".to_string()));
    }
    if !(1970..=9999).contains(&year) {
        return Err(AppError::BadRequest("year must be between 1970 and 9999".to_string()));
    }

    let start = Utc
        .with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| AppError::BadRequest("invalid month".to_string()))?;

    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let end = Utc
        .with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| AppError::BadRequest("invalid month".to_string()))?;

    Ok((start, end))
}

/// List events for one month
#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "events",
    params(ListEventsQuery),
    responses(
        (status = 200, description = "Events in the month", body = EventListResponse),
        (status = 400, description = "Invalid year or month", body = crate::error::ApiError)
    )
)]
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListEventsQuery>,
) -> Result<impl IntoResponse, AppError> {
    state.increment_requests();

    let (start, end) = month_window(params.year, params.month)?;
    let events = state.calendar.list_events_between(start, end).await?;

    let events: Vec<EventResponse> = events.into_iter().map(EventResponse::from).collect();
    let response = EventListResponse {
        total: events.len(),
        events,
        year: params.year,
        month: params.month,
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Get a single event by ID
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}",
    tag = "events",
    params(
        ("id" = Uuid, Path, description = "Event UUID")
    ),
    responses(
        (status = 200, description = "Event details", body = EventResponse),
        (status = 404, description = "Event not found", body = crate::error::ApiError)
    )
)]
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.increment_requests();

    let event = state
        .calendar
        .get_event(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event".to_string()))?;

    Ok((StatusCode::OK, Json(EventResponse::from(event))))
}

/// Create event request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEventRequest {
    /// Event title
    #[schema(example = "Summer concert")]
    pub title: String,

    /// Longer description
    pub description: String,

    /// Venue, free-form
    pub location: Option<String>,

    /// Start of the event
    pub starts_at: DateTime<Utc>,

    /// End of the event
    pub ends_at: DateTime<Utc>,
}

/// Create a new event
#[utoipa::path(
    post,
    path = "/api/v1/events",
    tag = "events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, description = "Invalid request", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    admin: AuthenticatedAdmin,
    Json(request): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.increment_requests();

    if request.title.trim().is_empty() {
        return Err(AppError::BadRequest("Title cannot be empty".to_string()));
    }
    if request.ends_at < request.starts_at {
        return Err(AppError::BadRequest(
            "Event cannot end before it starts".to_string(),
        ));
    }

    let event = Event::new(
        request.title.trim(),
        request.description,
        request.location,
        request.starts_at,
        request.ends_at,
    );
    state.calendar.create_event(&event).await?;

    tracing::info!(admin = %admin.username, event = %event.id, "event created");

    Ok((StatusCode::CREATED, Json(EventResponse::from(event))))
}

/// Update event request; absent fields keep their current value
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

/// Update an existing event
#[utoipa::path(
    put,
    path = "/api/v1/events/{id}",
    tag = "events",
    params(
        ("id" = Uuid, Path, description = "Event UUID")
    ),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Event updated", body = EventResponse),
        (status = 400, description = "Invalid request", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 404, description = "Event not found", body = crate::error::ApiError)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_event(
    State(state): State<Arc<AppState>>,
    admin: AuthenticatedAdmin,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.increment_requests();

    let mut event = state
        .calendar
        .get_event(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event".to_string()))?;

    if let Some(title) = request.title {
        if title.trim().is_empty() {
            return Err(AppError::BadRequest("Title cannot be empty".to_string()));
        }
        event.title = title.trim().to_string();
    }
    if let Some(description) = request.description {
        event.description = description;
    }
    if let Some(location) = request.location {
        event.location = Some(location);
    }
    if let Some(starts_at) = request.starts_at {
        event.starts_at = starts_at;
    }
    if let Some(ends_at) = request.ends_at {
        event.ends_at = ends_at;
    }
    if event.ends_at < event.starts_at {
        return Err(AppError::BadRequest(
            "Event cannot end before it starts".to_string(),
        ));
    }

    event.updated_at = Utc::now();
    state.calendar.update_event(&event).await?;

    tracing::info!(admin = %admin.username, event = %event.id, "event updated");

    Ok((StatusCode::OK, Json(EventResponse::from(event))))
}

/// Delete event response
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteEventResponse {
    pub message: String,
}

/// Delete an event
#[utoipa::path(
    delete,
    path = "/api/v1/events/{id}",
    tag = "events",
    params(
        ("id" = Uuid, Path, description = "Event UUID")
    ),
    responses(
        (status = 200, description = "Event deleted", body = DeleteEventResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 404, description = "Event not found", body = crate::error::ApiError)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    admin: AuthenticatedAdmin,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.increment_requests();

    if !state.calendar.delete_event(id).await? {
        return Err(AppError::NotFound("Event".to_string()));
    }

    tracing::info!(admin = %admin.username, event = %id, "event deleted");

    Ok((
        StatusCode::OK,
        Json(DeleteEventResponse {
            message: format!("Event {id} deleted"),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_window_mid_year() {
        let (start, end) = month_window(2024, 6).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_month_window_december_rolls_over() {
        let (start, end) = month_window(2024, 12).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_month_window_rejects_invalid_input() {
        assert!(month_window(2024, 0).is_err());
        assert!(month_window(2024, 13).is_err());
        assert!(month_window(10000, 5).is_err());
    }
}
