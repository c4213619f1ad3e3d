//! Participation (RSVP) handlers
//!
//! Anyone may submit a participation request for an existing event; listing,
//! reviewing, and deleting tickets requires a valid access token.

use crate::auth::AuthenticatedAdmin;
use crate::error::AppError;
use crate::state::AppState;
use almanac_core::{Participation, ParticipationStatus};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// Participation ticket information
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ParticipationResponse {
    /// Ticket UUID
    pub id: Uuid,

    /// Event this ticket belongs to
    pub event_id: Uuid,

    /// Visitor name
    pub name: String,

    /// Visitor contact (email or phone)
    pub contact: String,

    /// Optional note from the visitor
    pub note: Option<String>,

    /// Review state
    #[schema(example = "pending")]
    pub status: String,

    /// Submission timestamp
    pub created_at: DateTime<Utc>,
}

impl From<Participation> for ParticipationResponse {
    fn from(participation: Participation) -> Self {
        Self {
            id: participation.id,
            event_id: participation.event_id,
            name: participation.name,
            contact: participation.contact,
            note: participation.note,
            status: participation.status.to_string(),
            created_at: participation.created_at,
        }
    }
}

/// Participation list response
#[derive(Debug, Serialize, ToSchema)]
pub struct ParticipationListResponse {
    /// Tickets, oldest first
    pub participations: Vec<ParticipationResponse>,

    /// Total count
    pub total: usize,
}

/// Participation submission request
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitParticipationRequest {
    /// Visitor name
    pub name: String,

    /// How to reach the visitor
    pub contact: String,

    /// Optional note
    pub note: Option<String>,
}

/// Submit a participation request for an event
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/participations",
    tag = "participations",
    params(
        ("id" = Uuid, Path, description = "Event UUID")
    ),
    request_body = SubmitParticipationRequest,
    responses(
        (status = 201, description = "Participation submitted", body = ParticipationResponse),
        (status = 400, description = "Invalid request", body = crate::error::ApiError),
        (status = 404, description = "Event not found", body = crate::error::ApiError)
    )
)]
pub async fn submit_participation(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<Uuid>,
    Json(request): Json<SubmitParticipationRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.increment_requests();

    if request.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name cannot be empty".to_string()));
    }
    if request.contact.trim().is_empty() {
        return Err(AppError::BadRequest("Contact cannot be empty".to_string()));
    }

    // Tickets only exist for events that do
    if state.calendar.get_event(event_id).await?.is_none() {
        return Err(AppError::NotFound("Event".to_string()));
    }

    let participation = Participation::new(
        event_id,
        request.name.trim(),
        request.contact.trim(),
        request.note,
    );
    state.calendar.create_participation(&participation).await?;

    Ok((
        StatusCode::CREATED,
        Json(ParticipationResponse::from(participation)),
    ))
}

/// List the participation tickets of an event
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/participations",
    tag = "participations",
    params(
        ("id" = Uuid, Path, description = "Event UUID")
    ),
    responses(
        (status = 200, description = "Tickets for the event", body = ParticipationListResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 404, description = "Event not found", body = crate::error::ApiError)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_participations(
    State(state): State<Arc<AppState>>,
    _admin: AuthenticatedAdmin,
    Path(event_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.increment_requests();

    if state.calendar.get_event(event_id).await?.is_none() {
        return Err(AppError::NotFound("Event".to_string()));
    }

    let participations = state.calendar.list_participations(event_id).await?;
    let participations: Vec<ParticipationResponse> = participations
        .into_iter()
        .map(ParticipationResponse::from)
        .collect();

    let response = ParticipationListResponse {
        total: participations.len(),
        participations,
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Participation review request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateParticipationRequest {
    /// New review state: pending, confirmed, or declined
    #[schema(example = "confirmed")]
    pub status: String,
}

/// Review a participation ticket
#[utoipa::path(
    put,
    path = "/api/v1/participations/{id}",
    tag = "participations",
    params(
        ("id" = Uuid, Path, description = "Participation UUID")
    ),
    request_body = UpdateParticipationRequest,
    responses(
        (status = 200, description = "Ticket updated", body = ParticipationResponse),
        (status = 400, description = "Invalid status", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 404, description = "Ticket not found", body = crate::error::ApiError)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_participation(
    State(state): State<Arc<AppState>>,
    admin: AuthenticatedAdmin,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateParticipationRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.increment_requests();

    let status = ParticipationStatus::parse(&request.status).ok_or_else(|| {
        AppError::BadRequest(format!("Unknown participation status: {}", request.status))
    })?;

    if !state.calendar.update_participation_status(id, status).await? {
        return Err(AppError::NotFound("Participation".to_string()));
    }

    let participation = state
        .calendar
        .get_participation(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Participation".to_string()))?;

    tracing::info!(admin = %admin.username, participation = %id, status = %status, "participation reviewed");

    Ok((
        StatusCode::OK,
        Json(ParticipationResponse::from(participation)),
    ))
}

/// Delete participation response
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteParticipationResponse {
    pub message: String,
}

/// Delete a participation ticket
#[utoipa::path(
    delete,
    path = "/api/v1/participations/{id}",
    tag = "participations",
    params(
        ("id" = Uuid, Path, description = "Participation UUID")
    ),
    responses(
        (status = 200, description = "Ticket deleted", body = DeleteParticipationResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 404, description = "Ticket not found", body = crate::error::ApiError)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_participation(
    State(state): State<Arc<AppState>>,
    admin: AuthenticatedAdmin,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.increment_requests();

    if !state.calendar.delete_participation(id).await? {
        return Err(AppError::NotFound("Participation".to_string()));
    }

    tracing::info!(admin = %admin.username, participation = %id, "participation deleted");

    Ok((
        StatusCode::OK,
        Json(DeleteParticipationResponse {
            message: format!("Participation {id} deleted"),
        }),
    ))
}
