//! API route definitions

use crate::handlers::{auth, events, participations};
use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

/// Create API v1 routes
///
/// Write access to events and participations is gated per handler through
/// the [`AuthenticatedAdmin`](crate::auth::AuthenticatedAdmin) extractor;
/// browsing and RSVP submission stay public.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Session endpoints
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/renew", post(auth::renew_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/password", post(auth::change_password_handler))
        // Event endpoints
        .route("/events", get(events::list_events).post(events::create_event))
        .route(
            "/events/:id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        // Participation endpoints
        .route(
            "/events/:id/participations",
            post(participations::submit_participation).get(participations::list_participations),
        )
        .route(
            "/participations/:id",
            put(participations::update_participation)
                .delete(participations::delete_participation),
        )
}
