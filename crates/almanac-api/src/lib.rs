//! Almanac API - calendar/event REST server
//!
//! HTTP surface for the Almanac backend: admin session management (login,
//! logout, renewal, password change), event CRUD, and public participation
//! submission.

pub mod audit;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use crate::state::AppState;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Build the full application router over the given state.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::health::metrics))
        .nest("/api/v1", routes::api_routes())
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// State backed by the in-memory store, for tests and local experiments.
///
/// Returns the store alongside the state so tests can seed admins and
/// inspect sessions directly.
#[cfg(any(test, feature = "test-utils"))]
pub fn testing_state() -> (Arc<AppState>, Arc<almanac_core::MemoryStore>) {
    let store = Arc::new(almanac_core::MemoryStore::new());
    let config = almanac_core::AppConfig::default();
    let state = Arc::new(AppState::new(
        config,
        store.clone(),
        store.clone(),
        store.clone(),
    ));
    (state, store)
}

/// Router over a fresh in-memory store.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_router_for_testing() -> Router {
    let (state, _store) = testing_state();
    create_router(state)
}
