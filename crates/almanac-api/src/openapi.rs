//! OpenAPI documentation

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// OpenAPI document for the Almanac API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Almanac API",
        description = "Calendar and event management backend with admin sessions and public RSVP"
    ),
    paths(
        crate::handlers::health::health_check,
        crate::handlers::health::readiness_check,
        crate::handlers::auth::login_handler,
        crate::handlers::auth::renew_handler,
        crate::handlers::auth::logout_handler,
        crate::handlers::auth::change_password_handler,
        crate::handlers::events::list_events,
        crate::handlers::events::get_event,
        crate::handlers::events::create_event,
        crate::handlers::events::update_event,
        crate::handlers::events::delete_event,
        crate::handlers::participations::submit_participation,
        crate::handlers::participations::list_participations,
        crate::handlers::participations::update_participation,
        crate::handlers::participations::delete_participation,
    ),
    components(schemas(
        crate::error::ApiError,
        crate::auth::LoginRequest,
        crate::auth::RefreshRequest,
        crate::auth::ChangePasswordRequest,
        crate::auth::LoginResponse,
        crate::auth::RenewResponse,
        crate::auth::ChangePasswordResponse,
        crate::handlers::auth::LogoutResponse,
        crate::handlers::events::EventResponse,
        crate::handlers::events::EventListResponse,
        crate::handlers::events::CreateEventRequest,
        crate::handlers::events::UpdateEventRequest,
        crate::handlers::events::DeleteEventResponse,
        crate::handlers::participations::ParticipationResponse,
        crate::handlers::participations::ParticipationListResponse,
        crate::handlers::participations::SubmitParticipationRequest,
        crate::handlers::participations::UpdateParticipationRequest,
        crate::handlers::participations::DeleteParticipationResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Service probes"),
        (name = "auth", description = "Admin session management"),
        (name = "events", description = "Calendar events"),
        (name = "participations", description = "Public participation tickets")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_builds() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_value(&doc).unwrap();

        assert!(json["paths"]["/api/v1/auth/login"].is_object());
        assert!(json["paths"]["/api/v1/events"].is_object());
        assert!(json["components"]["securitySchemes"]["bearer_auth"].is_object());
    }
}
