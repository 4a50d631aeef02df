//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Bridge endpoints are mounted under `/api/v1` next to the `/ws`
//! WebSocket; both require the bridge bearer token. `/health` is open.

pub mod auth;
pub mod dto;
pub mod handlers;

use axum::routing::get;
use axum::{Router, middleware};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// OpenAPI document for the bridge surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "diplomacy-relay",
        description = "Bridge surface of the webDiplomacy notification relay."
    ),
    paths(
        handlers::system::health_handler,
        handlers::messages::submit_message,
        handlers::subscriptions::list_pollers,
        handlers::subscriptions::list_alarms,
    ),
    components(schemas(
        dto::InboundMessageRequest,
        dto::InboundMessageResponse,
        dto::PollerListResponse,
        dto::AlarmListResponse,
        crate::error::ErrorResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "System", description = "Liveness"),
        (name = "Messages", description = "Inbound chat traffic"),
        (name = "Subscriptions", description = "Followed games and alarms per channel"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// Builds the complete application router with all routes and layers.
pub fn build_router(state: AppState) -> Router {
    let guard = middleware::from_fn_with_state(state.clone(), auth::require_bearer);

    let protected = Router::new()
        .nest("/api/v1", handlers::routes())
        .route("/ws", get(ws_handler))
        .route_layer(guard);

    let router = Router::new()
        .merge(protected)
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
