pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    Router,
    routing::{get, post, put, delete},
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::TraceLayer,
};
use std::sync::Arc;

use crate::{
    config::Settings,
    service::ServiceContext,
};
use state::AppState;

pub fn create_app(
    service_context: Arc<ServiceContext>,
    settings: Arc<Settings>,
) -> Router {
    let app_state = AppState::new(service_context, settings);

    Router::new()
        // Root and health endpoints
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))

        // Public read API
        .nest("/api", api_routes())

        // Gated write API
        .nest("/admin", admin_routes(app_state.clone()))

        // Add state to the router
        .with_state(app_state)

        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/announcements", get(handlers::announcements::list))
        .route("/announcements/stream", get(handlers::announcements::stream))
        .route("/announcements/:id", get(handlers::announcements::get))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/verify", post(handlers::admin::verify))
        .route("/announcements", post(handlers::admin::create))
        .route("/announcements/:id", put(handlers::admin::update))
        .route("/announcements/:id", delete(handlers::admin::delete))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_admin,
        ))
}
