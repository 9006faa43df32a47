pub mod cookie_store;
pub mod templates;
pub mod portal;

use axum::Router;
use crate::api::state::AppState;

pub fn create_web_routes(state: AppState) -> Router {
    Router::new()
        // Portal routes
        .nest("/portal", portal::create_portal_routes())

        .with_state(state)
}
