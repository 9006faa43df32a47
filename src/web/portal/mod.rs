mod announcements;

use axum::{
    Router,
    routing::{get, post},
};
use crate::api::state::AppState;

pub fn create_portal_routes() -> Router<AppState> {
    Router::new()
        .route("/announcements", get(announcements::announcements_page))
        .route("/announcements/all", get(announcements::announcements_overlay))
        .route("/announcements/:id/dismiss", post(announcements::dismiss_announcement))
}
