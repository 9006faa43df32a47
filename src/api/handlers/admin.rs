use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    api::state::AppState,
    auth::AdminGrant,
    domain::{Announcement, AnnouncementInput},
    error::Result,
};

/// Lets the admin UI check a password before showing the editor. Reaching
/// this handler at all means the middleware accepted it.
pub async fn verify(Extension(_grant): Extension<AdminGrant>) -> Json<Value> {
    Json(json!({ "success": true }))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(grant): Extension<AdminGrant>,
    Json(input): Json<AnnouncementInput>,
) -> Result<(StatusCode, Json<Announcement>)> {
    let announcement = state
        .service_context
        .announcement_service
        .create(&grant, input)
        .await?;

    Ok((StatusCode::CREATED, Json(announcement)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(grant): Extension<AdminGrant>,
    Json(input): Json<AnnouncementInput>,
) -> Result<Json<Announcement>> {
    let announcement = state
        .service_context
        .announcement_service
        .update(&grant, id, input)
        .await?;

    Ok(Json(announcement))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(grant): Extension<AdminGrant>,
) -> Result<StatusCode> {
    state
        .service_context
        .announcement_service
        .delete(&grant, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
