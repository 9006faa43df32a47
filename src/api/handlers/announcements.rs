use std::convert::Infallible;

use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use chrono::Utc;
use futures_util::stream::{self, Stream};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::{
    api::state::AppState,
    domain::Announcement,
    error::Result,
    visibility::is_active,
};

#[derive(Debug, Deserialize)]
pub struct ListAnnouncementsQuery {
    pub active: Option<bool>,
}

/// The full announcement set. Clients apply their own dismissal log, so the
/// only server-side filter offered is the active window.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListAnnouncementsQuery>,
) -> Result<Json<Vec<Announcement>>> {
    let mut announcements = state.service_context.announcement_service.list().await?;

    if params.active.unwrap_or(false) {
        let now = Utc::now();
        announcements.retain(|a| is_active(a, now));
    }

    Ok(Json(announcements))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Announcement>> {
    let announcement = state.service_context.announcement_service.get(id).await?;
    Ok(Json(announcement))
}

/// Server-sent events, one `announcements` event per write.
pub async fn stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let receiver = state.service_context.announcement_service.subscribe();

    let events = stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(change) => {
                    let event = Event::default()
                        .event("announcements")
                        .json_data(&change)
                        .unwrap_or_else(|_| Event::default().event("announcements"));
                    return Some((Ok::<_, Infallible>(event), receiver));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Announcement stream subscriber lagged by {} events", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
