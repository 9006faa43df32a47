use std::collections::HashSet;

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    api::state::AppState,
    domain::{Announcement, Severity},
    visibility::{
        active_announcements, AnnouncementFilters, DismissalStore, InlineBanner, VisibilityEngine,
    },
    web::{
        cookie_store::CookieDismissalStore,
        templates::{CardView, HtmlTemplate},
    },
};

#[derive(Template)]
#[template(path = "portal/announcements.html")]
pub struct AnnouncementsPageTemplate {
    pub cards: Vec<CardView>,
    pub total: usize,
    pub has_more: bool,
}

#[derive(Template)]
#[template(path = "portal/banner.html")]
pub struct BannerTemplate {
    pub cards: Vec<CardView>,
    pub total: usize,
    pub has_more: bool,
}

#[derive(Template)]
#[template(path = "portal/overlay.html")]
pub struct OverlayTemplate {
    pub cards: Vec<CardView>,
    pub search_query: String,
    pub all_severities: bool,
    pub severity_options: Vec<SeverityOption>,
    pub filtered: bool,
}

/// htmx event fired after a dismissal so an open overlay re-fetches itself.
const CHANGED_EVENT: &str = "announcements-changed";

pub struct SeverityOption {
    pub value: &'static str,
    pub selected: bool,
}

fn engine_for<S: DismissalStore>(state: &AppState, store: S) -> VisibilityEngine<S> {
    VisibilityEngine::with_window(store, state.settings.announcements.dismiss_window())
}

async fn load_announcements(state: &AppState) -> Vec<Announcement> {
    state
        .service_context
        .announcement_service
        .list()
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to load announcements for portal: {}", e);
            Vec::new()
        })
}

/// Active announcements in display order, and the subset this viewer has
/// not dismissed.
fn partition<S: DismissalStore>(
    engine: &VisibilityEngine<S>,
    announcements: Vec<Announcement>,
    now: DateTime<Utc>,
) -> (Vec<Announcement>, Vec<Announcement>) {
    let active = active_announcements(announcements, now);
    let visible = engine.visible_announcements(active.clone(), now);
    (active, visible)
}

fn inline_cards(state: &AppState, active: &[Announcement], visible: &[Announcement]) -> (Vec<CardView>, InlineBanner) {
    let settings = &state.settings.announcements;
    let banner = InlineBanner::new(visible, active.len(), settings.inline_limit);
    let cards = banner
        .shown
        .iter()
        .map(|a| CardView::new(a, Some(settings.preview_length)))
        .collect();
    (cards, banner)
}

pub async fn announcements_page(
    State(state): State<AppState>,
    jar: CookieJar,
) -> impl IntoResponse {
    let announcements = load_announcements(&state).await;
    let engine = engine_for(&state, CookieDismissalStore::from_jar(&jar));
    let (active, visible) = partition(&engine, announcements, Utc::now());
    let (cards, banner) = inline_cards(&state, &active, &visible);

    HtmlTemplate(AnnouncementsPageTemplate {
        cards,
        total: banner.total,
        has_more: banner.has_more(),
    })
}

/// Full list for the "view all" overlay: every active announcement, including
/// ones this viewer dismissed, which are marked as such. Filters narrow the
/// list without reordering it.
pub async fn announcements_overlay(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(filters): Query<AnnouncementFilters>,
) -> impl IntoResponse {
    let announcements = load_announcements(&state).await;
    let engine = engine_for(&state, CookieDismissalStore::from_jar(&jar));
    let (active, visible) = partition(&engine, announcements, Utc::now());
    let visible_ids: HashSet<Uuid> = visible.iter().map(|a| a.id).collect();

    let cards = filters
        .apply(&active)
        .into_iter()
        .map(|a| CardView::new(a, None).with_dismissed(!visible_ids.contains(&a.id)))
        .collect();

    HtmlTemplate(OverlayTemplate {
        cards,
        search_query: filters.search.clone().unwrap_or_default(),
        all_severities: filters.severity.is_none(),
        severity_options: Severity::ALL
            .iter()
            .map(|s| SeverityOption {
                value: s.as_str(),
                selected: filters.severity == Some(*s),
            })
            .collect(),
        filtered: !filters.is_empty(),
    })
}

pub async fn dismiss_announcement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Response {
    let is_htmx = headers.get("HX-Request").is_some();
    let now = Utc::now();

    let engine = engine_for(&state, CookieDismissalStore::from_jar(&jar));
    engine.dismiss(id, now);
    tracing::debug!("Dismissed announcement {}", id);

    let body = if is_htmx {
        let announcements = load_announcements(&state).await;
        let (active, visible) = partition(&engine, announcements, now);
        let (cards, banner) = inline_cards(&state, &active, &visible);
        let mut response = HtmlTemplate(BannerTemplate {
            cards,
            total: banner.total,
            has_more: banner.has_more(),
        })
        .into_response();
        response
            .headers_mut()
            .insert("hx-trigger", HeaderValue::from_static(CHANGED_EVENT));
        response
    } else {
        Redirect::to("/portal/announcements").into_response()
    };

    let jar = match engine.into_store().into_cookie(state.settings.server.secure_cookies) {
        Some(cookie) => jar.add(cookie),
        None => jar,
    };

    (jar, body).into_response()
}
