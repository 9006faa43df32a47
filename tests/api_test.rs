use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use futures_util::StreamExt;
use portal::{
    api::{self, state::AppState},
    auth::AdminGate,
    config::Settings,
    domain::Announcement,
    service::ServiceContext,
    web,
};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

const ADMIN_PASSWORD: &str = "portal-admin-secret";

async fn test_app() -> anyhow::Result<Router> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await?;

    let gate = Arc::new(AdminGate::new(Some(ADMIN_PASSWORD.to_string())));
    let service_context = Arc::new(ServiceContext::new(gate, pool));
    let settings = Arc::new(Settings::default());

    let api_app = api::create_app(service_context.clone(), settings.clone());
    let web_app = web::create_web_routes(AppState::new(service_context, settings));

    Ok(api_app.merge(web_app))
}

fn announcement_json(title: &str) -> Value {
    json!({
        "title": title,
        "body": format!("{} details", title),
        "severity": "warning",
        "pinned": false,
        "start_at": (Utc::now() - Duration::hours(1)).to_rfc3339(),
        "end_at": null,
        "cta_label": "Learn more",
        "cta_href": "https://office.com"
    })
}

fn admin_post(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", ADMIN_PASSWORD))
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> anyhow::Result<String> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(String::from_utf8(bytes.to_vec())?)
}

async fn create_announcement(app: &Router, title: &str) -> anyhow::Result<Announcement> {
    let response = app
        .clone()
        .oneshot(admin_post("/admin/announcements", &announcement_json(title)))
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    Ok(serde_json::from_str(&body_string(response).await?)?)
}

#[tokio::test]
async fn test_writes_require_admin_password() -> anyhow::Result<()> {
    let app = test_app().await?;

    let missing = Request::builder()
        .method("POST")
        .uri("/admin/announcements")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(announcement_json("Nope").to_string()))?;
    let response = app.clone().oneshot(missing).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let wrong = Request::builder()
        .method("POST")
        .uri("/admin/verify")
        .header("x-admin-password", "guess")
        .body(Body::empty())?;
    let response = app.clone().oneshot(wrong).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let right = Request::builder()
        .method("POST")
        .uri("/admin/verify")
        .header("x-admin-password", ADMIN_PASSWORD)
        .body(Body::empty())?;
    let response = app.oneshot(right).await?;
    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_create_list_and_delete() -> anyhow::Result<()> {
    let app = test_app().await?;

    let created = create_announcement(&app, "New Microsoft 365 Features Available").await?;
    assert!(created.cta.is_some());

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/announcements").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let listed: Vec<Announcement> = serde_json::from_str(&body_string(response).await?)?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, created.id);

    let delete = Request::builder()
        .method("DELETE")
        .uri(format!("/admin/announcements/{}", created.id))
        .header(header::AUTHORIZATION, format!("Bearer {}", ADMIN_PASSWORD))
        .body(Body::empty())?;
    let response = app.clone().oneshot(delete).await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/announcements/{}", created.id))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_inverted_window_is_rejected() -> anyhow::Result<()> {
    let app = test_app().await?;

    let mut body = announcement_json("Backwards");
    body["end_at"] = json!((Utc::now() - Duration::days(2)).to_rfc3339());

    let response = app.oneshot(admin_post("/admin/announcements", &body)).await?;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    Ok(())
}

#[tokio::test]
async fn test_portal_dismissal_hides_announcement() -> anyhow::Result<()> {
    let app = test_app().await?;
    let created = create_announcement(&app, "Security Update Required").await?;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/portal/announcements").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await?.contains("Security Update Required"));

    let dismiss = Request::builder()
        .method("POST")
        .uri(format!("/portal/announcements/{}/dismiss", created.id))
        .body(Body::empty())?;
    let response = app.clone().oneshot(dismiss).await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let cookie = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("dismissed_announcements="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
        .expect("dismissal cookie");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/portal/announcements")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())?,
        )
        .await?;
    assert!(!body_string(response).await?.contains("Security Update Required"));

    // A mangled cookie must not hide anything
    let response = app
        .oneshot(
            Request::builder()
                .uri("/portal/announcements")
                .header(header::COOKIE, "dismissed_announcements=%%%garbage")
                .body(Body::empty())?,
        )
        .await?;
    assert!(body_string(response).await?.contains("Security Update Required"));

    Ok(())
}

#[tokio::test]
async fn test_overlay_filters_by_severity() -> anyhow::Result<()> {
    let app = test_app().await?;
    create_announcement(&app, "System Maintenance Window").await?;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/portal/announcements/all?q=maintenance&severity=warning")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await?.contains("System Maintenance Window"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/portal/announcements/all?severity=critical")
                .body(Body::empty())?,
        )
        .await?;
    let html = body_string(response).await?;
    assert!(!html.contains("System Maintenance Window"));
    assert!(html.contains("No announcements match your filters."));

    Ok(())
}

#[tokio::test]
async fn test_update_over_http() -> anyhow::Result<()> {
    let app = test_app().await?;
    let created = create_announcement(&app, "Holiday Schedule Reminder").await?;

    let mut body = announcement_json("Holiday Schedule Updated");
    body["pinned"] = json!(true);
    body["severity"] = json!("info");

    let put = Request::builder()
        .method("PUT")
        .uri(format!("/admin/announcements/{}", created.id))
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", ADMIN_PASSWORD))
        .body(Body::from(body.to_string()))?;
    let response = app.clone().oneshot(put).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let updated: Announcement = serde_json::from_str(&body_string(response).await?)?;
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.title, "Holiday Schedule Updated");
    assert!(updated.pinned);

    // Unauthenticated updates are refused
    let anonymous = Request::builder()
        .method("PUT")
        .uri(format!("/admin/announcements/{}", created.id))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))?;
    let response = app.oneshot(anonymous).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn test_active_filter() -> anyhow::Result<()> {
    let app = test_app().await?;
    let current = create_announcement(&app, "Running Now").await?;

    let mut scheduled = announcement_json("Starts Tomorrow");
    scheduled["start_at"] = json!((Utc::now() + Duration::days(1)).to_rfc3339());
    let response = app
        .clone()
        .oneshot(admin_post("/admin/announcements", &scheduled))
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/announcements").body(Body::empty())?)
        .await?;
    let all: Vec<Announcement> = serde_json::from_str(&body_string(response).await?)?;
    assert_eq!(all.len(), 2);

    let response = app
        .oneshot(Request::builder().uri("/api/announcements?active=true").body(Body::empty())?)
        .await?;
    let active: Vec<Announcement> = serde_json::from_str(&body_string(response).await?)?;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, current.id);

    Ok(())
}

#[tokio::test]
async fn test_stream_relays_changes() -> anyhow::Result<()> {
    let app = test_app().await?;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/announcements/stream").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/event-stream"));
    let mut events = response.into_body().into_data_stream();

    let created = create_announcement(&app, "Security Update Required").await?;

    let chunk = tokio::time::timeout(std::time::Duration::from_secs(5), events.next())
        .await?
        .expect("stream ended")?;
    let frame = String::from_utf8(chunk.to_vec())?;
    assert!(frame.contains("event: announcements"), "unexpected frame {:?}", frame);
    assert!(frame.contains("\"kind\":\"created\""));
    assert!(frame.contains(&created.id.to_string()));

    Ok(())
}

fn dismissal_cookie(response: &axum::response::Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("dismissed_announcements="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

#[tokio::test]
async fn test_overlay_keeps_dismissed_announcements() -> anyhow::Result<()> {
    let app = test_app().await?;
    let mut created = Vec::new();
    for i in 0..4 {
        created.push(create_announcement(&app, &format!("Item {}", i)).await?);
    }

    let dismiss = Request::builder()
        .method("POST")
        .uri(format!("/portal/announcements/{}/dismiss", created[0].id))
        .body(Body::empty())?;
    let response = app.clone().oneshot(dismiss).await?;
    let cookie = dismissal_cookie(&response).expect("dismissal cookie");

    // Three cards remain inline, but all four active announcements are counted
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/portal/announcements")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())?,
        )
        .await?;
    let page = body_string(response).await?;
    assert!(!page.contains("Item 0"));
    assert!(page.contains("View all announcements (4)"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/portal/announcements/all")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())?,
        )
        .await?;
    let overlay = body_string(response).await?;
    for a in &created {
        assert!(overlay.contains(&a.title), "overlay is missing {}", a.title);
    }
    assert_eq!(overlay.matches(">Dismissed</span>").count(), 1);

    Ok(())
}

#[tokio::test]
async fn test_htmx_dismiss_refreshes_banner_and_overlay() -> anyhow::Result<()> {
    let app = test_app().await?;
    let created = create_announcement(&app, "System Maintenance Window").await?;

    let dismiss = Request::builder()
        .method("POST")
        .uri(format!("/portal/announcements/{}/dismiss", created.id))
        .header("HX-Request", "true")
        .body(Body::empty())?;
    let response = app.oneshot(dismiss).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("hx-trigger").and_then(|v| v.to_str().ok()),
        Some("announcements-changed")
    );
    assert!(dismissal_cookie(&response).is_some());

    let banner = body_string(response).await?;
    assert!(banner.contains("id=\"announcement-banner\""));
    assert!(!banner.contains("System Maintenance Window"));

    Ok(())
}

