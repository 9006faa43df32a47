use std::sync::Arc;

use chrono::{Duration, Utc};
use portal::{
    auth::AdminGate,
    domain::{AnnouncementInput, Severity},
    error::AppError,
    service::{AnnouncementChange, ChangeKind, ServiceContext},
};
use sqlx::sqlite::SqlitePoolOptions;
use tokio::sync::broadcast::error::TryRecvError;

const ADMIN_PASSWORD: &str = "portal-admin-secret";

async fn service_context() -> anyhow::Result<ServiceContext> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await?;

    let gate = Arc::new(AdminGate::new(Some(ADMIN_PASSWORD.to_string())));
    Ok(ServiceContext::new(gate, pool))
}

fn input(title: &str) -> AnnouncementInput {
    AnnouncementInput {
        title: title.to_string(),
        body: format!("{} body", title),
        severity: Severity::Warning,
        pinned: false,
        start_at: Utc::now() - Duration::hours(1),
        end_at: None,
        cta_label: None,
        cta_href: None,
    }
}

#[tokio::test]
async fn test_writes_publish_changes() -> anyhow::Result<()> {
    let ctx = service_context().await?;
    let service = &ctx.announcement_service;
    let grant = ctx.admin_gate.authorize(ADMIN_PASSWORD)?;
    let mut changes = service.subscribe();

    let created = service.create(&grant, input("System Maintenance Window")).await?;
    assert_eq!(
        changes.recv().await?,
        AnnouncementChange { kind: ChangeKind::Created, id: created.id }
    );

    let mut update = input("Maintenance Rescheduled");
    update.pinned = true;
    service.update(&grant, created.id, update).await?;
    assert_eq!(
        changes.recv().await?,
        AnnouncementChange { kind: ChangeKind::Updated, id: created.id }
    );

    service.delete(&grant, created.id).await?;
    assert_eq!(
        changes.recv().await?,
        AnnouncementChange { kind: ChangeKind::Deleted, id: created.id }
    );

    assert!(matches!(changes.try_recv(), Err(TryRecvError::Empty)));

    Ok(())
}

#[tokio::test]
async fn test_failed_writes_publish_nothing() -> anyhow::Result<()> {
    let ctx = service_context().await?;
    let service = &ctx.announcement_service;
    let grant = ctx.admin_gate.authorize(ADMIN_PASSWORD)?;
    let mut changes = service.subscribe();

    let mut inverted = input("Backwards");
    inverted.end_at = Some(inverted.start_at - Duration::days(1));
    assert!(matches!(service.create(&grant, inverted).await, Err(AppError::Validation(_))));

    let missing = uuid::Uuid::new_v4();
    assert!(matches!(service.update(&grant, missing, input("ghost")).await, Err(AppError::NotFound(_))));
    assert!(matches!(service.delete(&grant, missing).await, Err(AppError::NotFound(_))));

    assert!(matches!(changes.try_recv(), Err(TryRecvError::Empty)));

    Ok(())
}

#[tokio::test]
async fn test_change_serializes_for_clients() -> anyhow::Result<()> {
    let id = uuid::Uuid::new_v4();
    let json = serde_json::to_value(AnnouncementChange { kind: ChangeKind::Deleted, id })?;
    assert_eq!(json["kind"], "deleted");
    assert_eq!(json["id"], id.to_string());
    Ok(())
}
