use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{Announcement, AnnouncementInput, Cta, Severity},
    error::{AppError, Result},
    repository::AnnouncementRepository,
};

#[derive(FromRow)]
struct AnnouncementRow {
    id: String,
    title: String,
    body: String,
    severity: String,
    pinned: i32,
    start_at: NaiveDateTime,
    end_at: Option<NaiveDateTime>,
    cta_label: Option<String>,
    cta_href: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteAnnouncementRepository {
    pool: SqlitePool,
}

impl SqliteAnnouncementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_announcement(row: AnnouncementRow) -> Result<Announcement> {
        Ok(Announcement {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            title: row.title,
            body: row.body,
            severity: row.severity.parse::<Severity>().map_err(AppError::Database)?,
            pinned: row.pinned != 0,
            start_at: DateTime::from_naive_utc_and_offset(row.start_at, Utc),
            end_at: row.end_at.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            cta: Cta::from_parts(row.cta_label, row.cta_href),
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

#[async_trait]
impl AnnouncementRepository for SqliteAnnouncementRepository {
    async fn create(&self, input: AnnouncementInput) -> Result<Announcement> {
        let id = Uuid::new_v4();
        let cta = input.cta();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO announcements (
                id, title, body, severity, pinned, start_at, end_at,
                cta_label, cta_href, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(id.to_string())
        .bind(&input.title)
        .bind(&input.body)
        .bind(input.severity.as_str())
        .bind(if input.pinned { 1i32 } else { 0i32 })
        .bind(input.start_at.naive_utc())
        .bind(input.end_at.map(|dt| dt.naive_utc()))
        .bind(cta.as_ref().map(|c| c.label.clone()))
        .bind(cta.as_ref().map(|c| c.href.clone()))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created announcement".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Announcement>> {
        let row = sqlx::query_as::<_, AnnouncementRow>(
            r#"
            SELECT id, title, body, severity, pinned, start_at, end_at,
                   cta_label, cta_href, created_at, updated_at
            FROM announcements
            WHERE id = ?
            "#
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(Self::row_to_announcement).transpose()
    }

    async fn list(&self) -> Result<Vec<Announcement>> {
        let rows = sqlx::query_as::<_, AnnouncementRow>(
            r#"
            SELECT id, title, body, severity, pinned, start_at, end_at,
                   cta_label, cta_href, created_at, updated_at
            FROM announcements
            ORDER BY pinned DESC, start_at DESC
            "#
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(Self::row_to_announcement)
            .collect()
    }

    async fn update(&self, id: Uuid, input: AnnouncementInput) -> Result<Announcement> {
        let cta = input.cta();
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            UPDATE announcements
            SET title = ?, body = ?, severity = ?, pinned = ?,
                start_at = ?, end_at = ?, cta_label = ?, cta_href = ?,
                updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(&input.title)
        .bind(&input.body)
        .bind(input.severity.as_str())
        .bind(if input.pinned { 1i32 } else { 0i32 })
        .bind(input.start_at.naive_utc())
        .bind(input.end_at.map(|dt| dt.naive_utc()))
        .bind(cta.as_ref().map(|c| c.label.clone()))
        .bind(cta.as_ref().map(|c| c.href.clone()))
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Announcement not found".to_string()));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated announcement".to_string())
        })
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM announcements WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
