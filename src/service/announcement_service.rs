use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AdminGrant,
    domain::{Announcement, AnnouncementInput},
    error::{AppError, Result},
    repository::AnnouncementRepository,
};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// Published after every successful write so connected clients can re-fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnouncementChange {
    pub kind: ChangeKind,
    pub id: Uuid,
}

pub struct AnnouncementService {
    repo: Arc<dyn AnnouncementRepository>,
    changes: broadcast::Sender<AnnouncementChange>,
}

impl AnnouncementService {
    pub fn new(repo: Arc<dyn AnnouncementRepository>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { repo, changes }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AnnouncementChange> {
        self.changes.subscribe()
    }

    pub async fn list(&self) -> Result<Vec<Announcement>> {
        self.repo.list().await
    }

    pub async fn get(&self, id: Uuid) -> Result<Announcement> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Announcement not found".to_string()))
    }

    pub async fn create(&self, _grant: &AdminGrant, input: AnnouncementInput) -> Result<Announcement> {
        Self::validate(&input)?;

        let announcement = self.repo.create(input).await?;
        tracing::info!("Created announcement {} ({})", announcement.id, announcement.title);
        self.publish(ChangeKind::Created, announcement.id);

        Ok(announcement)
    }

    pub async fn update(&self, _grant: &AdminGrant, id: Uuid, input: AnnouncementInput) -> Result<Announcement> {
        Self::validate(&input)?;

        let announcement = self.repo.update(id, input).await?;
        tracing::info!("Updated announcement {}", id);
        self.publish(ChangeKind::Updated, id);

        Ok(announcement)
    }

    pub async fn delete(&self, _grant: &AdminGrant, id: Uuid) -> Result<()> {
        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound("Announcement not found".to_string()));
        }

        tracing::info!("Deleted announcement {}", id);
        self.publish(ChangeKind::Deleted, id);

        Ok(())
    }

    fn validate(input: &AnnouncementInput) -> Result<()> {
        input.validate()?;

        if input.has_inverted_window() {
            return Err(AppError::Validation(
                "end_at must not be before start_at".to_string(),
            ));
        }

        Ok(())
    }

    fn publish(&self, kind: ChangeKind, id: Uuid) {
        // No receivers just means nobody is listening right now.
        let _ = self.changes.send(AnnouncementChange { kind, id });
    }
}
