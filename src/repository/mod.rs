use async_trait::async_trait;
use uuid::Uuid;
use crate::domain::*;
use crate::error::Result;

pub mod announcement_repository;

pub use announcement_repository::SqliteAnnouncementRepository;

#[async_trait]
pub trait AnnouncementRepository: Send + Sync {
    async fn create(&self, input: AnnouncementInput) -> Result<Announcement>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Announcement>>;
    /// All announcements, pinned first then most recently started.
    async fn list(&self) -> Result<Vec<Announcement>>;
    async fn update(&self, id: Uuid, input: AnnouncementInput) -> Result<Announcement>;
    /// Returns false when no announcement had that id.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}
