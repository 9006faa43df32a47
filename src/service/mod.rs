pub mod announcement_service;

use std::sync::Arc;
use sqlx::SqlitePool;
use crate::auth::AdminGate;
use crate::repository::*;

pub use announcement_service::{AnnouncementChange, AnnouncementService, ChangeKind};

pub struct ServiceContext {
    pub announcement_service: Arc<AnnouncementService>,
    pub admin_gate: Arc<AdminGate>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(admin_gate: Arc<AdminGate>, db_pool: SqlitePool) -> Self {
        let announcement_repo: Arc<dyn AnnouncementRepository> =
            Arc::new(SqliteAnnouncementRepository::new(db_pool.clone()));

        Self::with_repository(announcement_repo, admin_gate, db_pool)
    }

    pub fn with_repository(
        announcement_repo: Arc<dyn AnnouncementRepository>,
        admin_gate: Arc<AdminGate>,
        db_pool: SqlitePool,
    ) -> Self {
        let announcement_service = Arc::new(AnnouncementService::new(announcement_repo));

        Self {
            announcement_service,
            admin_gate,
            db_pool,
        }
    }
}
