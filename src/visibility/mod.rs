//! Announcement visibility: which announcements a client should see right now,
//! in what order, and how long a dismissal keeps one hidden.
//!
//! Everything here is a pure function of the announcement set, the client's
//! dismissal log and an explicit `now`. Nothing reads the wall clock and no
//! failure is ever surfaced to the caller.

pub mod log;
pub mod presentation;
pub mod store;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::Announcement;

pub use log::DismissalLog;
pub use presentation::{truncate_markdown, AnnouncementFilters, InlineBanner};
pub use store::{DismissalStore, DismissalStoreError, FileDismissalStore, MemoryDismissalStore};

pub const DEFAULT_DISMISS_WINDOW_DAYS: i64 = 7;

/// A dismissal window of `days` days, or `None` when `days` is not positive
/// or too large to represent.
pub fn dismiss_window_from_days(days: i64) -> Option<Duration> {
    if days <= 0 {
        return None;
    }
    Duration::try_days(days)
}

/// True iff `start_at <= now` and the announcement has not ended before `now`.
pub fn is_active(announcement: &Announcement, now: DateTime<Utc>) -> bool {
    now >= announcement.start_at && announcement.end_at.map_or(true, |end| now <= end)
}

/// Every active announcement in display order, dismissed or not. This is
/// what the "view all" overlay lists.
pub fn active_announcements(
    announcements: impl IntoIterator<Item = Announcement>,
    now: DateTime<Utc>,
) -> Vec<Announcement> {
    let mut active: Vec<Announcement> = announcements
        .into_iter()
        .filter(|a| is_active(a, now))
        .collect();
    sort_for_display(&mut active);
    active
}

/// Pinned first, then newest start first. Stable, so ties keep input order.
fn sort_for_display(announcements: &mut [Announcement]) {
    announcements.sort_by(|a, b| {
        b.pinned
            .cmp(&a.pinned)
            .then_with(|| b.start_at.cmp(&a.start_at))
    });
}

pub struct VisibilityEngine<S> {
    store: S,
    window: Duration,
}

impl<S: DismissalStore> VisibilityEngine<S> {
    pub fn new(store: S) -> Self {
        Self::with_window(store, Duration::days(DEFAULT_DISMISS_WINDOW_DAYS))
    }

    pub fn with_window(store: S, window: Duration) -> Self {
        Self { store, window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Reads the dismissal log, treating any failure as "no dismissals".
    fn load_log(&self) -> DismissalLog {
        match self.store.read() {
            Ok(Some(raw)) => DismissalLog::parse(&raw),
            Ok(None) => DismissalLog::new(),
            Err(e) => {
                tracing::warn!("Failed to read dismissal log, assuming no dismissals: {}", e);
                DismissalLog::new()
            }
        }
    }

    fn dismissed_in(&self, log: &DismissalLog, announcement_id: Uuid, now: DateTime<Utc>) -> bool {
        log.get(&announcement_id.to_string())
            .map_or(false, |dismissed_at| now - dismissed_at < self.window)
    }

    pub fn is_dismissed(&self, announcement_id: Uuid, now: DateTime<Utc>) -> bool {
        let log = self.load_log();
        self.dismissed_in(&log, announcement_id, now)
    }

    /// Records `now` as the dismissal time for the announcement. Never fails;
    /// if the log cannot be persisted the dismissal is simply lost.
    ///
    /// Entries whose window has already run out are dropped on the way, so
    /// the persisted log only holds dismissals that still hide something.
    pub fn dismiss(&self, announcement_id: Uuid, now: DateTime<Utc>) {
        let mut log = match self.store.read() {
            Ok(Some(raw)) => DismissalLog::try_parse(&raw).unwrap_or_else(|| {
                tracing::warn!("Replacing unreadable dismissal log");
                DismissalLog::new()
            }),
            Ok(None) => DismissalLog::new(),
            Err(e) => {
                tracing::warn!("Failed to read dismissal log before dismissing: {}", e);
                DismissalLog::new()
            }
        };

        log.record(&announcement_id.to_string(), now);
        log.prune_expired(now, self.window);

        if let Err(e) = self.store.write(&log.to_json()) {
            tracing::warn!("Failed to persist dismissal of {}: {}", announcement_id, e);
        }
    }

    /// Active, non-dismissed announcements: pinned first, then newest start
    /// first. The sort is stable, so ties keep their input order.
    pub fn visible_announcements(
        &self,
        announcements: impl IntoIterator<Item = Announcement>,
        now: DateTime<Utc>,
    ) -> Vec<Announcement> {
        let log = self.load_log();

        let mut visible: Vec<Announcement> = announcements
            .into_iter()
            .filter(|a| is_active(a, now) && !self.dismissed_in(&log, a.id, now))
            .collect();

        sort_for_display(&mut visible);
        visible
    }
}
