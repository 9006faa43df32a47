use std::sync::Mutex;

use axum_extra::extract::CookieJar;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use cookie::{Cookie, SameSite};

use crate::visibility::{DismissalLog, DismissalStore, DismissalStoreError};

pub const DISMISSAL_COOKIE: &str = "dismissed_announcements";

/// Browsers drop cookies over 4096 bytes. Each encoded entry costs about 105
/// bytes, so this leaves headroom for the attributes.
const MAX_COOKIE_ENTRIES: usize = 32;

/// Dismissals outlive the suppression window by a wide margin; expiry of
/// individual entries is decided by their timestamps, not by the cookie.
const COOKIE_MAX_AGE_DAYS: i64 = 365;

/// Per-request view of the browser's dismissal log, carried in a cookie as
/// base64url-encoded JSON. Writes are held until the handler turns them into
/// a `Set-Cookie` with [`CookieDismissalStore::into_cookie`].
#[derive(Debug, Default)]
pub struct CookieDismissalStore {
    incoming: Option<String>,
    pending: Mutex<Option<String>>,
}

impl CookieDismissalStore {
    pub fn from_jar(jar: &CookieJar) -> Self {
        Self {
            incoming: jar.get(DISMISSAL_COOKIE).map(|c| c.value().to_string()),
            pending: Mutex::new(None),
        }
    }

    pub fn into_cookie(self, secure: bool) -> Option<Cookie<'static>> {
        let pending = self.pending.into_inner().ok().flatten()?;
        let contents = match DismissalLog::try_parse(&pending) {
            Some(mut log) if log.len() > MAX_COOKIE_ENTRIES => {
                tracing::debug!("Trimming dismissal cookie from {} entries", log.len());
                log.retain_newest(MAX_COOKIE_ENTRIES);
                log.to_json()
            }
            _ => pending,
        };

        Some(
            Cookie::build((DISMISSAL_COOKIE, URL_SAFE_NO_PAD.encode(contents)))
                .path("/")
                .same_site(SameSite::Lax)
                .http_only(true)
                .secure(secure)
                .max_age(cookie::time::Duration::days(COOKIE_MAX_AGE_DAYS))
                .build(),
        )
    }
}

impl DismissalStore for CookieDismissalStore {
    fn read(&self) -> Result<Option<String>, DismissalStoreError> {
        let pending = self
            .pending
            .lock()
            .map_err(|e| DismissalStoreError::Unavailable(e.to_string()))?;
        if let Some(contents) = pending.as_ref() {
            return Ok(Some(contents.clone()));
        }

        let Some(encoded) = self.incoming.as_deref() else {
            return Ok(None);
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| DismissalStoreError::Corrupt(e.to_string()))?;
        let contents = String::from_utf8(bytes)
            .map_err(|e| DismissalStoreError::Corrupt(e.to_string()))?;

        Ok(Some(contents))
    }

    fn write(&self, contents: &str) -> Result<(), DismissalStoreError> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|e| DismissalStoreError::Unavailable(e.to_string()))?;
        *pending = Some(contents.to_string());
        Ok(())
    }
}
