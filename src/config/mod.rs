use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

use crate::visibility::{
    dismiss_window_from_days,
    presentation::{DEFAULT_INLINE_LIMIT, DEFAULT_PREVIEW_LENGTH},
    DEFAULT_DISMISS_WINDOW_DAYS,
};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub announcements: AnnouncementConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub secure_cookies: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AdminConfig {
    /// Shared secret required for announcement writes. Unset means writes
    /// are refused.
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AnnouncementConfig {
    pub dismiss_window_days: i64,
    pub inline_limit: usize,
    pub preview_length: usize,
}

impl Default for AnnouncementConfig {
    fn default() -> Self {
        Self {
            dismiss_window_days: DEFAULT_DISMISS_WINDOW_DAYS,
            inline_limit: DEFAULT_INLINE_LIMIT,
            preview_length: DEFAULT_PREVIEW_LENGTH,
        }
    }
}

impl AnnouncementConfig {
    pub fn dismiss_window(&self) -> chrono::Duration {
        dismiss_window_from_days(self.dismiss_window_days)
            .unwrap_or_else(|| chrono::Duration::days(DEFAULT_DISMISS_WINDOW_DAYS))
    }

    /// Resets a dismissal window that is not a positive, representable
    /// number of days.
    fn sanitize(&mut self) {
        if dismiss_window_from_days(self.dismiss_window_days).is_none() {
            tracing::warn!(
                "Invalid announcements.dismiss_window_days {}; using {}",
                self.dismiss_window_days,
                DEFAULT_DISMISS_WINDOW_DAYS
            );
            self.dismiss_window_days = DEFAULT_DISMISS_WINDOW_DAYS;
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.secure_cookies", false)?
            .set_default("database.url", "sqlite://portal.db")?
            .set_default("database.max_connections", 10)?
            .set_default("announcements.dismiss_window_days", DEFAULT_DISMISS_WINDOW_DAYS)?
            .set_default("announcements.inline_limit", DEFAULT_INLINE_LIMIT as i64)?
            .set_default("announcements.preview_length", DEFAULT_PREVIEW_LENGTH as i64)?

            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))

            // Environment overrides, e.g. PORTAL__ADMIN__PASSWORD
            .add_source(Environment::with_prefix("PORTAL").separator("__"))

            .build()?;

        let mut settings: Settings = config.try_deserialize()?;
        settings.announcements.sanitize();
        Ok(settings)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                secure_cookies: false,
            },
            database: DatabaseConfig {
                url: "sqlite://portal.db".to_string(),
                max_connections: 10,
            },
            admin: AdminConfig::default(),
            announcements: AnnouncementConfig::default(),
        }
    }
}
