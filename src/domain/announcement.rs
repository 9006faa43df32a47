use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub severity: Severity,
    pub pinned: bool,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub cta: Option<Cta>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Single call-to-action link shown under an announcement body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cta {
    pub label: String,
    pub href: String,
}

/// Tailwind classes used to render one severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityStyle {
    pub bg_color: &'static str,
    pub border_color: &'static str,
    pub icon_color: &'static str,
    pub text_color: &'static str,
}

/// Admin-supplied fields for creating or replacing an announcement.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnnouncementInput {
    #[validate(length(min = 1, max = 200, message = "title must be between 1 and 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "body must not be empty"))]
    pub body: String,
    pub severity: Severity,
    #[serde(default)]
    pub pinned: bool,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub cta_label: Option<String>,
    pub cta_href: Option<String>,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Info, Severity::Warning, Severity::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }

    pub fn style(&self) -> SeverityStyle {
        match self {
            Severity::Critical => SeverityStyle {
                bg_color: "bg-red-50",
                border_color: "border-red-300",
                icon_color: "text-red-600",
                text_color: "text-red-900",
            },
            Severity::Warning => SeverityStyle {
                bg_color: "bg-amber-50",
                border_color: "border-amber-200",
                icon_color: "text-amber-600",
                text_color: "text-amber-900",
            },
            Severity::Info => SeverityStyle {
                bg_color: "bg-blue-50",
                border_color: "border-blue-200",
                icon_color: "text-blue-600",
                text_color: "text-gray-900",
            },
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "critical" => Ok(Severity::Critical),
            other => Err(format!("Invalid severity: {}", other)),
        }
    }
}

impl Cta {
    /// Builds a CTA only when both parts are present and non-blank.
    /// Anything partial is treated as no CTA at all.
    pub fn from_parts(label: Option<String>, href: Option<String>) -> Option<Cta> {
        let label = label.map(|l| l.trim().to_string()).filter(|l| !l.is_empty())?;
        let href = href.map(|h| h.trim().to_string()).filter(|h| !h.is_empty())?;
        Some(Cta { label, href })
    }
}

impl AnnouncementInput {
    pub fn cta(&self) -> Option<Cta> {
        Cta::from_parts(self.cta_label.clone(), self.cta_href.clone())
    }

    /// True when the active window is empty (ends before it starts).
    pub fn has_inverted_window(&self) -> bool {
        matches!(self.end_at, Some(end) if end < self.start_at)
    }
}
