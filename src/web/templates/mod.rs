use askama::Template;
use axum::{
    response::{Html, IntoResponse, Response},
    http::StatusCode,
};

use crate::{
    domain::{Announcement, SeverityStyle},
    visibility::truncate_markdown,
};

/// One rendered announcement card.
#[derive(Debug, Clone)]
pub struct CardView {
    pub id: String,
    pub title: String,
    pub body: String,
    pub severity: &'static str,
    pub style: SeverityStyle,
    pub pinned: bool,
    pub has_cta: bool,
    pub cta_label: String,
    pub cta_href: String,
    pub dismissed: bool,
}

impl CardView {
    /// Compact cards get a truncated plain-text body; full cards keep the
    /// original markdown.
    pub fn new(announcement: &Announcement, preview_length: Option<usize>) -> Self {
        let body = match preview_length {
            Some(max) => truncate_markdown(&announcement.body, max),
            None => announcement.body.clone(),
        };
        let (cta_label, cta_href) = announcement
            .cta
            .as_ref()
            .map(|c| (c.label.clone(), c.href.clone()))
            .unwrap_or_default();

        Self {
            id: announcement.id.to_string(),
            title: announcement.title.clone(),
            body,
            severity: announcement.severity.as_str(),
            style: announcement.severity.style(),
            pinned: announcement.pinned,
            has_cta: announcement.cta.is_some(),
            cta_label,
            cta_href,
            dismissed: false,
        }
    }

    pub fn with_dismissed(mut self, dismissed: bool) -> Self {
        self.dismissed = dismissed;
        self
    }
}

// Make askama templates work with axum
pub struct HtmlTemplate<T>(pub T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            ).into_response(),
        }
    }
}
