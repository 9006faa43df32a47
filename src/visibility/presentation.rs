use serde::Deserialize;

use crate::domain::{Announcement, Severity};

pub const DEFAULT_INLINE_LIMIT: usize = 3;
pub const DEFAULT_PREVIEW_LENGTH: usize = 240;

/// The first few visible announcements shown inline, plus the number of
/// active announcements behind the "view all" overlay. Dismissed items still
/// count towards `total` because the overlay still lists them.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineBanner {
    pub shown: Vec<Announcement>,
    pub total: usize,
    limit: usize,
}

impl InlineBanner {
    pub fn new(visible: &[Announcement], active_total: usize, limit: usize) -> Self {
        Self {
            shown: visible.iter().take(limit).cloned().collect(),
            total: active_total,
            limit,
        }
    }

    /// Whether to offer the overlay. Nothing is offered once every active
    /// announcement has been dismissed, since the banner itself is hidden.
    pub fn has_more(&self) -> bool {
        !self.shown.is_empty() && self.total > self.limit
    }

    pub fn is_empty(&self) -> bool {
        self.shown.is_empty()
    }
}

/// Overlay filters: free-text search on title/body and an exact severity.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnouncementFilters {
    #[serde(default, rename = "q")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_severity_filter")]
    pub severity: Option<Severity>,
}

fn deserialize_severity_filter<'de, D>(deserializer: D) -> Result<Option<Severity>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

impl AnnouncementFilters {
    pub fn is_empty(&self) -> bool {
        self.search_term().is_none() && self.severity.is_none()
    }

    /// The term is matched as typed; only case is ignored.
    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, announcement: &Announcement) -> bool {
        let matches_search = self.search_term().map_or(true, |term| {
            announcement.title.to_lowercase().contains(&term)
                || announcement.body.to_lowercase().contains(&term)
        });
        let matches_severity = self.severity.map_or(true, |s| announcement.severity == s);
        matches_search && matches_severity
    }

    /// Filters an already-ordered list without changing its order.
    pub fn apply<'a>(&self, announcements: &'a [Announcement]) -> Vec<&'a Announcement> {
        announcements.iter().filter(|a| self.matches(a)).collect()
    }
}

/// Shortens an announcement body for the compact inline card.
///
/// Length is measured on the text with markdown markup removed. If it fits,
/// the original markdown is returned untouched; otherwise the plain text is
/// cut at the last space before `max_length` and `...` is appended.
pub fn truncate_markdown(markdown: &str, max_length: usize) -> String {
    let plain: Vec<char> = strip_markdown(markdown).chars().collect();
    if plain.len() <= max_length {
        return markdown.to_string();
    }

    let cut = plain[..max_length]
        .iter()
        .rposition(|&c| c == ' ')
        .filter(|&i| i > 0)
        .unwrap_or(max_length);

    let mut truncated: String = plain[..cut].iter().collect();
    truncated.push_str("...");
    truncated
}

fn strip_markdown(markdown: &str) -> String {
    let text = unwrap_delimited(markdown, "**", "**");
    let text = unwrap_delimited(&text, "*", "*");
    let text = unwrap_links(&text);
    let text = remove_heading_markers(&text);
    unwrap_delimited(&text, "`", "`")
}

/// Replaces `open inner close` with `inner`, using the nearest closing
/// delimiter on the same line.
fn unwrap_delimited(text: &str, open: &str, close: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(open) {
        let after_open = &rest[start + open.len()..];
        let line_end = after_open.find('\n').unwrap_or(after_open.len());

        match after_open[..line_end].find(close) {
            Some(end) => {
                out.push_str(&rest[..start]);
                out.push_str(&after_open[..end]);
                rest = &after_open[end + close.len()..];
            }
            None => {
                let first_len = open.chars().next().map_or(1, char::len_utf8);
                out.push_str(&rest[..start + first_len]);
                rest = &rest[start + first_len..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Replaces `[label](target)` with `label`.
fn unwrap_links(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('[') {
        let after = &rest[start + 1..];
        let line = &after[..after.find('\n').unwrap_or(after.len())];

        let link = line.find("](").and_then(|label_end| {
            line[label_end + 2..]
                .find(')')
                .map(|target_end| (label_end, label_end + 2 + target_end + 1))
        });

        match link {
            Some((label_end, consumed)) => {
                out.push_str(&rest[..start]);
                out.push_str(&after[..label_end]);
                rest = &after[consumed..];
            }
            None => {
                out.push_str(&rest[..start + 1]);
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Drops runs of one to six `#` that are followed by whitespace.
fn remove_heading_markers(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '#' {
            let run = chars[i..].iter().take_while(|&&c| c == '#').count();
            let followed_by_space = chars.get(i + run).is_some_and(|c| c.is_whitespace());
            if run <= 6 && followed_by_space {
                i += run + 1;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }

    out
}
