use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

/// Parsed client-local dismissal log: announcement id -> time of dismissal.
///
/// The persisted form is a JSON object of id to RFC 3339 timestamp strings.
/// Parsing never fails: unreadable content yields an empty log and individual
/// entries that are not valid timestamps are skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DismissalLog {
    entries: HashMap<String, DateTime<Utc>>,
}

impl DismissalLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(raw: &str) -> Self {
        Self::try_parse(raw).unwrap_or_default()
    }

    /// Like [`DismissalLog::parse`] but reports whether the content was a JSON
    /// object at all. Blank content counts as an empty, valid log.
    pub fn try_parse(raw: &str) -> Option<Self> {
        if raw.trim().is_empty() {
            return Some(Self::new());
        }

        let object = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(object)) => object,
            Ok(_) => return None,
            Err(e) => {
                tracing::debug!("Dismissal log is not valid JSON: {}", e);
                return None;
            }
        };

        let entries = object
            .into_iter()
            .filter_map(|(id, value)| {
                let dismissed_at = value
                    .as_str()
                    .and_then(|s| DateTime::parse_from_rfc3339(s).ok())?
                    .with_timezone(&Utc);
                Some((id, dismissed_at))
            })
            .collect();

        Some(Self { entries })
    }

    pub fn get(&self, announcement_id: &str) -> Option<DateTime<Utc>> {
        self.entries.get(announcement_id).copied()
    }

    pub fn record(&mut self, announcement_id: &str, dismissed_at: DateTime<Utc>) {
        self.entries.insert(announcement_id.to_string(), dismissed_at);
    }

    /// Drops entries that no longer hide anything at `now`.
    pub fn prune_expired(&mut self, now: DateTime<Utc>, window: Duration) {
        self.entries.retain(|_, dismissed_at| now - *dismissed_at < window);
    }

    /// Keeps only the `max_entries` most recent dismissals.
    pub fn retain_newest(&mut self, max_entries: usize) {
        if self.entries.len() <= max_entries {
            return;
        }
        if max_entries == 0 {
            self.entries.clear();
            return;
        }

        let mut times: Vec<DateTime<Utc>> = self.entries.values().copied().collect();
        times.sort_unstable_by(|a, b| b.cmp(a));
        let cutoff = times[max_entries - 1];

        // Equal timestamps at the cutoff may still leave too many; break ties by id.
        let mut kept: Vec<(String, DateTime<Utc>)> = self
            .entries
            .drain()
            .filter(|(_, at)| *at >= cutoff)
            .collect();
        kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        kept.truncate(max_entries);
        self.entries = kept.into_iter().collect();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> String {
        let object: serde_json::Map<String, Value> = self
            .entries
            .iter()
            .map(|(id, at)| (id.clone(), Value::String(at.to_rfc3339())))
            .collect();
        Value::Object(object).to_string()
    }
}
