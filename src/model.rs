use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};

/// A user-authored note. `content` is an opaque serialized document payload;
/// nothing in this crate ever parses it.
///
/// Serialized with camelCase field names so collections written by earlier
/// builds of the extension deserialize unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    /// Epoch milliseconds, set once at creation.
    pub created_at: i64,
    /// Epoch milliseconds, refreshed on every title or content mutation.
    pub updated_at: i64,
}

impl Note {
    /// Build a fresh note with empty content and both timestamps stamped
    /// from the same instant. Without a title, the creation time (formatted
    /// for the local timezone) is used.
    pub fn new(title: Option<&str>) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: generate_note_id(now),
            title: match title {
                Some(t) => t.to_string(),
                None => format_creation_time(now),
            },
            content: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

static MAX_ID_MS: AtomicI64 = AtomicI64::new(0);
static ID_SEQ: AtomicU32 = AtomicU32::new(0);

/// Time-based note id, kept in the `note_<epoch-ms>` shape older persisted
/// collections already use. Any timestamp at or below the maximum already
/// issued counts as a collision and gets a counter suffix: rapid creation
/// within one millisecond, but also a clock stepped backwards (NTP) that
/// would otherwise replay an issued millisecond. The counter never resets,
/// so a (timestamp, suffix) pair cannot repeat within a process either.
fn generate_note_id(now_ms: i64) -> String {
    let max_seen = MAX_ID_MS.fetch_max(now_ms, Ordering::Relaxed);
    if now_ms <= max_seen {
        let seq = ID_SEQ.fetch_add(1, Ordering::Relaxed) + 1;
        format!("note_{}-{}", now_ms, seq)
    } else {
        format!("note_{}", now_ms)
    }
}

/// Default title: the creation instant formatted in the local timezone,
/// e.g. "2026. 8. 23. 14:05:09".
fn format_creation_time(ms: i64) -> String {
    match Local.timestamp_millis_opt(ms).single() {
        Some(t) => t.format("%Y. %-m. %-d. %H:%M:%S").to_string(),
        None => ms.to_string(),
    }
}

/// Panel color scheme, persisted under the `theme` config key as
/// `"dark"`/`"light"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    /// Parse a persisted theme value; anything unrecognized falls back to
    /// the default.
    pub fn parse(value: &str) -> Self {
        match value {
            "light" => Theme::Light,
            _ => Theme::Dark,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_note_stamps_both_timestamps_from_one_instant() {
        let note = Note::new(Some("hello"));
        assert_eq!(note.created_at, note.updated_at);
        assert!(note.content.is_empty());
        assert_eq!(note.title, "hello");
    }

    #[test]
    fn default_title_is_nonempty() {
        let note = Note::new(None);
        assert!(!note.title.is_empty());
    }

    #[test]
    fn ids_are_unique_within_one_millisecond() {
        let ms = 1_700_000_000_000;
        let a = generate_note_id(ms);
        let b = generate_note_id(ms);
        let c = generate_note_id(ms);
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
        assert!(a.starts_with("note_1700000000000"));
    }

    #[test]
    fn ids_stay_unique_when_the_clock_steps_backwards() {
        // A backwards clock step followed by a replay of an already-issued
        // millisecond must not re-issue an id.
        let ids = [
            generate_note_id(2_000),
            generate_note_id(2_000),
            generate_note_id(2_001),
            generate_note_id(1_500),
            generate_note_id(2_000),
        ];
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn note_serializes_with_camel_case_timestamps() {
        let note = Note {
            id: "note_1".into(),
            title: "t".into(),
            content: "c".into(),
            created_at: 1,
            updated_at: 2,
        };
        let json = serde_json::to_string(&note).unwrap();
        assert!(json.contains("\"createdAt\":1"));
        assert!(json.contains("\"updatedAt\":2"));
    }

    #[test]
    fn theme_round_trips_as_lowercase_string() {
        assert_eq!(Theme::parse(Theme::Light.as_str()), Theme::Light);
        assert_eq!(Theme::parse("garbage"), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
    }
}
