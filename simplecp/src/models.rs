//! Core data model for SimpleCP
//!
//! An [`Item`] is one clipboard capture or snippet. Identity is the `id`;
//! `id` and `timestamp` never change once the item exists.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use crate::content_detection::detect_content_type;
use crate::interface::{ContentType, SnippetUpdate};

/// Marker shown for empty or whitespace-only content
pub const EMPTY_DISPLAY: &str = "(empty)";

/// Default width of a one-line preview
pub const DEFAULT_DISPLAY_LENGTH: usize = 50;

const ELLIPSIS: &str = "...";

// ─────────────────────────────────────────────────────────────────────────────
// ITEM
// ─────────────────────────────────────────────────────────────────────────────

/// A clipboard capture or a named snippet
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "ItemRecord")]
pub struct Item {
    #[serde(rename = "clip_id")]
    id: String,
    content: String,
    content_type: ContentType,
    timestamp: DateTime<Utc>,
    source_app: Option<String>,
    tags: BTreeSet<String>,
    name: Option<String>,
}

impl Item {
    /// Create a new item; id, timestamp and content type are generated
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            id: new_item_id(),
            content_type: detect_content_type(&content),
            content,
            timestamp: Utc::now(),
            source_app: None,
            tags: BTreeSet::new(),
            name: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Override the inferred content type
    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_source_app(mut self, source_app: impl Into<String>) -> Self {
        self.source_app = Some(source_app.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn source_app(&self) -> Option<&str> {
        self.source_app.as_deref()
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// A named item is a snippet; unnamed items are plain history entries
    pub fn has_name(&self) -> bool {
        self.name.is_some()
    }

    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// One-line preview, at most `max_len` characters including the ellipsis
    pub fn display(&self, max_len: usize) -> String {
        if self.is_blank() {
            return EMPTY_DISPLAY.to_string();
        }
        truncate_with_ellipsis(&collapse_lines(&self.content), max_len)
    }

    pub fn display_string(&self) -> String {
        self.display(DEFAULT_DISPLAY_LENGTH)
    }

    /// Case-insensitive substring match; `needle` must already be lowercase
    pub(crate) fn content_contains(&self, needle: &str) -> bool {
        self.content.to_lowercase().contains(needle)
    }

    pub(crate) fn name_contains(&self, needle: &str) -> bool {
        self.name
            .as_deref()
            .map(|n| n.to_lowercase().contains(needle))
            .unwrap_or(false)
    }

    /// A fresh snippet carrying this item's content; the original is untouched
    pub(crate) fn to_snippet(&self, name: impl Into<String>, tags: Vec<String>) -> Item {
        let mut snippet = Item::new(self.content.clone())
            .with_content_type(self.content_type)
            .with_name(name)
            .with_tags(tags);
        snippet.source_app = self.source_app.clone();
        snippet
    }

    /// Apply a partial update. Blank content must be rejected by the caller.
    pub(crate) fn apply_update(&mut self, update: SnippetUpdate) {
        if let Some(content) = update.content {
            self.content_type = detect_content_type(&content);
            self.content = content;
        }
        if let Some(name) = update.name {
            self.name = Some(name);
        }
        if let Some(tags) = update.tags {
            self.tags = tags.into_iter().collect();
        }
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Item {}

impl Hash for Item {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

fn new_item_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ─────────────────────────────────────────────────────────────────────────────
// ON-DISK RECORD
// ─────────────────────────────────────────────────────────────────────────────

/// Lenient on-disk shape; every field except `content` may be missing
#[derive(Deserialize)]
struct ItemRecord {
    #[serde(alias = "id")]
    clip_id: Option<String>,
    content: String,
    #[serde(default)]
    content_type: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    source_app: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default, alias = "snippet_name")]
    name: Option<String>,
}

impl From<ItemRecord> for Item {
    fn from(record: ItemRecord) -> Self {
        let content_type = record
            .content_type
            .as_deref()
            .and_then(parse_content_type)
            .unwrap_or_else(|| detect_content_type(&record.content));
        Self {
            id: record.clip_id.unwrap_or_else(new_item_id),
            content_type,
            timestamp: record
                .timestamp
                .as_deref()
                .map(parse_timestamp)
                .unwrap_or_else(Utc::now),
            content: record.content,
            source_app: record.source_app,
            tags: record.tags.into_iter().collect(),
            name: record.name,
        }
    }
}

fn parse_content_type(value: &str) -> Option<ContentType> {
    match value {
        "text" => Some(ContentType::Text),
        "url" => Some(ContentType::Url),
        "code" => Some(ContentType::Code),
        "json" => Some(ContentType::Json),
        _ => None,
    }
}

/// Parse an ISO-8601 timestamp; naive values are taken as UTC
fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
                .map(|dt| Utc.from_utc_datetime(&dt))
        })
        .unwrap_or_else(|_| {
            log::warn!("Unparsable timestamp '{}', using current time", value);
            Utc::now()
        })
}

// ─────────────────────────────────────────────────────────────────────────────
// TEXT NORMALIZATION
// ─────────────────────────────────────────────────────────────────────────────

/// Join non-empty lines with single spaces
fn collapse_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate_with_ellipsis(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    if max_len <= ELLIPSIS.len() {
        return ELLIPSIS[..max_len].to_string();
    }
    let mut result: String = text.chars().take(max_len - ELLIPSIS.len()).collect();
    result.push_str(ELLIPSIS);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_item_defaults() {
        let item = Item::new("Test content").with_source_app("pytest");
        assert_eq!(item.content(), "Test content");
        assert_eq!(item.content_type(), ContentType::Text);
        assert_eq!(item.source_app(), Some("pytest"));
        assert!(!item.id().is_empty());
        assert!(!item.has_name());
    }

    #[test]
    fn test_item_with_name() {
        let item = Item::new("Test content").with_name("My Snippet");
        assert!(item.has_name());
        assert_eq!(item.name(), Some("My Snippet"));
    }

    #[test]
    fn test_display_truncation() {
        let item = Item::new("a".repeat(100));
        let display = item.display(50);
        assert_eq!(display.chars().count(), 50);
        assert!(display.ends_with("..."));
    }

    #[test]
    fn test_display_short_content_untouched() {
        let item = Item::new("short");
        assert_eq!(item.display(50), "short");
    }

    #[test]
    fn test_display_multiline() {
        let item = Item::new("Line 1\nLine 2\r\nLine 3");
        let display = item.display_string();
        assert!(!display.contains('\n'));
        assert_eq!(display, "Line 1 Line 2 Line 3");
    }

    #[test]
    fn test_display_empty_and_whitespace() {
        assert_eq!(Item::new("").display_string(), EMPTY_DISPLAY);
        assert_eq!(Item::new("   \n\t   ").display(10), EMPTY_DISPLAY);
    }

    #[test]
    fn test_equality_by_id() {
        let a = Item::new("Test").with_id("same-id");
        let b = Item::new("Different").with_id("same-id");
        assert_eq!(a, b);
        assert_ne!(Item::new("Test"), Item::new("Test"));
    }

    #[test]
    fn test_content_type_inference() {
        assert_eq!(Item::new("https://example.com").content_type(), ContentType::Url);
        assert_eq!(Item::new("def hello():\n    pass").content_type(), ContentType::Code);
        assert_eq!(
            Item::new(r#"{"key": "value", "number": 42}"#).content_type(),
            ContentType::Json
        );
        let forced = Item::new("plain").with_content_type(ContentType::Code);
        assert_eq!(forced.content_type(), ContentType::Code);
    }

    #[test]
    fn test_tags_are_a_set() {
        let item = Item::new("Test").with_tags(["work", "important", "work"]);
        assert_eq!(item.tags().len(), 2);
        assert!(item.tags().contains("important"));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let item = Item::new("fn main() {}")
            .with_source_app("editor")
            .with_name("entry point")
            .with_tags(["rust"]);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["clip_id"], item.id());
        assert_eq!(json["content_type"], "code");
        assert!(json["timestamp"].is_string());

        let back: Item = serde_json::from_value(json).unwrap();
        assert_eq!(back.id(), item.id());
        assert_eq!(back.content(), item.content());
        assert_eq!(back.content_type(), item.content_type());
        assert_eq!(back.timestamp(), item.timestamp());
        assert_eq!(back.source_app(), item.source_app());
        assert_eq!(back.tags(), item.tags());
        assert_eq!(back.name(), item.name());
    }

    #[test]
    fn test_deserialize_legacy_record() {
        let json = r#"{
            "clip_id": "test-123",
            "content": "Test content",
            "timestamp": "2025-01-01T00:00:00",
            "content_type": "text",
            "snippet_name": "old",
            "future_field": true
        }"#;
        let item: Item = serde_json::from_str(json).unwrap();
        assert_eq!(item.id(), "test-123");
        assert_eq!(item.name(), Some("old"));
        assert_eq!(item.timestamp().to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_deserialize_infers_missing_fields() {
        let item: Item = serde_json::from_str(r#"{"content": "https://a.b"}"#).unwrap();
        assert!(!item.id().is_empty());
        assert_eq!(item.content_type(), ContentType::Url);

        let unknown: Item =
            serde_json::from_str(r#"{"content": "x", "content_type": "image"}"#).unwrap();
        assert_eq!(unknown.content_type(), ContentType::Text);
    }

    #[test]
    fn test_to_snippet_copies_content_with_new_identity() {
        let clip = Item::new("copy me").with_source_app("term");
        let snippet = clip.to_snippet("Note", vec!["t".to_string()]);
        assert_ne!(snippet.id(), clip.id());
        assert_eq!(snippet.content(), "copy me");
        assert_eq!(snippet.name(), Some("Note"));
        assert_eq!(snippet.source_app(), Some("term"));
    }

    #[test]
    fn test_apply_update_keeps_identity() {
        let mut item = Item::new("old").with_name("n");
        let id = item.id().to_string();
        let ts = item.timestamp();
        item.apply_update(SnippetUpdate {
            content: Some("https://new.example".to_string()),
            name: None,
            tags: Some(vec!["a".to_string()]),
        });
        assert_eq!(item.id(), id);
        assert_eq!(item.timestamp(), ts);
        assert_eq!(item.content(), "https://new.example");
        assert_eq!(item.content_type(), ContentType::Url);
        assert_eq!(item.name(), Some("n"));
        assert!(item.tags().contains("a"));
    }
}
