//! Canonical event shapes.
//!
//! Local rows, provider events and the reconciled collection all use
//! [`CalendarEvent`]. Events fetched from a linked calendar additionally
//! carry [`ExternalMeta`], which is never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FamcalError, FamcalResult};
use crate::linked_calendar::ProviderTag;

/// Colour used when neither the event nor its calendar provides one.
pub const DEFAULT_COLOR: &str = "#007AFF";

/// Namespace for ids synthesized from provider event ids.
pub const EXTERNAL_ID_PREFIX: &str = "external_";

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

/// A calendar event in canonical form (UTC instants, `end > start`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "start_date")]
    pub start: DateTime<Utc>,
    #[serde(rename = "end_date")]
    pub end: DateTime<Utc>,
    #[serde(rename = "user_id", default)]
    pub owner_user_id: Option<String>,
    #[serde(default)]
    pub family_id: Option<String>,
    #[serde(default = "default_color")]
    pub color: String,
    /// `None` for family events, set for events living in a linked calendar.
    #[serde(default)]
    pub linked_calendar_id: Option<String>,
    /// Provider event id, set for events created in or mirroring an external calendar.
    #[serde(default)]
    pub external_event_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Transient metadata, present only on events fetched from a provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<ExternalMeta>,
}

/// Metadata carried by events that came straight from a provider fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalMeta {
    pub source: ProviderTag,
    #[serde(default)]
    pub html_link: Option<String>,
    /// True for events this app did not create through its write path.
    pub read_only: bool,
}

impl CalendarEvent {
    pub fn is_external(&self) -> bool {
        self.external.is_some()
    }

    pub fn is_read_only(&self) -> bool {
        self.external.as_ref().is_some_and(|meta| meta.read_only)
    }

    /// Link to the event in the provider's own UI, if known.
    pub fn external_link(&self) -> Option<&str> {
        self.external.as_ref()?.html_link.as_deref()
    }

    /// Whether this event is (or mirrors) an event in a linked calendar.
    pub fn mirrors_external(&self) -> bool {
        self.external_event_id.is_some() && self.linked_calendar_id.is_some()
    }

    pub fn validate(&self) -> FamcalResult<()> {
        if self.id.is_empty() {
            return Err(FamcalError::InvalidEvent("event has an empty id".into()));
        }
        validate_span(&self.title, self.start, self.end)
    }
}

/// Returns true if the id lives in the synthesized external namespace.
pub fn is_external_id(id: &str) -> bool {
    id.starts_with(EXTERNAL_ID_PREFIX)
}

fn validate_span(title: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> FamcalResult<()> {
    if end <= start {
        return Err(FamcalError::InvalidEvent(format!(
            "'{}' ends ({}) before it starts ({})",
            title,
            end.to_rfc3339(),
            start.to_rfc3339()
        )));
    }
    Ok(())
}

/// A new event as submitted by the UI (no id, no timestamps).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "start_date")]
    pub start: DateTime<Utc>,
    #[serde(rename = "end_date")]
    pub end: DateTime<Utc>,
    #[serde(rename = "user_id", default)]
    pub owner_user_id: Option<String>,
    #[serde(default)]
    pub family_id: Option<String>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub linked_calendar_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_event_id: Option<String>,
}

impl EventDraft {
    pub fn new(title: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        EventDraft {
            title: title.into(),
            description: None,
            start,
            end,
            owner_user_id: None,
            family_id: None,
            color: default_color(),
            linked_calendar_id: None,
            external_event_id: None,
        }
    }

    pub fn validate(&self) -> FamcalResult<()> {
        if self.title.trim().is_empty() {
            return Err(FamcalError::InvalidEvent("title must not be empty".into()));
        }
        validate_span(&self.title, self.start, self.end)
    }
}

/// A partial update. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        rename = "start_date",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub start: Option<DateTime<Utc>>,
    #[serde(rename = "end_date", default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.start.is_none()
            && self.end.is_none()
            && self.color.is_none()
    }

    /// The event as it would look after this patch (timestamps untouched).
    pub fn apply_to(&self, event: &CalendarEvent) -> CalendarEvent {
        let mut patched = event.clone();
        if let Some(title) = &self.title {
            patched.title = title.clone();
        }
        if let Some(description) = &self.description {
            patched.description = Some(description.clone());
        }
        if let Some(start) = self.start {
            patched.start = start;
        }
        if let Some(end) = self.end {
            patched.end = end;
        }
        if let Some(color) = &self.color {
            patched.color = color.clone();
        }
        patched
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub fn make_event(id: &str, start_hour: u32, end_hour: u32) -> CalendarEvent {
        CalendarEvent {
            id: id.to_string(),
            title: format!("Event {}", id),
            description: None,
            start: Utc.with_ymd_and_hms(2025, 3, 20, start_hour, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 3, 20, end_hour, 0, 0).unwrap(),
            owner_user_id: None,
            family_id: Some("fam-1".to_string()),
            color: DEFAULT_COLOR.to_string(),
            linked_calendar_id: None,
            external_event_id: None,
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
            external: None,
        }
    }

    #[test]
    fn test_patch_only_touches_set_fields() {
        let event = make_event("a", 9, 10);
        let patch = EventPatch {
            title: Some("Dentist".to_string()),
            ..Default::default()
        };

        let patched = patch.apply_to(&event);

        assert_eq!(patched.title, "Dentist");
        assert_eq!(patched.start, event.start);
        assert_eq!(patched.end, event.end);
        assert_eq!(patched.color, event.color);
    }

    #[test]
    fn test_validate_rejects_inverted_span() {
        let mut event = make_event("a", 9, 10);
        event.end = event.start;
        assert!(matches!(event.validate(), Err(FamcalError::InvalidEvent(_))));
    }

    #[test]
    fn test_row_shape_uses_backend_column_names() {
        let event = make_event("a", 9, 10);
        let json = serde_json::to_value(&event).unwrap();

        assert!(json.get("start_date").is_some());
        assert!(json.get("end_date").is_some());
        assert!(json.get("user_id").is_some());
        // Local events carry no transient metadata
        assert!(json.get("external").is_none());
    }

    #[test]
    fn test_missing_color_defaults() {
        let json = serde_json::json!({
            "id": "a",
            "title": "Swim",
            "start_date": "2025-03-20T09:00:00Z",
            "end_date": "2025-03-20T10:00:00Z",
            "created_at": "2025-03-01T00:00:00Z",
            "updated_at": "2025-03-01T00:00:00Z"
        });
        let event: CalendarEvent = serde_json::from_value(json).unwrap();
        assert_eq!(event.color, DEFAULT_COLOR);
        assert!(event.linked_calendar_id.is_none());
    }

    #[test]
    fn test_external_namespace() {
        assert!(is_external_id("external_abc"));
        assert!(!is_external_id("4f9c"));
    }
}
