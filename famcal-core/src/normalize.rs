//! Provider events to canonical events.

use chrono::{DateTime, Utc};

use crate::error::FamcalResult;
use crate::event::{CalendarEvent, EXTERNAL_ID_PREFIX, ExternalMeta};
use crate::linked_calendar::LinkedCalendar;
use crate::provider::{EventStatus, ProviderEvent};
use crate::time::canonical_span;

pub const UNTITLED_EVENT: &str = "Untitled Event";

pub fn external_id(provider_event_id: &str) -> String {
    format!("{}{}", EXTERNAL_ID_PREFIX, provider_event_id)
}

/// Convert one provider event fetched from `calendar`.
///
/// Returns `Ok(None)` for cancelled events. Colour, owner and family come
/// from the linked calendar, never from the provider event.
pub fn normalize_event(
    calendar: &LinkedCalendar,
    event: &ProviderEvent,
    now: DateTime<Utc>,
) -> FamcalResult<Option<CalendarEvent>> {
    if event.status == EventStatus::Cancelled {
        return Ok(None);
    }

    let (start, end) = canonical_span(&event.start, &event.end)?;

    Ok(Some(CalendarEvent {
        id: external_id(&event.id),
        title: event
            .summary
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNTITLED_EVENT.to_string()),
        description: Some(event.description.clone().unwrap_or_default()),
        start,
        end,
        owner_user_id: Some(calendar.user_id.clone()),
        family_id: Some(calendar.family_id.clone()),
        color: calendar.color.clone(),
        linked_calendar_id: Some(calendar.id.clone()),
        external_event_id: Some(event.id.clone()),
        created_at: event.created.unwrap_or(now),
        updated_at: event.updated.unwrap_or(now),
        external: Some(ExternalMeta {
            source: calendar.provider.clone(),
            html_link: event.html_link.clone(),
            read_only: true,
        }),
    }))
}

/// Convert a whole fetch. One malformed event fails the batch.
pub fn normalize_events(
    calendar: &LinkedCalendar,
    events: &[ProviderEvent],
    now: DateTime<Utc>,
) -> FamcalResult<Vec<CalendarEvent>> {
    let mut normalized = Vec::with_capacity(events.len());
    for event in events {
        if let Some(event) = normalize_event(calendar, event, now)? {
            normalized.push(event);
        }
    }
    Ok(normalized)
}
