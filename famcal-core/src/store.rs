//! Collaborators backed by the hosted backend.
//!
//! The core never talks to the backend directly; it goes through these two
//! traits so that the server can plug in its REST client and tests can use
//! [`crate::memory`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::error::{FamcalError, FamcalResult};
use crate::event::{CalendarEvent, EventDraft, EventPatch};
use crate::linked_calendar::{LinkedCalendar, LinkedCalendarDraft, TokenUpdate};

/// Row filter for [`LocalEventStore::list`]. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    pub id: Option<String>,
    pub family_id: Option<String>,
}

impl EventFilter {
    pub fn by_id(id: &str) -> Self {
        EventFilter {
            id: Some(id.to_string()),
            ..Default::default()
        }
    }

    pub fn by_family(family_id: &str) -> Self {
        EventFilter {
            family_id: Some(family_id.to_string()),
            ..Default::default()
        }
    }

    pub fn matches(&self, event: &CalendarEvent) -> bool {
        self.id.as_ref().is_none_or(|id| &event.id == id)
            && self
                .family_id
                .as_ref()
                .is_none_or(|family| event.family_id.as_ref() == Some(family))
    }
}

/// The family's own event rows. Every failure is `FamcalError::LocalStore`
/// (or `NotFound` for a missing id).
#[async_trait]
pub trait LocalEventStore: Send + Sync {
    async fn list(&self, filter: &EventFilter) -> FamcalResult<Vec<CalendarEvent>>;

    async fn insert(&self, draft: &EventDraft) -> FamcalResult<CalendarEvent>;

    async fn update(&self, id: &str, patch: &EventPatch) -> FamcalResult<CalendarEvent>;

    async fn delete(&self, id: &str) -> FamcalResult<()>;

    /// Events of the family overlapping `[start, end)`.
    async fn list_by_range(
        &self,
        family_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> FamcalResult<Vec<CalendarEvent>>;

    async fn get(&self, id: &str) -> FamcalResult<CalendarEvent> {
        self.list(&EventFilter::by_id(id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| FamcalError::NotFound(format!("event {}", id)))
    }
}

/// Calendars users linked from external providers.
#[async_trait]
pub trait LinkedCalendarRegistry: Send + Sync {
    async fn list_for_user(&self, user_id: &str) -> FamcalResult<Vec<LinkedCalendar>>;

    async fn list_for_family(&self, family_id: &str) -> FamcalResult<Vec<LinkedCalendar>>;

    async fn get(&self, id: &str) -> FamcalResult<LinkedCalendar>;

    /// Write a refreshed access token and its expiry together.
    async fn update_tokens(&self, id: &str, tokens: &TokenUpdate) -> FamcalResult<()>;

    /// Insert, or replace the row with the same user, provider and provider calendar id.
    async fn upsert(&self, draft: &LinkedCalendarDraft) -> FamcalResult<LinkedCalendar>;

    async fn update_color(&self, id: &str, color: &str) -> FamcalResult<LinkedCalendar>;

    async fn remove(&self, id: &str) -> FamcalResult<()>;
}

pub type SharedEventStore = Arc<dyn LocalEventStore>;
pub type SharedCalendarRegistry = Arc<dyn LinkedCalendarRegistry>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::tests::make_event;

    #[test]
    fn test_empty_filter_matches_everything() {
        let event = make_event("a", 9, 10);
        assert!(EventFilter::default().matches(&event));
    }

    #[test]
    fn test_filter_by_family() {
        let mut event = make_event("a", 9, 10);
        assert!(EventFilter::by_family("fam-1").matches(&event));
        assert!(!EventFilter::by_family("fam-2").matches(&event));

        event.family_id = None;
        assert!(!EventFilter::by_family("fam-1").matches(&event));
    }
}
