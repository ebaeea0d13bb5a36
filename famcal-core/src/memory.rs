//! In-memory collaborators, used by tests and local development.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{FamcalError, FamcalResult};
use crate::event::{CalendarEvent, EventDraft, EventPatch};
use crate::linked_calendar::{LinkedCalendar, LinkedCalendarDraft, TokenUpdate};
use crate::store::{EventFilter, LinkedCalendarRegistry, LocalEventStore};

#[derive(Debug, Default)]
pub struct MemoryEventStore {
    events: RwLock<Vec<CalendarEvent>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<CalendarEvent>) -> Self {
        MemoryEventStore {
            events: RwLock::new(events),
        }
    }
}

#[async_trait]
impl LocalEventStore for MemoryEventStore {
    async fn list(&self, filter: &EventFilter) -> FamcalResult<Vec<CalendarEvent>> {
        let events = self.events.read().await;
        Ok(events.iter().filter(|e| filter.matches(e)).cloned().collect())
    }

    async fn insert(&self, draft: &EventDraft) -> FamcalResult<CalendarEvent> {
        let now = Utc::now();
        let event = CalendarEvent {
            id: Uuid::new_v4().to_string(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            start: draft.start,
            end: draft.end,
            owner_user_id: draft.owner_user_id.clone(),
            family_id: draft.family_id.clone(),
            color: draft.color.clone(),
            linked_calendar_id: draft.linked_calendar_id.clone(),
            external_event_id: draft.external_event_id.clone(),
            created_at: now,
            updated_at: now,
            external: None,
        };
        self.events.write().await.push(event.clone());
        Ok(event)
    }

    async fn update(&self, id: &str, patch: &EventPatch) -> FamcalResult<CalendarEvent> {
        let mut events = self.events.write().await;
        let existing = events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| FamcalError::NotFound(format!("event {}", id)))?;

        let mut updated = patch.apply_to(existing);
        updated.updated_at = Utc::now();
        *existing = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> FamcalResult<()> {
        let mut events = self.events.write().await;
        let before = events.len();
        events.retain(|e| e.id != id);
        if events.len() == before {
            return Err(FamcalError::NotFound(format!("event {}", id)));
        }
        Ok(())
    }

    async fn list_by_range(
        &self,
        family_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> FamcalResult<Vec<CalendarEvent>> {
        let events = self.events.read().await;
        let mut matching: Vec<CalendarEvent> = events
            .iter()
            .filter(|e| e.family_id.as_deref() == Some(family_id))
            .filter(|e| e.start < end && e.end > start)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.start.cmp(&b.start));
        Ok(matching)
    }
}

#[derive(Debug, Default)]
pub struct MemoryCalendarRegistry {
    calendars: RwLock<Vec<LinkedCalendar>>,
}

impl MemoryCalendarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_calendars(calendars: Vec<LinkedCalendar>) -> Self {
        MemoryCalendarRegistry {
            calendars: RwLock::new(calendars),
        }
    }
}

#[async_trait]
impl LinkedCalendarRegistry for MemoryCalendarRegistry {
    async fn list_for_user(&self, user_id: &str) -> FamcalResult<Vec<LinkedCalendar>> {
        let calendars = self.calendars.read().await;
        Ok(calendars.iter().filter(|c| c.user_id == user_id).cloned().collect())
    }

    async fn list_for_family(&self, family_id: &str) -> FamcalResult<Vec<LinkedCalendar>> {
        let calendars = self.calendars.read().await;
        Ok(calendars
            .iter()
            .filter(|c| c.family_id == family_id)
            .cloned()
            .collect())
    }

    async fn get(&self, id: &str) -> FamcalResult<LinkedCalendar> {
        let calendars = self.calendars.read().await;
        calendars
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| FamcalError::NotFound(format!("linked calendar {}", id)))
    }

    async fn update_tokens(&self, id: &str, tokens: &TokenUpdate) -> FamcalResult<()> {
        let mut calendars = self.calendars.write().await;
        let calendar = calendars
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| FamcalError::NotFound(format!("linked calendar {}", id)))?;
        *calendar = calendar.with_tokens(tokens);
        Ok(())
    }

    async fn upsert(&self, draft: &LinkedCalendarDraft) -> FamcalResult<LinkedCalendar> {
        let mut calendars = self.calendars.write().await;
        let existing = calendars.iter_mut().find(|c| {
            c.user_id == draft.user_id
                && c.provider == draft.provider
                && c.provider_calendar_id == draft.provider_calendar_id
        });

        match existing {
            Some(calendar) => {
                *calendar = draft.clone().into_calendar(calendar.id.clone());
                Ok(calendar.clone())
            }
            None => {
                let calendar = draft.clone().into_calendar(Uuid::new_v4().to_string());
                calendars.push(calendar.clone());
                Ok(calendar)
            }
        }
    }

    async fn update_color(&self, id: &str, color: &str) -> FamcalResult<LinkedCalendar> {
        let mut calendars = self.calendars.write().await;
        let calendar = calendars
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| FamcalError::NotFound(format!("linked calendar {}", id)))?;
        calendar.color = color.to_string();
        Ok(calendar.clone())
    }

    async fn remove(&self, id: &str) -> FamcalResult<()> {
        let mut calendars = self.calendars.write().await;
        let before = calendars.len();
        calendars.retain(|c| c.id != id);
        if calendars.len() == before {
            return Err(FamcalError::NotFound(format!("linked calendar {}", id)));
        }
        Ok(())
    }
}
