//! Routing of event mutations to the local store and linked calendars.
//!
//! The local store is the system of record. Creates in a linked calendar must
//! succeed upstream before the mirror row is written; updates and deletes of
//! mirrored events always land locally, even when the provider is down.

use crate::cache::ViewCache;
use crate::error::{FamcalError, FamcalResult};
use crate::event::{CalendarEvent, EventDraft, EventPatch, is_external_id};
use crate::fetcher::ExternalEventFetcher;
use crate::session::CalendarSessions;
use crate::store::SharedEventStore;

#[derive(Clone)]
pub struct WriteRouter {
    store: SharedEventStore,
    sessions: CalendarSessions,
    fetcher: ExternalEventFetcher,
    views: ViewCache,
}

impl WriteRouter {
    pub fn new(
        store: SharedEventStore,
        sessions: CalendarSessions,
        fetcher: ExternalEventFetcher,
        views: ViewCache,
    ) -> Self {
        WriteRouter {
            store,
            sessions,
            fetcher,
            views,
        }
    }

    pub async fn create(&self, draft: &EventDraft) -> FamcalResult<CalendarEvent> {
        draft.validate()?;

        let event = match &draft.linked_calendar_id {
            None => self.store.insert(draft).await?,
            Some(linked_calendar_id) => self.create_external(linked_calendar_id, draft).await?,
        };

        tracing::info!("Created event {} ({})", event.id, event.title);
        self.invalidate_views(event.family_id.as_deref());
        Ok(event)
    }

    pub async fn update(&self, id: &str, patch: &EventPatch) -> FamcalResult<CalendarEvent> {
        reject_read_only(id)?;

        let current = self.store.get(id).await?;
        if patch.is_empty() {
            return Ok(current);
        }

        let patched = patch.apply_to(&current);
        patched.validate()?;

        if current.mirrors_external() {
            self.absorb_external_failure(&current, self.update_external(&current, &patched).await)?;
        }

        let updated = self.store.update(id, patch).await?;
        tracing::info!("Updated event {}", id);
        self.invalidate_views(updated.family_id.as_deref());
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> FamcalResult<()> {
        reject_read_only(id)?;

        let current = self.store.get(id).await?;
        if current.mirrors_external() {
            self.absorb_external_failure(&current, self.delete_external(&current).await)?;
        }

        self.store.delete(id).await?;
        tracing::info!("Deleted event {}", id);
        self.invalidate_views(current.family_id.as_deref());
        Ok(())
    }

    async fn create_external(
        &self,
        linked_calendar_id: &str,
        draft: &EventDraft,
    ) -> FamcalResult<CalendarEvent> {
        let session = self.sessions.open_by_id(linked_calendar_id).await?;
        let created = session
            .adapter
            .create_event(&session.calendar, &session.access_token, draft)
            .await?;

        let mut mirror = draft.clone();
        mirror.external_event_id = Some(created.id);
        if mirror.family_id.is_none() {
            mirror.family_id = Some(session.calendar.family_id.clone());
        }
        if mirror.owner_user_id.is_none() {
            mirror.owner_user_id = Some(session.calendar.user_id.clone());
        }

        let event = self.store.insert(&mirror).await?;
        self.fetcher.invalidate_calendar(linked_calendar_id);
        Ok(event)
    }

    async fn update_external(
        &self,
        current: &CalendarEvent,
        patched: &CalendarEvent,
    ) -> FamcalResult<()> {
        let (linked_calendar_id, external_event_id) = mirror_ids(current)?;
        let session = self.sessions.open_by_id(linked_calendar_id).await?;
        session
            .adapter
            .update_event(&session.calendar, &session.access_token, external_event_id, patched)
            .await?;
        self.fetcher.invalidate_calendar(linked_calendar_id);
        Ok(())
    }

    async fn delete_external(&self, current: &CalendarEvent) -> FamcalResult<()> {
        let (linked_calendar_id, external_event_id) = mirror_ids(current)?;
        let session = self.sessions.open_by_id(linked_calendar_id).await?;
        session
            .adapter
            .delete_event(&session.calendar, &session.access_token, external_event_id)
            .await?;
        self.fetcher.invalidate_calendar(linked_calendar_id);
        Ok(())
    }

    /// Provider-side failures are logged and dropped; local store failures are not.
    fn absorb_external_failure(
        &self,
        event: &CalendarEvent,
        result: FamcalResult<()>,
    ) -> FamcalResult<()> {
        match result {
            Ok(()) => Ok(()),
            Err(e @ FamcalError::LocalStore(_)) => Err(e),
            Err(e) => {
                tracing::warn!(
                    "External write for event {} failed, keeping local change: {}",
                    event.id,
                    e
                );
                Ok(())
            }
        }
    }

    fn invalidate_views(&self, family_id: Option<&str>) {
        match family_id {
            Some(family_id) => self.views.invalidate_family(family_id),
            None => self.views.invalidate_all(),
        }
    }
}

fn reject_read_only(id: &str) -> FamcalResult<()> {
    if is_external_id(id) {
        return Err(FamcalError::ReadOnlyEvent(id.to_string()));
    }
    Ok(())
}

fn mirror_ids(event: &CalendarEvent) -> FamcalResult<(&str, &str)> {
    match (&event.linked_calendar_id, &event.external_event_id) {
        (Some(linked), Some(external)) => Ok((linked.as_str(), external.as_str())),
        _ => Err(FamcalError::InvalidEvent(format!(
            "event {} does not mirror an external event",
            event.id
        ))),
    }
}
