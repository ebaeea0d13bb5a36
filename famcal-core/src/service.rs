//! The family calendar facade used by the UI layer.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;

use crate::cache::{ViewCache, ViewKey};
use crate::error::FamcalResult;
use crate::event::{CalendarEvent, EventDraft, EventPatch};
use crate::fetcher::{ExternalEventFetcher, HealthMap};
use crate::linked_calendar::{CalendarOption, LinkedCalendar, ProviderTag};
use crate::projection;
use crate::provider::ProviderRegistry;
use crate::reconcile::reconcile;
use crate::router::WriteRouter;
use crate::session::CalendarSessions;
use crate::settings::SyncSettings;
use crate::store::{SharedCalendarRegistry, SharedEventStore};
use crate::sync_status::sync_status;
use crate::time::TimeWindow;

/// Explicitly constructed handle over every collaborator. Clone it freely;
/// clones share caches and health state.
#[derive(Clone)]
pub struct FamilyCalendar {
    store: SharedEventStore,
    calendars: SharedCalendarRegistry,
    fetcher: ExternalEventFetcher,
    views: ViewCache,
    router: WriteRouter,
    settings: SyncSettings,
}

impl FamilyCalendar {
    pub fn new(
        store: SharedEventStore,
        calendars: SharedCalendarRegistry,
        providers: ProviderRegistry,
        settings: SyncSettings,
    ) -> Self {
        let sessions = CalendarSessions::new(providers, calendars.clone());
        let fetcher = ExternalEventFetcher::new(sessions.clone(), &settings);
        let views = ViewCache::new(&settings);
        let router = WriteRouter::new(store.clone(), sessions, fetcher.clone(), views.clone());

        FamilyCalendar {
            store,
            calendars,
            fetcher,
            views,
            router,
            settings,
        }
    }

    /// Current month plus next month, starting from `today`.
    pub fn default_window(today: NaiveDate) -> TimeWindow {
        TimeWindow::default_for(today)
    }

    /// Local and external events of the family in `window`, merged.
    ///
    /// Only local store and registry failures surface; external failures are
    /// reflected in [`FamilyCalendar::health`] instead.
    pub async fn get_reconciled_events(
        &self,
        family_id: &str,
        window: &TimeWindow,
    ) -> FamcalResult<Vec<CalendarEvent>> {
        let linked = self.calendars.list_for_family(family_id).await?;
        let key = ViewKey::new(
            family_id,
            linked.iter().map(|c| c.id.clone()).collect(),
            *window,
        );

        if let Some(cached) = self.views.get(&key) {
            tracing::debug!("Using cached view for family {}", family_id);
            return Ok(cached.as_ref().clone());
        }

        let (local, external) = futures::join!(
            self.store.list_by_range(family_id, window.start, window.end),
            self.fetcher.fetch_all(&linked, window),
        );

        let complete = external.iter().all(|fetched| fetched.complete);
        let merged = reconcile(
            local?,
            external.into_iter().map(|fetched| fetched.events).collect(),
        );
        tracing::debug!(
            "Reconciled {} event(s) for family {} from {} linked calendar(s)",
            merged.len(),
            family_id,
            linked.len()
        );

        // Views missing a failed calendar are never cached
        if !complete {
            tracing::debug!("Not caching partial view for family {}", family_id);
            return Ok(merged);
        }
        Ok(self.views.insert(key, merged).as_ref().clone())
    }

    pub async fn events_on_date(
        &self,
        family_id: &str,
        date: NaiveDate,
    ) -> FamcalResult<Vec<CalendarEvent>> {
        let events = self
            .get_reconciled_events(family_id, &TimeWindow::default_for(date))
            .await?;
        Ok(projection::events_on_date(&events, date))
    }

    pub async fn events_in_range(
        &self,
        family_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> FamcalResult<Vec<CalendarEvent>> {
        let window = TimeWindow::new(start, end)?;
        let events = self.get_reconciled_events(family_id, &window).await?;
        Ok(projection::events_in_range(&events, start, end))
    }

    pub async fn create_event(&self, draft: &EventDraft) -> FamcalResult<CalendarEvent> {
        self.router.create(draft).await
    }

    pub async fn update_event(&self, id: &str, patch: &EventPatch) -> FamcalResult<CalendarEvent> {
        self.router.update(id, patch).await
    }

    pub async fn delete_event(&self, id: &str) -> FamcalResult<()> {
        self.router.delete(id).await
    }

    pub async fn get_sync_status(&self, linked_calendar_ids: &[String]) -> HashMap<String, bool> {
        sync_status(
            &self.fetcher,
            &self.calendars,
            linked_calendar_ids,
            self.settings.probe_hours(),
        )
        .await
    }

    /// Outcome of the last fetch or probe of every linked calendar seen so far.
    pub async fn health(&self) -> HealthMap {
        self.fetcher.health().await
    }

    /// Forget cached external results and views of the family.
    pub async fn refresh(&self, family_id: &str) -> FamcalResult<()> {
        let linked = self.calendars.list_for_family(family_id).await?;
        for calendar in &linked {
            self.fetcher.invalidate_calendar(&calendar.id);
        }
        self.views.invalidate_family(family_id);
        tracing::info!(
            "Refreshing family {} ({} linked calendar(s))",
            family_id,
            linked.len()
        );
        Ok(())
    }

    /// Register every writable calendar of the account behind `authorization_code`.
    pub async fn link_account(
        &self,
        provider: &str,
        authorization_code: &str,
        user_id: &str,
        family_id: &str,
    ) -> FamcalResult<Vec<LinkedCalendar>> {
        let adapter = self
            .fetcher
            .sessions()
            .providers()
            .get(&ProviderTag::from_name(provider))?;
        let drafts = adapter
            .link_account(authorization_code, user_id, family_id)
            .await?;

        let mut linked = Vec::with_capacity(drafts.len());
        for draft in &drafts {
            let calendar = self.calendars.upsert(draft).await?;
            self.fetcher.invalidate_calendar(&calendar.id);
            linked.push(calendar);
        }

        tracing::info!(
            "Linked {} {} calendar(s) for user {}",
            linked.len(),
            provider,
            user_id
        );
        self.views.invalidate_family(family_id);
        Ok(linked)
    }

    /// The family calendar first, then each of the user's linked calendars.
    pub async fn calendar_options(&self, user_id: &str) -> FamcalResult<Vec<CalendarOption>> {
        let mut family = CalendarOption::family();
        family.color = self.settings.family_color.clone();

        let linked = self.calendars.list_for_user(user_id).await?;
        Ok(std::iter::once(family)
            .chain(linked.iter().map(CalendarOption::from))
            .collect())
    }

    pub async fn update_calendar_color(
        &self,
        linked_calendar_id: &str,
        color: &str,
    ) -> FamcalResult<LinkedCalendar> {
        let calendar = self.calendars.update_color(linked_calendar_id, color).await?;
        // Fetched events carry the calendar colour
        self.fetcher.invalidate_calendar(linked_calendar_id);
        self.views.invalidate_family(&calendar.family_id);
        Ok(calendar)
    }

    pub async fn unlink_calendar(&self, linked_calendar_id: &str) -> FamcalResult<()> {
        let calendar = self.calendars.get(linked_calendar_id).await?;
        self.calendars.remove(linked_calendar_id).await?;
        self.fetcher.invalidate_calendar(linked_calendar_id);
        self.views.invalidate_family(&calendar.family_id);
        tracing::info!("Unlinked calendar {} ({})", calendar.id, calendar.name());
        Ok(())
    }
}
