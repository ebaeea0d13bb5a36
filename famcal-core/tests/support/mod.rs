#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use famcal_core::event::{CalendarEvent, EventDraft, EventPatch};
use famcal_core::memory::{MemoryCalendarRegistry, MemoryEventStore};
use famcal_core::provider::{EventStatus, ProviderAdapter, ProviderEvent, ProviderRegistry};
use famcal_core::store::{EventFilter, LocalEventStore};
use famcal_core::time::{EventTime, TimeWindow};
use famcal_core::{
    FamcalError, FamcalResult, FamilyCalendar, LinkedCalendar, LinkedCalendarDraft, ProviderTag,
    SyncSettings, TokenUpdate,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const FAMILY: &str = "fam-1";

pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap()
}

pub fn march() -> TimeWindow {
    TimeWindow::default_for(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap())
}

pub fn linked(id: &str) -> LinkedCalendar {
    LinkedCalendar {
        id: id.to_string(),
        user_id: "user-1".to_string(),
        family_id: FAMILY.to_string(),
        provider: ProviderTag::from_name("fake"),
        account_email: "parent@example.com".to_string(),
        provider_calendar_id: format!("{}-remote", id),
        display_name: Some(format!("Calendar {}", id)),
        color: "#33B679".to_string(),
        access_token: "access".to_string(),
        refresh_token: Some("refresh".to_string()),
        expires_at: Utc::now() + Duration::hours(1),
    }
}

pub fn remote_event(id: &str, title: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> ProviderEvent {
    ProviderEvent {
        id: id.to_string(),
        summary: Some(title.to_string()),
        description: None,
        start: EventTime::DateTime(start),
        end: EventTime::DateTime(end),
        status: EventStatus::Confirmed,
        html_link: None,
        created: None,
        updated: None,
    }
}

pub fn local_draft(title: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> EventDraft {
    let mut draft = EventDraft::new(title, start, end);
    draft.family_id = Some(FAMILY.to_string());
    draft
}

/// A scriptable provider keyed by provider calendar id.
#[derive(Default)]
pub struct FakeProvider {
    events: Mutex<HashMap<String, Vec<ProviderEvent>>>,
    fetch_failures: Mutex<HashMap<String, (FamcalError, usize)>>,
    write_failure: Mutex<Option<FamcalError>>,
    refreshed: Mutex<Option<TokenUpdate>>,
    linkable: Mutex<Vec<LinkedCalendarDraft>>,
    pub fetch_calls: AtomicUsize,
    pub write_calls: AtomicUsize,
    next_id: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_events(&self, calendar: &LinkedCalendar, events: Vec<ProviderEvent>) {
        self.events
            .lock()
            .unwrap()
            .insert(calendar.provider_calendar_id.clone(), events);
    }

    /// Fail the next `times` fetches of `calendar` with `error`.
    pub fn fail_fetches(&self, calendar: &LinkedCalendar, error: FamcalError, times: usize) {
        self.fetch_failures
            .lock()
            .unwrap()
            .insert(calendar.provider_calendar_id.clone(), (error, times));
    }

    pub fn fail_writes(&self, error: FamcalError) {
        *self.write_failure.lock().unwrap() = Some(error);
    }

    pub fn refresh_with(&self, tokens: TokenUpdate) {
        *self.refreshed.lock().unwrap() = Some(tokens);
    }

    pub fn offer_for_linking(&self, drafts: Vec<LinkedCalendarDraft>) {
        *self.linkable.lock().unwrap() = drafts;
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    fn check_write(&self) -> FamcalResult<()> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        match self.write_failure.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ProviderAdapter for FakeProvider {
    fn tag(&self) -> ProviderTag {
        ProviderTag::from_name("fake")
    }

    async fn refresh_token(&self, _calendar: &LinkedCalendar) -> FamcalResult<TokenUpdate> {
        self.refreshed
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| FamcalError::AuthExpired("refresh rejected".into()))
    }

    async fn fetch_events(
        &self,
        calendar: &LinkedCalendar,
        _access_token: &str,
        _window: &TimeWindow,
    ) -> FamcalResult<Vec<ProviderEvent>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        let mut failures = self.fetch_failures.lock().unwrap();
        if let Some((error, remaining)) = failures.get_mut(&calendar.provider_calendar_id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(error.clone());
            }
        }

        Ok(self
            .events
            .lock()
            .unwrap()
            .get(&calendar.provider_calendar_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_event(
        &self,
        calendar: &LinkedCalendar,
        _access_token: &str,
        draft: &EventDraft,
    ) -> FamcalResult<ProviderEvent> {
        self.check_write()?;
        let id = format!("remote-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let created = remote_event(&id, &draft.title, draft.start, draft.end);
        self.events
            .lock()
            .unwrap()
            .entry(calendar.provider_calendar_id.clone())
            .or_default()
            .push(created.clone());
        Ok(created)
    }

    async fn update_event(
        &self,
        _calendar: &LinkedCalendar,
        _access_token: &str,
        external_event_id: &str,
        event: &CalendarEvent,
    ) -> FamcalResult<ProviderEvent> {
        self.check_write()?;
        Ok(remote_event(external_event_id, &event.title, event.start, event.end))
    }

    async fn delete_event(
        &self,
        _calendar: &LinkedCalendar,
        _access_token: &str,
        _external_event_id: &str,
    ) -> FamcalResult<()> {
        self.check_write()
    }

    async fn link_account(
        &self,
        authorization_code: &str,
        _user_id: &str,
        _family_id: &str,
    ) -> FamcalResult<Vec<LinkedCalendarDraft>> {
        if authorization_code != "good-code" {
            return Err(FamcalError::AuthExpired("invalid_grant".into()));
        }
        Ok(self.linkable.lock().unwrap().clone())
    }
}

/// Event store whose every call fails, for checking local errors surface.
pub struct BrokenStore;

#[async_trait]
impl LocalEventStore for BrokenStore {
    async fn list(&self, _filter: &EventFilter) -> FamcalResult<Vec<CalendarEvent>> {
        Err(FamcalError::LocalStore("connection refused".into()))
    }

    async fn insert(&self, _draft: &EventDraft) -> FamcalResult<CalendarEvent> {
        Err(FamcalError::LocalStore("connection refused".into()))
    }

    async fn update(&self, _id: &str, _patch: &EventPatch) -> FamcalResult<CalendarEvent> {
        Err(FamcalError::LocalStore("connection refused".into()))
    }

    async fn delete(&self, _id: &str) -> FamcalResult<()> {
        Err(FamcalError::LocalStore("connection refused".into()))
    }

    async fn list_by_range(
        &self,
        _family_id: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> FamcalResult<Vec<CalendarEvent>> {
        Err(FamcalError::LocalStore("connection refused".into()))
    }
}

/// Number of rows in the local store, across families.
pub async fn stored(store: &MemoryEventStore) -> usize {
    store.list(&EventFilter::default()).await.unwrap().len()
}

pub struct Harness {
    pub calendar: FamilyCalendar,
    pub store: Arc<MemoryEventStore>,
    pub registry: Arc<MemoryCalendarRegistry>,
    pub provider: Arc<FakeProvider>,
}

pub fn harness(calendars: Vec<LinkedCalendar>) -> Harness {
    let store = Arc::new(MemoryEventStore::new());
    let registry = Arc::new(MemoryCalendarRegistry::with_calendars(calendars));
    let provider = FakeProvider::new();
    let providers = ProviderRegistry::new().with(provider.clone());

    let calendar = FamilyCalendar::new(
        store.clone(),
        registry.clone(),
        providers,
        SyncSettings::default(),
    );

    Harness {
        calendar,
        store,
        registry,
        provider,
    }
}
