//! External event fetching.
//!
//! [`ExternalEventFetcher::fetch`] never fails. Whatever goes wrong with a
//! linked calendar (expired auth, provider outage, bad payload) turns into an
//! empty list and a `false` in the health map, so one broken account cannot
//! blank out the rest of the family's calendar.

use chrono::Utc;
use futures::future::join_all;
use moka::sync::Cache;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::FamcalResult;
use crate::event::CalendarEvent;
use crate::linked_calendar::LinkedCalendar;
use crate::normalize::normalize_events;
use crate::session::CalendarSessions;
use crate::settings::SyncSettings;
use crate::time::TimeWindow;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FetchKey {
    calendar_id: String,
    window: TimeWindow,
}

/// Last fetch outcome per linked calendar id (true = succeeded).
pub type HealthMap = HashMap<String, bool>;

/// Events fetched from one linked calendar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fetched {
    pub events: Vec<CalendarEvent>,
    /// False when the calendar failed and `events` is a stand-in empty list.
    pub complete: bool,
}

impl Fetched {
    fn complete(events: Vec<CalendarEvent>) -> Self {
        Fetched {
            events,
            complete: true,
        }
    }

    fn failed() -> Self {
        Fetched::default()
    }
}

#[derive(Clone)]
pub struct ExternalEventFetcher {
    sessions: CalendarSessions,
    cache: Cache<FetchKey, Arc<Vec<CalendarEvent>>>,
    health: Arc<RwLock<HealthMap>>,
    retries: u32,
}

impl ExternalEventFetcher {
    pub fn new(sessions: CalendarSessions, settings: &SyncSettings) -> Self {
        let cache = Cache::builder()
            .max_capacity(settings.cache_capacity.max(1))
            .time_to_live(settings.external_ttl())
            .build();

        ExternalEventFetcher {
            sessions,
            cache,
            health: Arc::new(RwLock::new(HashMap::new())),
            retries: settings.fetch_retries,
        }
    }

    pub fn sessions(&self) -> &CalendarSessions {
        &self.sessions
    }

    /// Events of `calendar` within `window`, or an empty list on any failure.
    ///
    /// Successful results are cached for the configured TTL; failures are not.
    pub async fn fetch(&self, calendar: &LinkedCalendar, window: &TimeWindow) -> Fetched {
        let key = FetchKey {
            calendar_id: calendar.id.clone(),
            window: *window,
        };

        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!("Using cached events for linked calendar {}", calendar.id);
            return Fetched::complete(cached.as_ref().clone());
        }

        match self.fetch_with_retry(calendar, window).await {
            Ok(events) => {
                self.record(&calendar.id, true).await;
                self.cache.insert(key, Arc::new(events.clone()));
                Fetched::complete(events)
            }
            Err(e) => {
                tracing::warn!("Skipping linked calendar {}: {}", calendar.id, e);
                self.record(&calendar.id, false).await;
                Fetched::failed()
            }
        }
    }

    /// Fetch every calendar concurrently and wait for all of them.
    ///
    /// The result has one entry per calendar, in input order.
    pub async fn fetch_all(&self, calendars: &[LinkedCalendar], window: &TimeWindow) -> Vec<Fetched> {
        join_all(calendars.iter().map(|calendar| self.fetch(calendar, window))).await
    }

    /// Uncached fetch used to check that a calendar is reachable.
    pub async fn probe(&self, calendar: &LinkedCalendar, window: &TimeWindow) -> bool {
        let ok = match self.fetch_with_retry(calendar, window).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Sync probe failed for linked calendar {}: {}", calendar.id, e);
                false
            }
        };
        self.record(&calendar.id, ok).await;
        ok
    }

    pub async fn health(&self) -> HealthMap {
        self.health.read().await.clone()
    }

    /// Drop every cached window of one calendar.
    pub fn invalidate_calendar(&self, calendar_id: &str) {
        let stale: Vec<Arc<FetchKey>> = self
            .cache
            .iter()
            .filter(|(key, _)| key.calendar_id == calendar_id)
            .map(|(key, _)| key)
            .collect();

        for key in stale {
            self.cache.invalidate(key.as_ref());
        }
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    async fn fetch_with_retry(
        &self,
        calendar: &LinkedCalendar,
        window: &TimeWindow,
    ) -> FamcalResult<Vec<CalendarEvent>> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(calendar, window).await {
                Err(e) if e.is_transient() && attempt < self.retries => {
                    attempt += 1;
                    tracing::debug!(
                        "Retrying linked calendar {} after error (attempt {}): {}",
                        calendar.id,
                        attempt,
                        e
                    );
                }
                result => return result,
            }
        }
    }

    async fn fetch_once(
        &self,
        calendar: &LinkedCalendar,
        window: &TimeWindow,
    ) -> FamcalResult<Vec<CalendarEvent>> {
        let session = self.sessions.open(calendar).await?;
        let raw = session
            .adapter
            .fetch_events(&session.calendar, &session.access_token, window)
            .await?;
        normalize_events(&session.calendar, &raw, Utc::now())
    }

    async fn record(&self, calendar_id: &str, ok: bool) {
        self.health.write().await.insert(calendar_id.to_string(), ok);
    }
}
