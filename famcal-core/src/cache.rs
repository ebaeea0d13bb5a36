//! Reconciled view cache keyed by family, linked calendars and window.

use moka::sync::Cache;
use std::sync::Arc;

use crate::event::CalendarEvent;
use crate::settings::SyncSettings;
use crate::time::TimeWindow;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewKey {
    pub family_id: String,
    /// Sorted, so the same set of calendars always maps to one key.
    pub linked_calendar_ids: Vec<String>,
    pub window: TimeWindow,
}

impl ViewKey {
    pub fn new(family_id: &str, mut linked_calendar_ids: Vec<String>, window: TimeWindow) -> Self {
        linked_calendar_ids.sort();
        linked_calendar_ids.dedup();
        ViewKey {
            family_id: family_id.to_string(),
            linked_calendar_ids,
            window,
        }
    }
}

#[derive(Clone)]
pub struct ViewCache {
    views: Cache<ViewKey, Arc<Vec<CalendarEvent>>>,
}

impl ViewCache {
    pub fn new(settings: &SyncSettings) -> Self {
        let views = Cache::builder()
            .max_capacity(settings.cache_capacity.max(1))
            .time_to_live(settings.view_ttl())
            .build();
        ViewCache { views }
    }

    pub fn get(&self, key: &ViewKey) -> Option<Arc<Vec<CalendarEvent>>> {
        self.views.get(key)
    }

    pub fn insert(&self, key: ViewKey, events: Vec<CalendarEvent>) -> Arc<Vec<CalendarEvent>> {
        let events = Arc::new(events);
        self.views.insert(key, events.clone());
        events
    }

    /// Drop every cached view of a family, whatever its window.
    pub fn invalidate_family(&self, family_id: &str) {
        let stale: Vec<Arc<ViewKey>> = self
            .views
            .iter()
            .filter(|(key, _)| key.family_id == family_id)
            .map(|(key, _)| key)
            .collect();

        tracing::debug!("Invalidating {} cached view(s) of family {}", stale.len(), family_id);
        for key in stale {
            self.views.invalidate(key.as_ref());
        }
    }

    pub fn invalidate_all(&self) {
        self.views.invalidate_all();
    }
}
