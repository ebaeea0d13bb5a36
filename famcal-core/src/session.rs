//! Authorised access to a linked calendar.
//!
//! Opening a session picks the adapter for the calendar's provider, makes sure
//! the access token is valid and writes a refreshed token back to the
//! registry before any provider call is made.

use std::sync::Arc;

use crate::error::FamcalResult;
use crate::linked_calendar::LinkedCalendar;
use crate::provider::{ProviderAdapter, ProviderRegistry};
use crate::store::SharedCalendarRegistry;

/// A provider adapter paired with a valid token for one calendar.
pub struct OpenSession {
    pub adapter: Arc<dyn ProviderAdapter>,
    pub access_token: String,
    /// The calendar as it is now persisted (refreshed tokens included).
    pub calendar: LinkedCalendar,
}

#[derive(Clone)]
pub struct CalendarSessions {
    providers: ProviderRegistry,
    calendars: SharedCalendarRegistry,
}

impl CalendarSessions {
    pub fn new(providers: ProviderRegistry, calendars: SharedCalendarRegistry) -> Self {
        CalendarSessions {
            providers,
            calendars,
        }
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Fails with `AuthExpired` when the token cannot be refreshed, and with
    /// `LocalStore` when the refreshed token cannot be saved.
    pub async fn open(&self, calendar: &LinkedCalendar) -> FamcalResult<OpenSession> {
        let adapter = self.providers.get(&calendar.provider)?;
        let fresh = adapter.ensure_fresh_token(calendar).await?;

        if fresh.refreshed {
            tracing::debug!(
                "Refreshed access token for {} (expires {})",
                calendar.id,
                fresh.calendar.expires_at
            );
            self.calendars
                .update_tokens(&calendar.id, &fresh.calendar.token_update())
                .await?;
        }

        Ok(OpenSession {
            adapter,
            access_token: fresh.access_token,
            calendar: fresh.calendar,
        })
    }

    /// Like [`CalendarSessions::open`] but starting from a registry id.
    pub async fn open_by_id(&self, linked_calendar_id: &str) -> FamcalResult<OpenSession> {
        let calendar = self.calendars.get(linked_calendar_id).await?;
        self.open(&calendar).await
    }
}
