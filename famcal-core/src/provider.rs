//! External calendar providers.
//!
//! Each provider implements [`ProviderAdapter`] once; a [`ProviderRegistry`]
//! selects the adapter for a linked calendar by its [`ProviderTag`]. The
//! reconciler and the write router only ever talk to this trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{FamcalError, FamcalResult};
use crate::event::{CalendarEvent, EventDraft};
use crate::linked_calendar::{LinkedCalendar, LinkedCalendarDraft, ProviderTag, TokenUpdate};
use crate::time::{EventTime, TimeWindow};

/// An event as returned by a provider, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderEvent {
    /// The provider's own event id.
    pub id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    pub status: EventStatus,
    pub html_link: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    Confirmed,
    Tentative,
    Cancelled,
}

/// An access token known to be valid, and the calendar it belongs to.
#[derive(Debug, Clone)]
pub struct FreshToken {
    pub access_token: String,
    /// The calendar value carrying this token (a new value if refreshed).
    pub calendar: LinkedCalendar,
    /// True when the caller must persist `calendar`'s tokens.
    pub refreshed: bool,
}

#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn tag(&self) -> ProviderTag;

    /// Exchange the calendar's refresh token for a new access token.
    async fn refresh_token(&self, calendar: &LinkedCalendar) -> FamcalResult<TokenUpdate>;

    async fn fetch_events(
        &self,
        calendar: &LinkedCalendar,
        access_token: &str,
        window: &TimeWindow,
    ) -> FamcalResult<Vec<ProviderEvent>>;

    async fn create_event(
        &self,
        calendar: &LinkedCalendar,
        access_token: &str,
        draft: &EventDraft,
    ) -> FamcalResult<ProviderEvent>;

    async fn update_event(
        &self,
        calendar: &LinkedCalendar,
        access_token: &str,
        external_event_id: &str,
        event: &CalendarEvent,
    ) -> FamcalResult<ProviderEvent>;

    async fn delete_event(
        &self,
        calendar: &LinkedCalendar,
        access_token: &str,
        external_event_id: &str,
    ) -> FamcalResult<()>;

    /// Turn an OAuth authorization code into the account's writable calendars.
    async fn link_account(
        &self,
        _authorization_code: &str,
        _user_id: &str,
        _family_id: &str,
    ) -> FamcalResult<Vec<LinkedCalendarDraft>> {
        Err(FamcalError::UnsupportedProvider(format!(
            "{} does not support account linking",
            self.tag()
        )))
    }

    /// Return a usable access token, refreshing it first if it has expired.
    ///
    /// Never mutates `calendar`. Any refresh failure is `AuthExpired`.
    async fn ensure_fresh_token(&self, calendar: &LinkedCalendar) -> FamcalResult<FreshToken> {
        if !calendar.is_token_expired(Utc::now()) {
            return Ok(FreshToken {
                access_token: calendar.access_token.clone(),
                calendar: calendar.clone(),
                refreshed: false,
            });
        }

        if calendar.refresh_token.is_none() {
            return Err(FamcalError::AuthExpired(format!(
                "{}: access token expired and no refresh token available",
                calendar.id
            )));
        }

        let tokens = self.refresh_token(calendar).await.map_err(|e| match e {
            FamcalError::AuthExpired(_) => e,
            other => FamcalError::AuthExpired(format!("{}: refresh failed: {}", calendar.id, other)),
        })?;

        Ok(FreshToken {
            access_token: tokens.access_token.clone(),
            calendar: calendar.with_tokens(&tokens),
            refreshed: true,
        })
    }
}

/// Adapters keyed by provider tag.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    adapters: HashMap<ProviderTag, Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        tracing::info!("Registering calendar provider: {}", adapter.tag());
        self.adapters.insert(adapter.tag(), adapter);
    }

    pub fn with(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.register(adapter);
        self
    }

    pub fn get(&self, tag: &ProviderTag) -> FamcalResult<Arc<dyn ProviderAdapter>> {
        self.adapters
            .get(tag)
            .cloned()
            .ok_or_else(|| FamcalError::UnsupportedProvider(tag.to_string()))
    }

    pub fn tags(&self) -> Vec<ProviderTag> {
        self.adapters.keys().cloned().collect()
    }
}
