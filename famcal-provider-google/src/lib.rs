//! famcal-provider-google - Google Calendar adapter for the family calendar
//!
//! Talks to the Calendar API v3 over REST and to Google's OAuth2 token
//! endpoint. Credentials come from the server config or from
//!   ~/.config/famcal/providers/google/app_config.toml

pub mod api;
pub mod app_config;
pub mod google_event;
mod link;
pub mod session;

use async_trait::async_trait;
use famcal_core::{
    CalendarEvent, EventDraft, FamcalError, FamcalResult, LinkedCalendar, LinkedCalendarDraft,
    ProviderAdapter, ProviderEvent, ProviderTag, TimeWindow, TokenUpdate,
};
use std::time::Duration;

use crate::api::GoogleApi;
use crate::app_config::{Credentials, GoogleEndpoints};
use crate::google_event::{FromGoogle, ToGoogle};

pub const PROVIDER_NAME: &str = "google";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct GoogleAdapter {
    api: GoogleApi,
    credentials: Credentials,
}

impl GoogleAdapter {
    pub fn new(credentials: Credentials, endpoints: GoogleEndpoints) -> FamcalResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FamcalError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(GoogleAdapter {
            api: GoogleApi::new(http, endpoints),
            credentials,
        })
    }

    /// Adapter using the credentials in the provider's `app_config.toml`.
    pub fn from_app_config() -> FamcalResult<Self> {
        Self::new(app_config::load()?, GoogleEndpoints::default())
    }
}

#[async_trait]
impl ProviderAdapter for GoogleAdapter {
    fn tag(&self) -> ProviderTag {
        ProviderTag::from_name(PROVIDER_NAME)
    }

    async fn refresh_token(&self, calendar: &LinkedCalendar) -> FamcalResult<TokenUpdate> {
        let refresh_token = calendar.refresh_token.as_deref().ok_or_else(|| {
            FamcalError::AuthExpired(format!("{}: no refresh token", calendar.id))
        })?;
        session::refresh_access_token(&self.api, &self.credentials, refresh_token).await
    }

    async fn fetch_events(
        &self,
        calendar: &LinkedCalendar,
        access_token: &str,
        window: &TimeWindow,
    ) -> FamcalResult<Vec<ProviderEvent>> {
        let events = self
            .api
            .list_events(access_token, &calendar.provider_calendar_id, window)
            .await?;

        tracing::debug!(
            "Fetched {} event(s) from Google calendar {}",
            events.len(),
            calendar.provider_calendar_id
        );
        events.into_iter().map(ProviderEvent::from_google).collect()
    }

    async fn create_event(
        &self,
        calendar: &LinkedCalendar,
        access_token: &str,
        draft: &EventDraft,
    ) -> FamcalResult<ProviderEvent> {
        let created = self
            .api
            .insert_event(access_token, &calendar.provider_calendar_id, &draft.to_google())
            .await?;
        ProviderEvent::from_google(created)
    }

    async fn update_event(
        &self,
        calendar: &LinkedCalendar,
        access_token: &str,
        external_event_id: &str,
        event: &CalendarEvent,
    ) -> FamcalResult<ProviderEvent> {
        let updated = self
            .api
            .update_event(
                access_token,
                &calendar.provider_calendar_id,
                external_event_id,
                &event.to_google(),
            )
            .await?;
        ProviderEvent::from_google(updated)
    }

    async fn delete_event(
        &self,
        calendar: &LinkedCalendar,
        access_token: &str,
        external_event_id: &str,
    ) -> FamcalResult<()> {
        self.api
            .delete_event(access_token, &calendar.provider_calendar_id, external_event_id)
            .await
    }

    async fn link_account(
        &self,
        authorization_code: &str,
        user_id: &str,
        family_id: &str,
    ) -> FamcalResult<Vec<LinkedCalendarDraft>> {
        link::link_account(
            &self.api,
            &self.credentials,
            &self.tag(),
            authorization_code,
            user_id,
            family_id,
        )
        .await
    }
}
