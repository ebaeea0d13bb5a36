//! Raw Calendar API v3 calls.

use famcal_core::{FamcalError, FamcalResult, TimeWindow};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::app_config::GoogleEndpoints;
use crate::google_event::{CalendarList, GoogleEvent, GoogleEventList};

/// Events requested per page.
const PAGE_SIZE: &str = "250";

/// Upper bound on pages followed for one window.
pub const MAX_PAGES: usize = 10;

/// Which call failed; decides how an error status is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    List,
    Insert,
    Update,
    Delete,
    CalendarList,
    UserInfo,
}

#[derive(Clone)]
pub struct GoogleApi {
    http: Client,
    endpoints: GoogleEndpoints,
}

impl GoogleApi {
    pub fn new(http: Client, endpoints: GoogleEndpoints) -> Self {
        GoogleApi { http, endpoints }
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn endpoints(&self) -> &GoogleEndpoints {
        &self.endpoints
    }

    /// All events in `window`, following `nextPageToken` up to [`MAX_PAGES`].
    /// Cancelled events are dropped.
    pub async fn list_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        window: &TimeWindow,
    ) -> FamcalResult<Vec<GoogleEvent>> {
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let mut url = self.events_url(calendar_id, None)?;
            {
                let mut query = url.query_pairs_mut();
                query
                    .append_pair("timeMin", &window.start.to_rfc3339())
                    .append_pair("timeMax", &window.end.to_rfc3339())
                    .append_pair("singleEvents", "true")
                    .append_pair("orderBy", "startTime")
                    .append_pair("maxResults", PAGE_SIZE);
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let response = self
                .http
                .get(url)
                .bearer_auth(access_token)
                .send()
                .await
                .map_err(|e| unreachable_error(calendar_id, e))?;
            let page: GoogleEventList = decode(check(response, Call::List).await?).await?;

            events.extend(page.items.into_iter().filter(|e| !e.is_cancelled()));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => return Ok(events),
            }
        }

        tracing::warn!(
            "Stopped after {} pages of events for {}; the rest of the window is missing",
            MAX_PAGES,
            calendar_id
        );
        Ok(events)
    }

    pub async fn insert_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event: &GoogleEvent,
    ) -> FamcalResult<GoogleEvent> {
        let response = self
            .http
            .post(self.events_url(calendar_id, None)?)
            .bearer_auth(access_token)
            .json(event)
            .send()
            .await
            .map_err(|e| unreachable_error(calendar_id, e))?;
        decode(check(response, Call::Insert).await?).await
    }

    /// Sends a PATCH, so fields the app does not model (location, attendees,
    /// reminders) are left as they are on Google.
    pub async fn update_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event_id: &str,
        event: &GoogleEvent,
    ) -> FamcalResult<GoogleEvent> {
        let response = self
            .http
            .patch(self.events_url(calendar_id, Some(event_id))?)
            .bearer_auth(access_token)
            .json(event)
            .send()
            .await
            .map_err(|e| unreachable_error(calendar_id, e))?;
        decode(check(response, Call::Update).await?).await
    }

    /// Deleting an event that is already gone (404/410) succeeds.
    pub async fn delete_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event_id: &str,
    ) -> FamcalResult<()> {
        let response = self
            .http
            .delete(self.events_url(calendar_id, Some(event_id))?)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| unreachable_error(calendar_id, e))?;

        if matches!(response.status(), StatusCode::NOT_FOUND | StatusCode::GONE) {
            tracing::debug!("Event {} already deleted from {}", event_id, calendar_id);
            return Ok(());
        }
        check(response, Call::Delete).await?;
        Ok(())
    }

    pub async fn calendar_list(&self, access_token: &str) -> FamcalResult<CalendarList> {
        let url = self.api_url(&["users", "me", "calendarList"])?;
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| unreachable_error("calendarList", e))?;
        decode(check(response, Call::CalendarList).await?).await
    }

    fn events_url(&self, calendar_id: &str, event_id: Option<&str>) -> FamcalResult<Url> {
        match event_id {
            Some(event_id) => self.api_url(&["calendars", calendar_id, "events", event_id]),
            None => self.api_url(&["calendars", calendar_id, "events"]),
        }
    }

    /// `api_base` plus percent-encoded path segments.
    fn api_url(&self, segments: &[&str]) -> FamcalResult<Url> {
        let mut url = Url::parse(&self.endpoints.api_base).map_err(|e| {
            FamcalError::Config(format!("Invalid Google API base {}: {}", self.endpoints.api_base, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                FamcalError::Config(format!(
                    "Google API base {} cannot have a path",
                    self.endpoints.api_base
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

pub(crate) fn unreachable_error(target: &str, err: reqwest::Error) -> FamcalError {
    FamcalError::ProviderUnavailable(format!("Failed to reach Google for {}: {}", target, err))
}

/// Pass successful responses through, classify the rest.
pub(crate) async fn check(response: Response, call: Call) -> FamcalResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Could not read error response".to_string());
    Err(classify(status, &body, call))
}

pub(crate) fn classify(status: StatusCode, body: &str, call: Call) -> FamcalError {
    let message = format!("{:?} failed: HTTP {} - {}", call, status, body);
    match status {
        StatusCode::UNAUTHORIZED => FamcalError::AuthExpired(message),
        s if call == Call::Insert && s.is_client_error() => FamcalError::ConflictOnCreate(message),
        _ => FamcalError::ProviderUnavailable(message),
    }
}

pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> FamcalResult<T> {
    response
        .json()
        .await
        .map_err(|e| FamcalError::MalformedResponse(format!("Unexpected Google payload: {}", e)))
}
