//! Hosted backend client.
//!
//! Talks PostgREST over `/rest/v1/<table>` and implements both core store
//! traits, so one handle serves as the Local Event Store and the Linked
//! Calendar Registry.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use famcal_core::store::{EventFilter, LinkedCalendarRegistry, LocalEventStore};
use famcal_core::{
    CalendarEvent, EventDraft, EventPatch, FamcalError, FamcalResult, LinkedCalendar,
    LinkedCalendarDraft, TokenUpdate,
};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use url::Url;

use crate::config::BackendConfig;

const EVENTS: &str = "events";
const LINKED_CALENDARS: &str = "linked_calendars";

/// Columns a linked calendar is unique on.
const LINKED_CALENDAR_KEY: &str = "user_id,provider,calendar_id";

#[derive(Clone)]
pub struct PostgrestClient {
    http: Client,
    base: Url,
    api_key: String,
}

impl PostgrestClient {
    pub fn new(config: &BackendConfig) -> FamcalResult<Self> {
        let base = Url::parse(&config.url)
            .map_err(|e| FamcalError::Config(format!("Invalid backend url {}: {}", config.url, e)))?;
        let http = Client::builder()
            .build()
            .map_err(|e| FamcalError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(PostgrestClient {
            http,
            base,
            api_key: config.api_key.clone(),
        })
    }

    fn table_url(&self, table: &str, filters: &[(&str, String)]) -> FamcalResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| FamcalError::Config(format!("Backend url {} cannot have a path", self.base)))?
            .pop_if_empty()
            .extend(["rest", "v1", table]);
        if !filters.is_empty() {
            let mut query = url.query_pairs_mut();
            for (column, filter) in filters {
                query.append_pair(column, filter);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", self.api_key.as_str())
            .bearer_auth(&self.api_key)
    }

    /// A mutation that returns the affected rows.
    fn write(&self, method: Method, url: Url) -> RequestBuilder {
        self.request(method, url)
            .header("Prefer", "return=representation")
    }

    /// Send and decode the returned rows.
    async fn rows<T: DeserializeOwned>(&self, request: RequestBuilder) -> FamcalResult<Vec<T>> {
        let response = request
            .send()
            .await
            .map_err(|e| FamcalError::LocalStore(format!("Backend unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(FamcalError::LocalStore(format!(
                "Backend request failed: HTTP {} - {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| FamcalError::LocalStore(format!("Unexpected backend rows: {}", e)))
    }

    async fn one<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> FamcalResult<T> {
        self.rows(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| FamcalError::NotFound(what.to_string()))
    }
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

fn timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn by_start() -> (&'static str, String) {
    ("order", "start_date.asc".to_string())
}

#[async_trait]
impl LocalEventStore for PostgrestClient {
    async fn list(&self, filter: &EventFilter) -> FamcalResult<Vec<CalendarEvent>> {
        let mut filters = Vec::new();
        if let Some(id) = &filter.id {
            filters.push(("id", eq(id)));
        }
        if let Some(family_id) = &filter.family_id {
            filters.push(("family_id", eq(family_id)));
        }
        filters.push(by_start());

        let url = self.table_url(EVENTS, &filters)?;
        self.rows(self.request(Method::GET, url)).await
    }

    async fn insert(&self, draft: &EventDraft) -> FamcalResult<CalendarEvent> {
        let url = self.table_url(EVENTS, &[])?;
        let request = self.write(Method::POST, url).json(draft);
        self.one(request, "inserted event").await
    }

    async fn update(&self, id: &str, patch: &EventPatch) -> FamcalResult<CalendarEvent> {
        let mut body = serde_json::to_value(patch)
            .map_err(|e| FamcalError::LocalStore(format!("Could not encode patch: {}", e)))?;
        if let Value::Object(fields) = &mut body {
            fields.insert("updated_at".to_string(), json!(timestamp(Utc::now())));
        }

        let url = self.table_url(EVENTS, &[("id", eq(id))])?;
        let request = self.write(Method::PATCH, url).json(&body);
        self.one(request, &format!("event {}", id)).await
    }

    async fn delete(&self, id: &str) -> FamcalResult<()> {
        let url = self.table_url(EVENTS, &[("id", eq(id))])?;
        let _: CalendarEvent = self
            .one(self.write(Method::DELETE, url), &format!("event {}", id))
            .await?;
        Ok(())
    }

    async fn list_by_range(
        &self,
        family_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> FamcalResult<Vec<CalendarEvent>> {
        let url = self.table_url(
            EVENTS,
            &[
                ("family_id", eq(family_id)),
                ("start_date", format!("lt.{}", timestamp(end))),
                ("end_date", format!("gt.{}", timestamp(start))),
                by_start(),
            ],
        )?;
        self.rows(self.request(Method::GET, url)).await
    }
}

#[async_trait]
impl LinkedCalendarRegistry for PostgrestClient {
    async fn list_for_user(&self, user_id: &str) -> FamcalResult<Vec<LinkedCalendar>> {
        let url = self.table_url(LINKED_CALENDARS, &[("user_id", eq(user_id))])?;
        self.rows(self.request(Method::GET, url)).await
    }

    async fn list_for_family(&self, family_id: &str) -> FamcalResult<Vec<LinkedCalendar>> {
        let url = self.table_url(LINKED_CALENDARS, &[("family_id", eq(family_id))])?;
        self.rows(self.request(Method::GET, url)).await
    }

    async fn get(&self, id: &str) -> FamcalResult<LinkedCalendar> {
        let url = self.table_url(LINKED_CALENDARS, &[("id", eq(id))])?;
        self.one(self.request(Method::GET, url), &format!("linked calendar {}", id))
            .await
    }

    async fn update_tokens(&self, id: &str, tokens: &TokenUpdate) -> FamcalResult<()> {
        let url = self.table_url(LINKED_CALENDARS, &[("id", eq(id))])?;
        let request = self.write(Method::PATCH, url).json(tokens);
        let _: LinkedCalendar = self.one(request, &format!("linked calendar {}", id)).await?;
        Ok(())
    }

    async fn upsert(&self, draft: &LinkedCalendarDraft) -> FamcalResult<LinkedCalendar> {
        let url = self.table_url(
            LINKED_CALENDARS,
            &[("on_conflict", LINKED_CALENDAR_KEY.to_string())],
        )?;
        let request = self
            .request(Method::POST, url)
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&[draft]);
        self.one(request, "upserted linked calendar").await
    }

    async fn update_color(&self, id: &str, color: &str) -> FamcalResult<LinkedCalendar> {
        let url = self.table_url(LINKED_CALENDARS, &[("id", eq(id))])?;
        let request = self
            .write(Method::PATCH, url)
            .json(&json!({ "color": color }));
        self.one(request, &format!("linked calendar {}", id)).await
    }

    async fn remove(&self, id: &str) -> FamcalResult<()> {
        let url = self.table_url(LINKED_CALENDARS, &[("id", eq(id))])?;
        let _: LinkedCalendar = self
            .one(self.write(Method::DELETE, url), &format!("linked calendar {}", id))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::{Json, Router};
    use chrono::TimeZone;
    use std::collections::HashMap;

    fn client(url: &str) -> PostgrestClient {
        PostgrestClient::new(&BackendConfig {
            url: url.to_string(),
            api_key: "anon-key".to_string(),
        })
        .unwrap()
    }

    fn row(id: &str) -> Value {
        json!({
            "id": id,
            "title": "Swim practice",
            "description": null,
            "start_date": "2025-03-20T16:00:00+00:00",
            "end_date": "2025-03-20T17:00:00+00:00",
            "user_id": "user-1",
            "family_id": "fam-1",
            "color": "#33B679",
            "linked_calendar_id": null,
            "external_event_id": null,
            "created_at": "2025-03-01T10:00:00+00:00",
            "updated_at": "2025-03-01T10:00:00+00:00"
        })
    }

    async fn list_events(headers: HeaderMap, Query(query): Query<HashMap<String, String>>) -> Response {
        if headers.get("apikey").and_then(|v| v.to_str().ok()) != Some("anon-key") {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        match query.get("id").map(String::as_str) {
            Some("eq.missing") => Json(json!([])).into_response(),
            Some(_) => Json(json!([row("evt-1")])).into_response(),
            None if query.get("start_date").is_some_and(|f| f.starts_with("lt."))
                && query.get("end_date").is_some_and(|f| f.starts_with("gt.")) =>
            {
                Json(json!([row("evt-1"), row("evt-2")])).into_response()
            }
            None => StatusCode::BAD_REQUEST.into_response(),
        }
    }

    async fn spawn_backend() -> String {
        let app = Router::new().route(
            "/rest/v1/events",
            get(list_events).post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "db down") }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_range_query_uses_overlap_filters() {
        let backend = client("https://project.supabase.co");
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();

        let url = backend
            .table_url(
                EVENTS,
                &[
                    ("family_id", eq("fam-1")),
                    ("start_date", format!("lt.{}", timestamp(end))),
                    ("end_date", format!("gt.{}", timestamp(start))),
                ],
            )
            .unwrap();

        assert_eq!(url.path(), "/rest/v1/events");
        let pairs: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["family_id"], "eq.fam-1");
        assert_eq!(pairs["start_date"], "lt.2025-05-01T00:00:00.000Z");
        assert_eq!(pairs["end_date"], "gt.2025-03-01T00:00:00.000Z");
    }

    #[tokio::test]
    async fn test_rows_are_decoded() {
        let backend = client(&spawn_backend().await);
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();

        let events = backend.list_by_range("fam-1", start, end).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title, "Swim practice");
        assert_eq!(events[0].family_id.as_deref(), Some("fam-1"));

        let event = LocalEventStore::get(&backend, "evt-1").await.unwrap();
        assert_eq!(event.id, "evt-1");
    }

    #[tokio::test]
    async fn test_missing_row_is_not_found() {
        let backend = client(&spawn_backend().await);
        let result = LocalEventStore::get(&backend, "missing").await;
        assert!(matches!(result, Err(FamcalError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_backend_failures_are_local_store_errors() {
        let backend = client(&spawn_backend().await);
        let start = Utc.with_ymd_and_hms(2025, 3, 20, 9, 0, 0).unwrap();
        let draft = EventDraft::new("Dentist", start, start + chrono::Duration::hours(1));

        let result = backend.insert(&draft).await;
        assert!(matches!(result, Err(FamcalError::LocalStore(_))));

        let unreachable = client("http://127.0.0.1:9");
        let result = unreachable.list(&EventFilter::by_family("fam-1")).await;
        assert!(matches!(result, Err(FamcalError::LocalStore(_))));
    }
}
