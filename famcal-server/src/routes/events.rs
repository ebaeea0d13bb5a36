//! Family event endpoints

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use chrono::{DateTime, NaiveDate, Utc};
use famcal_core::{CalendarEvent, EventDraft, EventPatch, FamilyCalendar, TimeWindow};
use serde::Deserialize;

use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/families/{family_id}/events", get(list_events))
        .route("/families/{family_id}/events/day/{date}", get(day_events))
        .route("/families/{family_id}/refresh", post(refresh))
        .route("/events", post(create_event))
        .route("/events/{id}", patch(update_event).delete(delete_event))
        .route("/sync-status", get(sync_status))
}

/// Window bounds; each one missing falls back to the default window.
#[derive(Deserialize)]
pub struct WindowQuery {
    pub time_min: Option<DateTime<Utc>>,
    pub time_max: Option<DateTime<Utc>>,
}

/// GET /families/:family_id/events - Reconciled events of the family
async fn list_events(
    State(state): State<AppState>,
    Path(family_id): Path<String>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<Vec<CalendarEvent>>, AppError> {
    let default = FamilyCalendar::default_window(Utc::now().date_naive());
    let window = TimeWindow::new(
        query.time_min.unwrap_or(default.start),
        query.time_max.unwrap_or(default.end),
    )?;

    let events = state.family.get_reconciled_events(&family_id, &window).await?;
    Ok(Json(events))
}

/// GET /families/:family_id/events/day/:date - Events occupying one day
async fn day_events(
    State(state): State<AppState>,
    Path((family_id, date)): Path<(String, NaiveDate)>,
) -> Result<Json<Vec<CalendarEvent>>, AppError> {
    Ok(Json(state.family.events_on_date(&family_id, date).await?))
}

/// POST /families/:family_id/refresh - Drop cached results and refetch on next read
async fn refresh(
    State(state): State<AppState>,
    Path(family_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.family.refresh(&family_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /events - Create an event in the family or a linked calendar
async fn create_event(
    State(state): State<AppState>,
    Json(draft): Json<EventDraft>,
) -> Result<(StatusCode, Json<CalendarEvent>), AppError> {
    let event = state.family.create_event(&draft).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<EventPatch>,
) -> Result<Json<CalendarEvent>, AppError> {
    Ok(Json(state.family.update_event(&id, &patch).await?))
}

async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.family.delete_event(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct SyncStatusQuery {
    /// Comma-separated linked calendar ids.
    #[serde(default)]
    pub ids: String,
}

/// GET /sync-status?ids=a,b - Whether each linked calendar answers right now
async fn sync_status(
    State(state): State<AppState>,
    Query(query): Query<SyncStatusQuery>,
) -> Json<HashMap<String, bool>> {
    let ids: Vec<String> = query
        .ids
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect();

    Json(state.family.get_sync_status(&ids).await)
}
