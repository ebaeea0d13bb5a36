//! Linked calendar endpoints

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
};
use famcal_core::{CalendarOption, LinkedCalendar};
use serde::{Deserialize, Serialize};

use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/{user_id}/calendar-options", get(calendar_options))
        .route("/linked-calendars/link", post(link_account))
        .route("/linked-calendars/{id}/color", patch(update_color))
        .route("/linked-calendars/{id}", delete(unlink))
}

/// Linked calendar info returned by API. Tokens never leave the server.
#[derive(Serialize)]
pub struct LinkedCalendarInfo {
    pub id: String,
    pub provider: String,
    pub account_email: String,
    pub name: String,
    pub color: String,
}

impl From<LinkedCalendar> for LinkedCalendarInfo {
    fn from(calendar: LinkedCalendar) -> Self {
        LinkedCalendarInfo {
            name: calendar.name(),
            provider: calendar.provider.to_string(),
            id: calendar.id,
            account_email: calendar.account_email,
            color: calendar.color,
        }
    }
}

/// GET /users/:user_id/calendar-options - Where the user can create events
async fn calendar_options(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<CalendarOption>>, AppError> {
    Ok(Json(state.family.calendar_options(&user_id).await?))
}

/// Request body for linking a provider account
#[derive(Deserialize)]
pub struct LinkRequest {
    pub provider: String,
    /// OAuth authorization code from the consent redirect.
    pub code: String,
    pub user_id: String,
    pub family_id: String,
}

/// POST /linked-calendars/link - Link every writable calendar of an account
async fn link_account(
    State(state): State<AppState>,
    Json(req): Json<LinkRequest>,
) -> Result<Json<Vec<LinkedCalendarInfo>>, AppError> {
    let linked = state
        .family
        .link_account(&req.provider, &req.code, &req.user_id, &req.family_id)
        .await?;

    Ok(Json(linked.into_iter().map(LinkedCalendarInfo::from).collect()))
}

#[derive(Deserialize)]
pub struct ColorRequest {
    pub color: String,
}

async fn update_color(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ColorRequest>,
) -> Result<Json<LinkedCalendarInfo>, AppError> {
    let calendar = state.family.update_calendar_color(&id, &req.color).await?;
    Ok(Json(calendar.into()))
}

async fn unlink(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, AppError> {
    state.family.unlink_calendar(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
