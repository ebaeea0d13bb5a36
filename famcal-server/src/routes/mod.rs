pub mod auth;
pub mod calendars;
pub mod events;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use famcal_core::FamcalError;
use serde::Serialize;

use crate::state::AppState;

/// Every route, bound to `state`.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(events::router())
        .merge(calendars::router())
        .merge(auth::router())
        .with_state(state)
}

/// Standard API error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Convert anyhow errors to HTTP responses
pub struct AppError(anyhow::Error);

fn status_for(err: &FamcalError) -> StatusCode {
    match err {
        FamcalError::NotFound(_) => StatusCode::NOT_FOUND,
        FamcalError::ReadOnlyEvent(_) => StatusCode::FORBIDDEN,
        FamcalError::InvalidEvent(_) => StatusCode::UNPROCESSABLE_ENTITY,
        FamcalError::ConflictOnCreate(_) => StatusCode::CONFLICT,
        FamcalError::AuthExpired(_) => StatusCode::UNAUTHORIZED,
        FamcalError::UnsupportedProvider(_) => StatusCode::BAD_REQUEST,
        FamcalError::ProviderUnavailable(_) | FamcalError::MalformedResponse(_) => {
            StatusCode::BAD_GATEWAY
        }
        FamcalError::LocalStore(_) | FamcalError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self
            .0
            .downcast_ref::<FamcalError>()
            .map(status_for)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!("{:#}", self.0);
        }

        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
