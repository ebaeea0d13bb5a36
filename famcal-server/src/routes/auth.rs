//! Authentication state endpoints

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use famcal_core::auth::{AuthState, SessionEvent};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/state", get(current_state))
        .route("/auth/events", post(session_event))
}

/// GET /auth/state - Who is signed in
async fn current_state(State(state): State<AppState>) -> Json<AuthState> {
    Json(state.auth.current())
}

/// POST /auth/events - Report a session change from the auth provider
async fn session_event(
    State(state): State<AppState>,
    Json(event): Json<SessionEvent>,
) -> Json<AuthState> {
    Json(state.auth.handle(event))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::tests::{send, test_app};

    #[tokio::test]
    async fn test_sign_in_and_out() {
        let app = test_app(Vec::new());

        let (_, state) = send(&app, Method::GET, "/auth/state", None).await;
        assert_eq!(state, json!({ "state": "unauthenticated" }));

        let profile = json!({
            "user_id": "user-1",
            "email": "parent@example.com",
            "family_id": "fam-1",
            "display_name": null
        });
        let (status, state) = send(
            &app,
            Method::POST,
            "/auth/events",
            Some(json!({ "event": "signed_in", "profile": profile })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state, json!({ "state": "authenticated", "detail": profile }));

        let (_, state) = send(&app, Method::GET, "/auth/state", None).await;
        assert_eq!(state["state"], "authenticated");

        let (_, state) = send(
            &app,
            Method::POST,
            "/auth/events",
            Some(json!({ "event": "signed_out" })),
        )
        .await;
        assert_eq!(state, json!({ "state": "unauthenticated" }));
    }

    #[tokio::test]
    async fn test_unknown_event_is_rejected() {
        let app = test_app(Vec::new());
        let (status, _) = send(
            &app,
            Method::POST,
            "/auth/events",
            Some(json!({ "event": "teleported" })),
        )
        .await;
        assert!(status.is_client_error());
    }
}
