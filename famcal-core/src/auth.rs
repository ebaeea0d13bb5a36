//! Signed-in user state.
//!
//! [`AuthMachine`] is the single source of truth for who is signed in. The
//! auth collaborator reports [`SessionEvent`]s; everybody else reads the
//! current [`AuthState`] or subscribes to changes.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub email: String,
    #[serde(default)]
    pub family_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum AuthState {
    Unauthenticated,
    Initializing,
    Authenticated(UserProfile),
    Error(String),
}

/// Session changes reported by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "profile", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The stored session found at startup, if any.
    InitialSession(Option<UserProfile>),
    SignedIn(UserProfile),
    TokenRefreshed(UserProfile),
    UserUpdated(UserProfile),
    SignedOut,
    Failed(String),
}

impl AuthState {
    pub fn profile(&self) -> Option<&UserProfile> {
        match self {
            AuthState::Authenticated(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    /// The state after `event`.
    pub fn next(&self, event: SessionEvent) -> AuthState {
        match event {
            SessionEvent::InitialSession(Some(profile)) | SessionEvent::SignedIn(profile) => {
                AuthState::Authenticated(profile)
            }
            SessionEvent::InitialSession(None) | SessionEvent::SignedOut => {
                AuthState::Unauthenticated
            }
            // Only meaningful for a live session
            SessionEvent::TokenRefreshed(profile) | SessionEvent::UserUpdated(profile) => {
                match self {
                    AuthState::Authenticated(_) | AuthState::Initializing => {
                        AuthState::Authenticated(profile)
                    }
                    other => other.clone(),
                }
            }
            SessionEvent::Failed(message) => AuthState::Error(message),
        }
    }
}

pub struct AuthMachine {
    state: watch::Sender<AuthState>,
}

impl Default for AuthMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthMachine {
    pub fn new() -> Self {
        let (state, _) = watch::channel(AuthState::Unauthenticated);
        AuthMachine { state }
    }

    /// Enter `Initializing` while the stored session is being loaded.
    pub fn begin(&self) -> AuthState {
        self.state.send_replace(AuthState::Initializing);
        self.current()
    }

    pub fn handle(&self, event: SessionEvent) -> AuthState {
        self.state.send_modify(|state| {
            let next = state.next(event);
            tracing::debug!("Auth state {:?} -> {:?}", state, next);
            *state = next;
        });
        self.current()
    }

    pub fn current(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }
}
