//! Linked external calendars and their OAuth tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::event::DEFAULT_COLOR;

/// Provider tag, e.g. `google`. Used to select a [`crate::provider::ProviderAdapter`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderTag(String);

impl ProviderTag {
    pub fn from_name(name: &str) -> Self {
        ProviderTag(name.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A third-party calendar the user granted access to.
///
/// `access_token`, `refresh_token` and `expires_at` only make sense together.
/// Refreshing produces a new value via [`LinkedCalendar::with_tokens`].
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedCalendar {
    pub id: String,
    pub user_id: String,
    pub family_id: String,
    pub provider: ProviderTag,
    pub account_email: String,
    #[serde(rename = "calendar_id")]
    pub provider_calendar_id: String,
    #[serde(rename = "calendar_name", default)]
    pub display_name: Option<String>,
    pub color: String,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

// Tokens stay out of logs
impl fmt::Debug for LinkedCalendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedCalendar")
            .field("id", &self.id)
            .field("provider", &self.provider)
            .field("account_email", &self.account_email)
            .field("provider_calendar_id", &self.provider_calendar_id)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// New access token and its expiry, written back atomically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenUpdate {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl LinkedCalendar {
    pub fn is_token_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// A copy carrying the refreshed token. Every other field is untouched.
    pub fn with_tokens(&self, tokens: &TokenUpdate) -> LinkedCalendar {
        LinkedCalendar {
            access_token: tokens.access_token.clone(),
            expires_at: tokens.expires_at,
            ..self.clone()
        }
    }

    pub fn token_update(&self) -> TokenUpdate {
        TokenUpdate {
            access_token: self.access_token.clone(),
            expires_at: self.expires_at,
        }
    }

    pub fn name(&self) -> String {
        self.display_name
            .clone()
            .unwrap_or_else(|| format!("{} Calendar", self.provider))
    }
}

/// A linked calendar as produced by account linking, before the registry assigns an id.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedCalendarDraft {
    pub user_id: String,
    pub family_id: String,
    pub provider: ProviderTag,
    pub account_email: String,
    #[serde(rename = "calendar_id")]
    pub provider_calendar_id: String,
    #[serde(rename = "calendar_name", default)]
    pub display_name: Option<String>,
    pub color: String,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for LinkedCalendarDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedCalendarDraft")
            .field("provider", &self.provider)
            .field("account_email", &self.account_email)
            .field("provider_calendar_id", &self.provider_calendar_id)
            .finish_non_exhaustive()
    }
}

impl LinkedCalendarDraft {
    pub fn into_calendar(self, id: String) -> LinkedCalendar {
        LinkedCalendar {
            id,
            user_id: self.user_id,
            family_id: self.family_id,
            provider: self.provider,
            account_email: self.account_email,
            provider_calendar_id: self.provider_calendar_id,
            display_name: self.display_name,
            color: self.color,
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: self.expires_at,
        }
    }
}

/// A choice of target calendar offered when creating an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarOption {
    /// `None` for the family calendar.
    pub id: Option<String>,
    pub name: String,
    pub color: String,
    pub is_default: bool,
}

impl CalendarOption {
    pub fn family() -> Self {
        CalendarOption {
            id: None,
            name: "Family Calendar".to_string(),
            color: DEFAULT_COLOR.to_string(),
            is_default: true,
        }
    }
}

impl From<&LinkedCalendar> for CalendarOption {
    fn from(calendar: &LinkedCalendar) -> Self {
        CalendarOption {
            id: Some(calendar.id.clone()),
            name: calendar.name(),
            color: calendar.color.clone(),
            is_default: false,
        }
    }
}
