//! Error types for the family calendar core.

use thiserror::Error;

/// Errors that can occur while reading, reconciling or mutating events.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FamcalError {
    /// Token refresh impossible or rejected. The calendar is down for this cycle.
    #[error("Authorization expired for linked calendar {0}")]
    AuthExpired(String),

    #[error("Calendar provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    /// Backend CRUD failure. Never absorbed.
    #[error("Local store error: {0}")]
    LocalStore(String),

    #[error("External calendar rejected the new event: {0}")]
    ConflictOnCreate(String),

    #[error("Unsupported calendar provider '{0}'")]
    UnsupportedProvider(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Event {0} belongs to an external calendar and is read-only")]
    ReadOnlyEvent(String),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FamcalError {
    /// Failures worth one automatic retry. Auth failures are not retried mid-flight.
    pub fn is_transient(&self) -> bool {
        matches!(self, FamcalError::ProviderUnavailable(_))
    }
}

/// Result type alias for family calendar operations.
pub type FamcalResult<T> = Result<T, FamcalError>;
