//! Core of the family calendar.
//!
//! Merges a family's own events with events from linked external calendars
//! and routes writes to the right place:
//! - `event`, `linked_calendar` and `time` for the canonical shapes
//! - `provider` for the per-provider adapter capability and its registry
//! - `fetcher`, `reconcile` and `projection` for the read path
//! - `router` for the write path
//! - `service` for the [`FamilyCalendar`] facade tying it all together

pub mod auth;
pub mod cache;
pub mod error;
pub mod event;
pub mod fetcher;
pub mod linked_calendar;
pub mod memory;
pub mod normalize;
pub mod projection;
pub mod provider;
pub mod reconcile;
pub mod router;
pub mod service;
pub mod session;
pub mod settings;
pub mod store;
pub mod sync_status;
pub mod time;

pub use error::{FamcalError, FamcalResult};
pub use event::{CalendarEvent, EventDraft, EventPatch, ExternalMeta};
pub use linked_calendar::{
    CalendarOption, LinkedCalendar, LinkedCalendarDraft, ProviderTag, TokenUpdate,
};
pub use provider::{EventStatus, ProviderAdapter, ProviderEvent, ProviderRegistry};
pub use service::FamilyCalendar;
pub use settings::SyncSettings;
pub use store::{EventFilter, LinkedCalendarRegistry, LocalEventStore};
pub use time::{EventTime, TimeWindow};
