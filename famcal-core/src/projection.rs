//! Day and range queries over a reconciled collection.
//!
//! Queries compare calendar dates, not instants, so all-day and multi-day
//! events show up on every day they touch.

use chrono::{DateTime, NaiveDate, Utc};

use crate::event::CalendarEvent;
use crate::time::last_occupied_day;

/// Whether `event` occupies calendar day `date`.
pub fn occupies(event: &CalendarEvent, date: NaiveDate) -> bool {
    let first = event.start.date_naive();
    let last = last_occupied_day(event.start, event.end);
    first <= date && date <= last
}

pub fn events_on_date(events: &[CalendarEvent], date: NaiveDate) -> Vec<CalendarEvent> {
    events
        .iter()
        .filter(|event| occupies(event, date))
        .cloned()
        .collect()
}

/// Events touching any day from `start`'s date through the last day the range
/// occupies. A range ending at midnight stops the day before.
pub fn events_in_range(
    events: &[CalendarEvent],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<CalendarEvent> {
    let range_first = start.date_naive();
    let range_last = last_occupied_day(start, end);

    events
        .iter()
        .filter(|event| {
            let first = event.start.date_naive();
            let last = last_occupied_day(event.start, event.end);
            first <= range_last && last >= range_first
        })
        .cloned()
        .collect()
}
