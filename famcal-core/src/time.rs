//! Time handling: all-day detection, provider date encoding and fetch windows.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FamcalError, FamcalResult};

/// A provider-side start or end: either an instant or a date-only value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventTime {
    DateTime(DateTime<Utc>),
    /// All-day value. As an end, providers treat it as exclusive.
    Date(NaiveDate),
}

/// An event is all-day iff it starts exactly at midnight and ends at 23:59
/// (end of a day) or at midnight of a later day.
pub fn is_all_day(start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    if start.hour() != 0 || start.minute() != 0 {
        return false;
    }
    let ends_at_2359 = end.hour() == 23 && end.minute() == 59;
    let ends_at_midnight = end.time() == NaiveTime::MIN;

    (ends_at_2359 && end.date_naive() >= start.date_naive())
        || (ends_at_midnight && end.date_naive() > start.date_naive())
}

/// Encode a canonical span for a provider: date-only values for all-day
/// events (exclusive end date), UTC instants otherwise.
pub fn provider_span(start: DateTime<Utc>, end: DateTime<Utc>) -> (EventTime, EventTime) {
    if !is_all_day(start, end) {
        return (EventTime::DateTime(start), EventTime::DateTime(end));
    }

    let exclusive_end = if end.time() == NaiveTime::MIN {
        end.date_naive()
    } else {
        end.date_naive() + Duration::days(1)
    };

    (
        EventTime::Date(start.date_naive()),
        EventTime::Date(exclusive_end),
    )
}

/// Decode a provider span into canonical UTC instants.
///
/// Date-only spans become `D 00:00:00.000` through `(end - 1 day) 23:59:59.999`,
/// never ending before the start date.
pub fn canonical_span(
    start: &EventTime,
    end: &EventTime,
) -> FamcalResult<(DateTime<Utc>, DateTime<Utc>)> {
    let start_instant = match start {
        EventTime::DateTime(dt) => *dt,
        EventTime::Date(d) => start_of_day(*d),
    };

    let end_instant = match end {
        EventTime::DateTime(dt) => *dt,
        EventTime::Date(d) => {
            let last_day = d.pred_opt().unwrap_or(*d).max(start_instant.date_naive());
            end_of_day(last_day)
        }
    };

    if end_instant <= start_instant {
        return Err(FamcalError::MalformedResponse(format!(
            "event ends ({}) before it starts ({})",
            end_instant.to_rfc3339(),
            start_instant.to_rfc3339()
        )));
    }

    Ok((start_instant, end_instant))
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// 23:59:59.999 on the given day.
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + Duration::days(1) - Duration::milliseconds(1)
}

/// The last calendar day an event occupies. An end exactly at midnight
/// belongs to the previous day.
pub fn last_occupied_day(start: DateTime<Utc>, end: DateTime<Utc>) -> NaiveDate {
    if end.time() == NaiveTime::MIN && end > start {
        (end - Duration::nanoseconds(1)).date_naive()
    } else {
        end.date_naive()
    }
}

/// Widest window [`TimeWindow::next_hours`] builds: a leap year.
pub const MAX_WINDOW_HOURS: i64 = 24 * 366;

/// A half-open fetch window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> FamcalResult<Self> {
        if end <= start {
            return Err(FamcalError::InvalidEvent(format!(
                "time window ends ({}) before it starts ({})",
                end.to_rfc3339(),
                start.to_rfc3339()
            )));
        }
        Ok(TimeWindow { start, end })
    }

    /// Current month plus next month: first day of `today`'s month up to the
    /// first day of the month after next.
    pub fn default_for(today: NaiveDate) -> Self {
        let month_start = first_of_month(today.year(), today.month());
        let (year, month) = add_months(today.year(), today.month(), 2);
        TimeWindow {
            start: start_of_day(month_start),
            end: start_of_day(first_of_month(year, month)),
        }
    }

    /// `[now, now + hours)`, used for cheap health probes. `hours` is kept
    /// within `1..=MAX_WINDOW_HOURS`.
    pub fn next_hours(now: DateTime<Utc>, hours: i64) -> Self {
        TimeWindow {
            start: now,
            end: now + Duration::hours(hours.clamp(1, MAX_WINDOW_HOURS)),
        }
    }
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

fn add_months(year: i32, month: u32, months: u32) -> (i32, u32) {
    let zero_based = month - 1 + months;
    (year + (zero_based / 12) as i32, zero_based % 12 + 1)
}
