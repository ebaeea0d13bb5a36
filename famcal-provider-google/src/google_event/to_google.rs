use chrono::{DateTime, Utc};
use famcal_core::time::provider_span;
use famcal_core::{CalendarEvent, EventDraft, EventTime};

use super::{GoogleEvent, GoogleEventDateTime};

pub trait ToGoogle {
    fn to_google(&self) -> GoogleEvent;
}

impl ToGoogle for EventDraft {
    fn to_google(&self) -> GoogleEvent {
        google_event(&self.title, self.description.as_deref(), self.start, self.end)
    }
}

impl ToGoogle for CalendarEvent {
    fn to_google(&self) -> GoogleEvent {
        let mut event = google_event(&self.title, self.description.as_deref(), self.start, self.end);
        if let Some(id) = &self.external_event_id {
            event.id = id.clone();
        }
        event
    }
}

fn google_event(
    title: &str,
    description: Option<&str>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> GoogleEvent {
    let (start, end) = provider_span(start, end);
    GoogleEvent {
        summary: Some(title.to_string()),
        description: Some(description.unwrap_or_default().to_string()),
        start: Some(event_time_to_google(&start)),
        end: Some(event_time_to_google(&end)),
        ..Default::default()
    }
}

fn event_time_to_google(time: &EventTime) -> GoogleEventDateTime {
    match time {
        EventTime::Date(d) => GoogleEventDateTime {
            date: Some(*d),
            ..Default::default()
        },
        EventTime::DateTime(dt) => GoogleEventDateTime {
            date: None,
            date_time: Some(*dt),
            time_zone: Some("UTC".to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone};

    #[test]
    fn test_timed_draft_uses_utc_date_time() {
        let draft = EventDraft::new(
            "Swim",
            Utc.with_ymd_and_hms(2025, 3, 20, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 20, 10, 0, 0).unwrap(),
        );

        let json = serde_json::to_value(draft.to_google()).unwrap();

        assert_eq!(json["start"]["dateTime"], "2025-03-20T09:00:00Z");
        assert_eq!(json["start"]["timeZone"], "UTC");
        assert!(json["start"].get("date").is_none());
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_all_day_draft_uses_exclusive_end_date() {
        let start = Utc.with_ymd_and_hms(2025, 3, 20, 0, 0, 0).unwrap();
        let draft = EventDraft::new(
            "Holiday",
            start,
            start + Duration::days(1) - Duration::milliseconds(1),
        );

        let google = draft.to_google();

        assert_eq!(
            google.start.and_then(|s| s.date),
            NaiveDate::from_ymd_opt(2025, 3, 20)
        );
        let end = google.end.unwrap();
        assert_eq!(end.date, NaiveDate::from_ymd_opt(2025, 3, 21));
        assert!(end.date_time.is_none());
    }
}
