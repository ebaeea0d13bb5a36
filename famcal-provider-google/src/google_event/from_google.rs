use famcal_core::{EventStatus, EventTime, FamcalError, FamcalResult, ProviderEvent};

use super::{GoogleEvent, GoogleEventDateTime};

pub trait FromGoogle {
    fn from_google(event: GoogleEvent) -> FamcalResult<Self>
    where
        Self: Sized;
}

impl FromGoogle for ProviderEvent {
    fn from_google(event: GoogleEvent) -> FamcalResult<Self> {
        if event.id.is_empty() {
            return Err(FamcalError::MalformedResponse("Event has no id".into()));
        }

        let start = event_time(event.start.as_ref())
            .ok_or_else(|| FamcalError::MalformedResponse(format!("Event {} has no start time", event.id)))?;
        let end = event_time(event.end.as_ref())
            .ok_or_else(|| FamcalError::MalformedResponse(format!("Event {} has no end time", event.id)))?;

        let status = match event.status.as_deref() {
            Some("tentative") => EventStatus::Tentative,
            Some("cancelled") => EventStatus::Cancelled,
            _ => EventStatus::Confirmed,
        };

        Ok(ProviderEvent {
            id: event.id,
            summary: event.summary,
            description: event.description,
            start,
            end,
            status,
            html_link: event.html_link,
            created: event.created,
            updated: event.updated,
        })
    }
}

fn event_time(time: Option<&GoogleEventDateTime>) -> Option<EventTime> {
    let time = time?;
    if let Some(dt) = time.date_time {
        Some(EventTime::DateTime(dt))
    } else {
        time.date.map(EventTime::Date)
    }
}
