//! Merging local and external events into one ordered, duplicate-free list.

use std::collections::HashSet;

use crate::error::{FamcalError, FamcalResult};
use crate::event::CalendarEvent;

/// Merge the family's local events with the results of each external fetch.
///
/// Local events come first, so a local mirror row wins over the external copy
/// of the same provider event. If any external event is structurally broken
/// the whole external side is discarded and only the local events are
/// returned.
pub fn reconcile(
    local: Vec<CalendarEvent>,
    external: Vec<Vec<CalendarEvent>>,
) -> Vec<CalendarEvent> {
    match validate_external(&external) {
        Ok(()) => {
            let merged = local.into_iter().chain(external.into_iter().flatten());
            sort_by_start(dedup_by_external_id(merged))
        }
        Err(e) => {
            tracing::warn!("Falling back to local events only: {}", e);
            sort_by_start(local)
        }
    }
}

/// Keep the first occurrence of every external event id. Events without one
/// are always kept.
pub fn dedup_by_external_id(events: impl IntoIterator<Item = CalendarEvent>) -> Vec<CalendarEvent> {
    let mut seen = HashSet::new();
    events
        .into_iter()
        .filter(|event| match &event.external_event_id {
            Some(external_id) => seen.insert(external_id.clone()),
            None => true,
        })
        .collect()
}

/// Stable ascending sort on start.
pub fn sort_by_start(mut events: Vec<CalendarEvent>) -> Vec<CalendarEvent> {
    events.sort_by(|a, b| a.start.cmp(&b.start));
    events
}

fn validate_external(external: &[Vec<CalendarEvent>]) -> FamcalResult<()> {
    for event in external.iter().flatten() {
        event
            .validate()
            .map_err(|e| FamcalError::MalformedResponse(e.to_string()))?;
    }
    Ok(())
}
