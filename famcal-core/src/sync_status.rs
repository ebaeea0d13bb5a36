//! Per-calendar health probes.

use chrono::Utc;
use futures::future::join_all;
use std::collections::HashMap;

use crate::fetcher::ExternalEventFetcher;
use crate::store::SharedCalendarRegistry;
use crate::time::TimeWindow;

/// Probe each linked calendar with a short fetch and report whether it worked.
///
/// Unknown ids and registry failures report `false`. Probes run concurrently.
pub async fn sync_status(
    fetcher: &ExternalEventFetcher,
    calendars: &SharedCalendarRegistry,
    linked_calendar_ids: &[String],
    probe_hours: i64,
) -> HashMap<String, bool> {
    let window = TimeWindow::next_hours(Utc::now(), probe_hours);

    let probes = linked_calendar_ids.iter().map(|id| {
        let window = window;
        async move {
            let ok = match calendars.get(id).await {
                Ok(calendar) => fetcher.probe(&calendar, &window).await,
                Err(e) => {
                    tracing::warn!("Cannot probe linked calendar {}: {}", id, e);
                    false
                }
            };
            (id.clone(), ok)
        }
    });

    join_all(probes).await.into_iter().collect()
}
