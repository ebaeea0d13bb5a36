mod support;

use famcal_core::provider::ProviderRegistry;
use famcal_core::memory::MemoryCalendarRegistry;
use famcal_core::store::{LinkedCalendarRegistry, LocalEventStore};
use famcal_core::{
    EventPatch, FamcalError, FamilyCalendar, LinkedCalendarDraft, ProviderTag, SyncSettings,
};
use std::sync::Arc;
use support::*;

fn patch_title(title: &str) -> EventPatch {
    EventPatch {
        title: Some(title.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_local_create_round_trips() {
    let h = harness(vec![]);
    let draft = local_draft("Piano lesson", at(24, 16), at(24, 17));

    let created = h.calendar.create_event(&draft).await.unwrap();
    let events = h
        .calendar
        .get_reconciled_events(FAMILY, &march())
        .await
        .unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, created.id);
    assert_eq!(events[0].title, draft.title);
    assert_eq!(events[0].start, draft.start);
    assert_eq!(events[0].end, draft.end);
    assert_eq!(h.provider.writes(), 0);
}

#[tokio::test]
async fn test_external_create_writes_mirror_row() {
    let cal = linked("cal-1");
    let h = harness(vec![cal.clone()]);
    let mut draft = local_draft("Parent meeting", at(26, 18), at(26, 19));
    draft.linked_calendar_id = Some(cal.id.clone());

    let created = h.calendar.create_event(&draft).await.unwrap();

    assert_eq!(created.linked_calendar_id.as_deref(), Some("cal-1"));
    assert!(created.external_event_id.is_some());
    assert!(!created.is_external());

    // The provider now also returns the event; only the mirror row is shown
    let events = h
        .calendar
        .get_reconciled_events(FAMILY, &march())
        .await
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, created.id);
}

#[tokio::test]
async fn test_failed_external_create_writes_nothing() {
    let cal = linked("cal-1");
    let h = harness(vec![cal.clone()]);
    h.provider
        .fail_writes(FamcalError::ConflictOnCreate("HTTP 409".into()));
    let mut draft = local_draft("Parent meeting", at(26, 18), at(26, 19));
    draft.linked_calendar_id = Some(cal.id.clone());

    let result = h.calendar.create_event(&draft).await;

    assert!(matches!(result, Err(FamcalError::ConflictOnCreate(_))));
    assert_eq!(stored(&h.store).await, 0);
}

#[tokio::test]
async fn test_invalid_draft_is_rejected() {
    let h = harness(vec![]);
    let draft = local_draft("Backwards", at(20, 10), at(20, 9));

    let result = h.calendar.create_event(&draft).await;

    assert!(matches!(result, Err(FamcalError::InvalidEvent(_))));
    assert_eq!(stored(&h.store).await, 0);
}

#[tokio::test]
async fn test_mirrored_update_survives_provider_failure() {
    let cal = linked("cal-1");
    let h = harness(vec![cal.clone()]);
    let mut draft = local_draft("Recital", at(27, 18), at(27, 19));
    draft.linked_calendar_id = Some(cal.id.clone());
    let created = h.calendar.create_event(&draft).await.unwrap();

    h.provider
        .fail_writes(FamcalError::ProviderUnavailable("503".into()));
    let updated = h
        .calendar
        .update_event(&created.id, &patch_title("Recital (moved)"))
        .await
        .unwrap();

    assert_eq!(updated.title, "Recital (moved)");
    assert_eq!(h.store.get(&created.id).await.unwrap().title, "Recital (moved)");
    assert_eq!(h.provider.writes(), 2, "create and the attempted update");
}

#[tokio::test]
async fn test_mirrored_delete_survives_provider_failure() {
    let cal = linked("cal-1");
    let h = harness(vec![cal.clone()]);
    let mut draft = local_draft("Recital", at(27, 18), at(27, 19));
    draft.linked_calendar_id = Some(cal.id.clone());
    let created = h.calendar.create_event(&draft).await.unwrap();

    h.provider
        .fail_writes(FamcalError::ProviderUnavailable("503".into()));
    h.calendar.delete_event(&created.id).await.unwrap();

    assert_eq!(stored(&h.store).await, 0);
}

#[tokio::test]
async fn test_mirrored_update_with_unlinked_calendar_still_lands_locally() {
    let cal = linked("cal-1");
    let h = harness(vec![cal.clone()]);
    let mut draft = local_draft("Recital", at(27, 18), at(27, 19));
    draft.linked_calendar_id = Some(cal.id.clone());
    let created = h.calendar.create_event(&draft).await.unwrap();

    h.registry.remove("cal-1").await.unwrap();
    let updated = h
        .calendar
        .update_event(&created.id, &patch_title("Renamed"))
        .await
        .unwrap();

    assert_eq!(updated.title, "Renamed");
}

#[tokio::test]
async fn test_local_update_never_calls_provider() {
    let h = harness(vec![linked("cal-1")]);
    let created = h
        .calendar
        .create_event(&local_draft("Soccer", at(22, 9), at(22, 10)))
        .await
        .unwrap();

    h.calendar
        .update_event(&created.id, &patch_title("Soccer finals"))
        .await
        .unwrap();

    assert_eq!(h.provider.writes(), 0);
}

#[tokio::test]
async fn test_external_events_are_read_only() {
    let cal = linked("cal-1");
    let h = harness(vec![cal.clone()]);
    h.provider
        .set_events(&cal, vec![remote_event("g1", "Work trip", at(20, 8), at(20, 18))]);

    let update = h
        .calendar
        .update_event("external_g1", &patch_title("Mine now"))
        .await;
    let delete = h.calendar.delete_event("external_g1").await;

    assert!(matches!(update, Err(FamcalError::ReadOnlyEvent(_))));
    assert!(matches!(delete, Err(FamcalError::ReadOnlyEvent(_))));
    assert_eq!(h.provider.writes(), 0);
}

#[tokio::test]
async fn test_update_refreshes_cached_view() {
    let h = harness(vec![]);
    let created = h
        .calendar
        .create_event(&local_draft("Soccer", at(22, 9), at(22, 10)))
        .await
        .unwrap();
    h.calendar.get_reconciled_events(FAMILY, &march()).await.unwrap();

    h.calendar
        .update_event(&created.id, &patch_title("Soccer finals"))
        .await
        .unwrap();
    let events = h
        .calendar
        .get_reconciled_events(FAMILY, &march())
        .await
        .unwrap();

    assert_eq!(events[0].title, "Soccer finals");
}

#[tokio::test]
async fn test_missing_event_is_not_found() {
    let h = harness(vec![]);
    let result = h.calendar.update_event("missing", &patch_title("x")).await;
    assert!(matches!(result, Err(FamcalError::NotFound(_))));
}

#[tokio::test]
async fn test_local_store_failure_on_create_surfaces() {
    let calendar = FamilyCalendar::new(
        Arc::new(BrokenStore),
        Arc::new(MemoryCalendarRegistry::new()),
        ProviderRegistry::new(),
        SyncSettings::default(),
    );

    let result = calendar
        .create_event(&local_draft("Soccer", at(22, 9), at(22, 10)))
        .await;
    assert!(matches!(result, Err(FamcalError::LocalStore(_))));
}

#[tokio::test]
async fn test_calendar_options_start_with_family_calendar() {
    let h = harness(vec![linked("cal-1")]);

    let options = h.calendar.calendar_options("user-1").await.unwrap();

    assert_eq!(options.len(), 2);
    assert!(options[0].is_default);
    assert_eq!(options[0].id, None);
    assert_eq!(options[0].name, "Family Calendar");
    assert_eq!(options[1].id.as_deref(), Some("cal-1"));
    assert_eq!(options[1].name, "Calendar cal-1");
}

#[tokio::test]
async fn test_color_change_recolors_external_events() {
    let cal = linked("cal-1");
    let h = harness(vec![cal.clone()]);
    h.provider
        .set_events(&cal, vec![remote_event("g1", "Work", at(20, 8), at(20, 9))]);
    h.calendar.get_reconciled_events(FAMILY, &march()).await.unwrap();

    h.calendar
        .update_calendar_color("cal-1", "#E67C73")
        .await
        .unwrap();
    let events = h
        .calendar
        .get_reconciled_events(FAMILY, &march())
        .await
        .unwrap();

    assert_eq!(events[0].color, "#E67C73");
}

#[tokio::test]
async fn test_unlink_removes_external_events() {
    let cal = linked("cal-1");
    let h = harness(vec![cal.clone()]);
    h.provider
        .set_events(&cal, vec![remote_event("g1", "Work", at(20, 8), at(20, 9))]);
    assert_eq!(
        h.calendar
            .get_reconciled_events(FAMILY, &march())
            .await
            .unwrap()
            .len(),
        1
    );

    h.calendar.unlink_calendar("cal-1").await.unwrap();

    assert!(
        h.calendar
            .get_reconciled_events(FAMILY, &march())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_link_account_registers_calendars_once() {
    let h = harness(vec![]);
    let template = linked("unused");
    let draft = LinkedCalendarDraft {
        user_id: "user-1".to_string(),
        family_id: FAMILY.to_string(),
        provider: ProviderTag::from_name("fake"),
        account_email: template.account_email.clone(),
        provider_calendar_id: "primary".to_string(),
        display_name: Some("Personal".to_string()),
        color: "#007AFF".to_string(),
        access_token: "access".to_string(),
        refresh_token: Some("refresh".to_string()),
        expires_at: template.expires_at,
    };
    h.provider.offer_for_linking(vec![draft]);

    let first = h
        .calendar
        .link_account("fake", "good-code", "user-1", FAMILY)
        .await
        .unwrap();
    let again = h
        .calendar
        .link_account("fake", "good-code", "user-1", FAMILY)
        .await
        .unwrap();

    assert_eq!(first.len(), 1);
    assert_eq!(first[0].id, again[0].id);
    assert_eq!(h.registry.list_for_user("user-1").await.unwrap().len(), 1);

    let rejected = h
        .calendar
        .link_account("fake", "bad-code", "user-1", FAMILY)
        .await;
    assert!(matches!(rejected, Err(FamcalError::AuthExpired(_))));

    let unsupported = h
        .calendar
        .link_account("outlook", "good-code", "user-1", FAMILY)
        .await;
    assert!(matches!(unsupported, Err(FamcalError::UnsupportedProvider(_))));
}
