use rworktime::core::transition::Outcome;
use rworktime::db::store::WorktimeStore;
use rworktime::models::session::SessionStatus;
use rworktime::models::worktime_entry::SyncState;

mod common;
use common::{Harness, date, dt, user};

#[test]
fn midnight_reset_closes_stale_sessions() {
    let h = Harness::at("2025-03-03 08:00");
    let alice = user("alice");
    let bob = user("bob");

    h.service.start_day(&alice).unwrap();
    h.service.start_day(&bob).unwrap();
    h.set("2025-03-03 16:00");
    h.service.end_day(&bob, None, None).unwrap();
    h.set("2025-03-03 18:00");
    h.service.start_temporary_stop(&alice).unwrap();

    h.set("2025-03-04 00:05");
    let reset = h.service.reset_stale_sessions().unwrap();
    assert_eq!(reset, vec![alice.clone()]);

    let s = h.service.session(&alice).unwrap().unwrap();
    assert_eq!(s.status, SessionStatus::Offline);
    assert!(s.awaiting_resolution);
    assert!(s.day_end_time.is_none());
    assert!(s.stops_consistent());
    assert_eq!(s.temporary_stops[0].end_time, Some(dt("2025-03-03 23:59")));

    let entry = h.store.read_entry(&alice, date("2025-03-03")).unwrap().unwrap();
    assert!(entry.is_dangling());
    assert!(h.monitor.calls().ends_with(&["stop:alice".to_string()]));

    // Nothing left to reset.
    assert!(h.service.reset_stale_sessions().unwrap().is_empty());
}

#[test]
fn start_next_day_force_resets_forgotten_session() {
    let h = Harness::at("2025-03-03 08:00");
    let alice = user("alice");

    h.service.start_day(&alice).unwrap();
    h.set("2025-03-04 08:30");
    let outcome = h.service.start_day(&alice).unwrap();

    let s = outcome.session().unwrap();
    assert_eq!(s.status, SessionStatus::Online);
    assert_eq!(s.day_start_time, dt("2025-03-04 08:30"));
    assert_eq!(h.store.entry_count(), 2);

    let old = h.store.read_entry(&alice, date("2025-03-03")).unwrap().unwrap();
    assert!(old.is_dangling());
}

#[test]
fn resolve_closes_a_dangling_entry() {
    let h = Harness::at("2025-03-03 08:00");
    let alice = user("alice");

    h.service.start_day(&alice).unwrap();
    h.set("2025-03-03 12:00");
    h.service.start_temporary_stop(&alice).unwrap();
    h.set("2025-03-03 12:30");
    h.service.resume(&alice).unwrap();
    h.set("2025-03-04 07:00");
    h.service.reset_stale_sessions().unwrap();

    let outcome = h
        .service
        .resolve_work_time_entry(&alice, date("2025-03-03"), Some(dt("2025-03-03 16:30")))
        .unwrap();

    let Outcome::Resolved(entry) = outcome else {
        panic!("expected a resolved entry, got {:?}", outcome);
    };
    assert_eq!(entry.sync_state, SyncState::Resolved);
    assert_eq!(entry.day_end_time, Some(dt("2025-03-03 16:30")));
    assert_eq!(entry.total_worked_minutes, 480);
    assert_eq!(entry.final_minutes(), 420);
    assert_eq!(entry.total_temporary_stop_minutes, 30);

    let s = h.service.session(&alice).unwrap().unwrap();
    assert!(!s.awaiting_resolution);
    assert_eq!(s.day_end_time, Some(dt("2025-03-03 16:30")));
    assert_eq!(s.total_worked_minutes, 480);
}

#[test]
fn resolve_ignores_closed_or_missing_entries() {
    let h = Harness::at("2025-03-03 08:00");
    let alice = user("alice");

    let missing = h
        .service
        .resolve_work_time_entry(&alice, date("2025-03-03"), None)
        .unwrap();
    assert!(matches!(missing, Outcome::Unchanged(None)));

    h.service.start_day(&alice).unwrap();
    h.set("2025-03-03 16:00");
    h.service.end_day(&alice, None, None).unwrap();
    let closed = h
        .service
        .resolve_work_time_entry(&alice, date("2025-03-03"), None)
        .unwrap();
    assert!(matches!(closed, Outcome::Unchanged(Some(_))));
    let entry = h.store.read_entry(&alice, date("2025-03-03")).unwrap().unwrap();
    assert_eq!(entry.sync_state, SyncState::UserInput);
}

#[test]
fn resolve_rejects_end_before_start() {
    let h = Harness::at("2025-03-03 08:00");
    let alice = user("alice");

    h.service.start_day(&alice).unwrap();
    let err = h
        .service
        .resolve_work_time_entry(&alice, date("2025-03-03"), Some(dt("2025-03-03 07:00")))
        .unwrap_err();
    assert!(err.to_string().contains("before the day start"));
}

#[test]
fn end_on_reset_session_clamps_to_end_of_day() {
    let h = Harness::at("2025-03-03 08:00");
    let alice = user("alice");

    h.service.start_day(&alice).unwrap();
    h.set("2025-03-04 09:00");
    h.service.reset_stale_sessions().unwrap();

    let outcome = h.service.end_day(&alice, None, None).unwrap();
    let s = outcome.session().unwrap();
    assert_eq!(s.day_end_time, Some(dt("2025-03-03 23:59")));
    assert!(!s.awaiting_resolution);

    let entry = h.store.read_entry(&alice, date("2025-03-03")).unwrap().unwrap();
    assert_eq!(entry.sync_state, SyncState::UserInput);
    assert_eq!(entry.total_worked_minutes, 959);
}

#[test]
fn resolve_cuts_a_break_left_open_by_the_reset() {
    let h = Harness::at("2025-03-03 08:00");
    let alice = user("alice");

    h.service.start_day(&alice).unwrap();
    h.set("2025-03-03 12:00");
    h.service.start_temporary_stop(&alice).unwrap();
    h.set("2025-03-04 07:00");
    h.service.reset_stale_sessions().unwrap();

    let outcome = h
        .service
        .resolve_work_time_entry(&alice, date("2025-03-03"), Some(dt("2025-03-03 16:00")))
        .unwrap();
    let Outcome::Resolved(entry) = outcome else {
        panic!("expected a resolved entry, got {:?}", outcome);
    };
    assert_eq!(entry.total_worked_minutes, 240);
    assert_eq!(entry.total_temporary_stop_minutes, 240);
    assert_eq!(entry.temporary_stop_count, 1);

    let s = h.service.session(&alice).unwrap().unwrap();
    assert_eq!(s.total_worked_minutes, 240);
    assert_eq!(s.total_temporary_stop_minutes, 240);
    assert_eq!(s.temporary_stops[0].end_time, Some(dt("2025-03-03 16:00")));
    assert!(s.stops_consistent());
}

#[test]
fn resolve_drops_breaks_after_the_end() {
    let h = Harness::at("2025-03-03 08:00");
    let alice = user("alice");

    h.service.start_day(&alice).unwrap();
    h.set("2025-03-03 17:00");
    h.service.start_temporary_stop(&alice).unwrap();
    h.set("2025-03-04 07:00");
    h.service.reset_stale_sessions().unwrap();

    let outcome = h
        .service
        .resolve_work_time_entry(&alice, date("2025-03-03"), Some(dt("2025-03-03 16:00")))
        .unwrap();
    let Outcome::Resolved(entry) = outcome else {
        panic!("expected a resolved entry, got {:?}", outcome);
    };
    assert_eq!(entry.total_worked_minutes, 480);
    assert_eq!(entry.temporary_stop_count, 0);
    assert_eq!(entry.total_temporary_stop_minutes, 0);

    let s = h.service.session(&alice).unwrap().unwrap();
    assert!(s.temporary_stops.is_empty());
}

#[test]
fn resolve_without_end_closes_a_past_day_at_end_of_day() {
    let h = Harness::at("2025-03-03 08:00");
    let alice = user("alice");

    h.service.start_day(&alice).unwrap();
    h.set("2025-03-04 09:00");
    h.service.reset_stale_sessions().unwrap();

    let outcome = h
        .service
        .resolve_work_time_entry(&alice, date("2025-03-03"), None)
        .unwrap();
    let Outcome::Resolved(entry) = outcome else {
        panic!("expected a resolved entry, got {:?}", outcome);
    };
    assert_eq!(entry.day_end_time, Some(dt("2025-03-03 23:59")));
    assert_eq!(entry.total_worked_minutes, 959);
}
