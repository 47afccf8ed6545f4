use rworktime::core::providers::FixedClock;
use rworktime::core::state_machine::SessionService;
use rworktime::core::transition::{Outcome, Transition};
use rworktime::db::memory::MemoryStore;
use rworktime::db::store::WorktimeStore;
use rworktime::models::session::{Session, SessionStatus};
use rworktime::models::worktime_entry::SyncState;
use std::sync::Arc;

mod common;
use common::{FailingMonitor, Harness, date, dt, test_config, user};

#[test]
fn full_day_with_lunch_break() {
    let h = Harness::at("2025-03-03 08:00");
    let alice = user("alice");

    assert!(h.service.start_day(&alice).unwrap().is_applied());
    h.set("2025-03-03 12:00");
    assert!(h.service.start_temporary_stop(&alice).unwrap().is_applied());
    h.set("2025-03-03 12:30");
    assert!(h.service.resume(&alice).unwrap().is_applied());
    h.set("2025-03-03 16:30");
    let outcome = h.service.end_day(&alice, None, None).unwrap();

    let session = outcome.session().unwrap();
    assert_eq!(session.status, SessionStatus::Offline);
    assert_eq!(session.day_end_time, Some(dt("2025-03-03 16:30")));
    assert_eq!(session.temporary_stop_count, 1);
    assert_eq!(session.total_temporary_stop_minutes, 30);

    let entry = h.store.read_entry(&alice, date("2025-03-03")).unwrap().unwrap();
    assert_eq!(entry.total_worked_minutes, 480);
    assert!(entry.lunch_break_deducted);
    assert_eq!(entry.regular_minutes, 420);
    assert_eq!(entry.total_overtime_minutes, 0);
    assert_eq!(entry.final_minutes(), 420);
    assert_eq!(entry.sync_state, SyncState::UserInput);
    assert_eq!(entry.temporary_stop_count, 1);
    assert_eq!(entry.total_temporary_stop_minutes, 30);
    assert_eq!(entry.time_off_type, None);
}

#[test]
fn start_creates_in_process_entry_and_starts_monitoring() {
    let h = Harness::at("2025-03-03 09:00");
    let bob = user("bob");

    h.service.start_day(&bob).unwrap();

    let entry = h.store.read_entry(&bob, date("2025-03-03")).unwrap().unwrap();
    assert_eq!(entry.sync_state, SyncState::InProcess);
    assert_eq!(entry.day_start_time, Some(dt("2025-03-03 09:00")));
    assert!(entry.day_end_time.is_none());
    assert_eq!(h.monitor.calls(), vec!["start:bob".to_string()]);
}

#[test]
fn duplicate_start_creates_one_entry() {
    let h = Harness::at("2025-03-03 08:00");
    let alice = user("alice");

    assert!(h.service.start_day(&alice).unwrap().is_applied());
    h.advance_minutes(1);
    let second = h.service.start_day(&alice).unwrap();

    assert!(matches!(second, Outcome::Unchanged(Some(_))));
    assert_eq!(h.store.entry_inserts(), 1);
    assert_eq!(h.store.entry_count(), 1);
    let session = h.service.session(&alice).unwrap().unwrap();
    assert_eq!(session.day_start_time, dt("2025-03-03 08:00"));
}

#[test]
fn end_day_twice_leaves_state_unchanged() {
    let h = Harness::at("2025-03-03 08:00");
    let alice = user("alice");

    h.service.start_day(&alice).unwrap();
    h.set("2025-03-03 17:00");
    h.service.end_day(&alice, None, None).unwrap();
    let entry_before = h.store.read_entry(&alice, date("2025-03-03")).unwrap();
    let session_before = h.service.session(&alice).unwrap();

    h.set("2025-03-03 17:05");
    let again = h.service.end_day(&alice, None, None).unwrap();

    assert!(matches!(again, Outcome::Unchanged(Some(_))));
    assert_eq!(h.store.read_entry(&alice, date("2025-03-03")).unwrap(), entry_before);
    assert_eq!(h.service.session(&alice).unwrap(), session_before);
}

#[test]
fn pause_requires_online_session() {
    let h = Harness::at("2025-03-03 08:00");
    let alice = user("alice");

    assert!(matches!(
        h.service.start_temporary_stop(&alice).unwrap(),
        Outcome::Unchanged(None)
    ));

    h.service.start_day(&alice).unwrap();
    h.set("2025-03-03 10:00");
    h.service.start_temporary_stop(&alice).unwrap();
    h.set("2025-03-03 10:05");
    let second = h.service.start_temporary_stop(&alice).unwrap();
    assert!(matches!(second, Outcome::Unchanged(Some(_))));

    let session = h.service.session(&alice).unwrap().unwrap();
    assert_eq!(session.temporary_stops.len(), 1);
    assert!(session.stops_consistent());
}

#[test]
fn resume_requires_a_break() {
    let h = Harness::at("2025-03-03 08:00");
    let alice = user("alice");

    h.service.start_day(&alice).unwrap();
    let outcome = h.service.resume(&alice).unwrap();
    assert!(matches!(outcome, Outcome::Unchanged(Some(_))));
}

#[test]
fn stop_list_stays_consistent_through_the_day() {
    let h = Harness::at("2025-03-03 08:00");
    let alice = user("alice");
    let check = |h: &Harness| {
        let s = h.service.session(&alice).unwrap().unwrap();
        assert!(s.stops_consistent(), "inconsistent stops: {:?}", s.temporary_stops);
        s
    };

    h.service.start_day(&alice).unwrap();
    check(&h);
    for (pause, resume) in [("10:00", "10:10"), ("12:00", "12:45"), ("15:00", "15:05")] {
        h.set(&format!("2025-03-03 {}", pause));
        h.service.start_temporary_stop(&alice).unwrap();
        assert_eq!(check(&h).status, SessionStatus::TemporaryStop);
        h.set(&format!("2025-03-03 {}", resume));
        h.service.resume(&alice).unwrap();
        assert_eq!(check(&h).status, SessionStatus::Online);
    }

    let s = check(&h);
    assert_eq!(s.temporary_stop_count, 3);
    assert_eq!(s.total_temporary_stop_minutes, 60);
}

#[test]
fn end_during_break_closes_it_at_end_time() {
    let h = Harness::at("2025-03-03 08:00");
    let alice = user("alice");

    h.service.start_day(&alice).unwrap();
    h.set("2025-03-03 16:00");
    h.service.start_temporary_stop(&alice).unwrap();
    h.set("2025-03-03 16:20");
    let outcome = h.service.end_day(&alice, None, None).unwrap();

    let s = outcome.session().unwrap();
    assert!(s.stops_consistent());
    assert_eq!(s.total_temporary_stop_minutes, 20);
    assert_eq!(s.total_worked_minutes, 480);
}

#[test]
fn end_with_worked_minutes_override() {
    let h = Harness::at("2025-03-03 08:00");
    let alice = user("alice");

    h.service.start_day(&alice).unwrap();
    h.set("2025-03-03 12:00");
    h.service
        .end_day(&alice, Some(dt("2025-03-03 17:00")), Some(540))
        .unwrap();

    let entry = h.store.read_entry(&alice, date("2025-03-03")).unwrap().unwrap();
    assert_eq!(entry.total_worked_minutes, 540);
    assert_eq!(entry.regular_minutes, 480);
    assert_eq!(entry.total_overtime_minutes, 60);
    assert_eq!(entry.day_end_time, Some(dt("2025-03-03 17:00")));
}

#[test]
fn end_before_start_is_rejected() {
    let h = Harness::at("2025-03-03 08:00");
    let alice = user("alice");

    h.service.start_day(&alice).unwrap();
    let err = h
        .service
        .end_day(&alice, Some(dt("2025-03-03 07:00")), None)
        .unwrap_err();
    assert!(err.to_string().contains("before the day start"));
    assert!(h.service.session(&alice).unwrap().unwrap().is_active());
}

#[test]
fn regular_day_overtime_against_scheduled_minutes() {
    let mut cfg = common::test_config();
    cfg.user_schedules.insert("carol".into(), 6);
    let h = Harness::with_config("2025-03-03 08:00", &cfg);
    let carol = user("carol");

    h.service.start_day(&carol).unwrap();
    h.set("2025-03-03 16:00");
    h.service.end_day(&carol, None, None).unwrap();

    // 480 raw on a 6h schedule: floored, capped at 360, 2h over.
    let entry = h.store.read_entry(&carol, date("2025-03-03")).unwrap().unwrap();
    assert_eq!(entry.regular_minutes, 360);
    assert_eq!(entry.total_overtime_minutes, 120);
    assert_eq!(entry.final_minutes(), 480);
}

#[test]
fn resume_after_end_reopens_the_day() {
    let h = Harness::at("2025-03-03 08:00");
    let alice = user("alice");

    h.service.start_day(&alice).unwrap();
    h.set("2025-03-03 12:00");
    h.service.end_day(&alice, None, None).unwrap();
    h.set("2025-03-03 13:00");
    let reopened = h.service.resume(&alice).unwrap();

    let s = reopened.session().unwrap();
    assert_eq!(s.status, SessionStatus::Online);
    assert!(s.day_end_time.is_none());
    assert_eq!(s.temporary_stop_count, 1);
    assert_eq!(s.total_temporary_stop_minutes, 60);
    assert!(s.stops_consistent());

    let entry = h.store.read_entry(&alice, date("2025-03-03")).unwrap().unwrap();
    assert_eq!(entry.sync_state, SyncState::InProcess);
    assert!(entry.day_end_time.is_none());

    h.set("2025-03-03 17:00");
    h.service.end_day(&alice, None, None).unwrap();
    let entry = h.store.read_entry(&alice, date("2025-03-03")).unwrap().unwrap();
    assert_eq!(entry.total_worked_minutes, 480);
    assert_eq!(entry.final_minutes(), 420);
}

#[test]
fn finalized_day_cannot_be_reopened() {
    let h = Harness::at("2025-03-03 08:00");
    let alice = user("alice");

    h.service.start_day(&alice).unwrap();
    h.set("2025-03-03 16:00");
    h.service.end_day(&alice, None, None).unwrap();
    h.service
        .finalize_entry(&alice, date("2025-03-03"), 480, 0)
        .unwrap();

    h.set("2025-03-03 16:30");
    let outcome = h.service.resume(&alice).unwrap();
    assert!(matches!(outcome, Outcome::Unchanged(Some(_))));
    let entry = h.store.read_entry(&alice, date("2025-03-03")).unwrap().unwrap();
    assert_eq!(entry.sync_state, SyncState::AdminEdited);
    assert_eq!(entry.regular_minutes, 480);
}

#[test]
fn admin_edited_entry_is_not_overwritten_by_end() {
    let h = Harness::at("2025-03-03 08:00");
    let alice = user("alice");

    h.service.start_day(&alice).unwrap();
    h.service
        .finalize_entry(&alice, date("2025-03-03"), 300, 60)
        .unwrap();
    h.set("2025-03-03 18:00");
    h.service.end_day(&alice, None, None).unwrap();

    let entry = h.store.read_entry(&alice, date("2025-03-03")).unwrap().unwrap();
    assert_eq!(entry.sync_state, SyncState::AdminEdited);
    assert_eq!(entry.total_worked_minutes, 300);
    assert_eq!(entry.total_overtime_minutes, 60);
    assert_eq!(entry.regular_minutes, 240);
}

#[test]
fn finalize_validates_minutes() {
    let h = Harness::at("2025-03-03 08:00");
    let alice = user("alice");

    assert!(h.service.finalize_entry(&alice, date("2025-03-03"), -1, 0).is_err());
    assert!(h.service.finalize_entry(&alice, date("2025-03-03"), 60, 120).is_err());
    assert_eq!(h.store.entry_count(), 0);
}

#[test]
fn resume_dispatches_hourly_monitoring_once_schedule_is_met() {
    let h = Harness::at("2025-03-03 08:00");
    let alice = user("alice");

    h.service.start_day(&alice).unwrap();
    h.set("2025-03-03 10:00");
    h.service.start_temporary_stop(&alice).unwrap();
    h.set("2025-03-03 10:15");
    h.service.resume(&alice).unwrap();

    h.set("2025-03-03 17:00");
    h.service.start_temporary_stop(&alice).unwrap();
    h.set("2025-03-03 17:10");
    h.service.resume(&alice).unwrap();

    assert_eq!(
        h.monitor.calls(),
        vec![
            "start:alice".to_string(),
            "stop:alice".to_string(),
            "schedule:alice".to_string(),
            "stop:alice".to_string(),
            "hourly:alice:17:10".to_string(),
        ]
    );
}

#[test]
fn apply_dispatches_every_transition() {
    let h = Harness::at("2025-03-03 08:00");
    let alice = user("alice");

    assert!(h.service.apply(&alice, Transition::StartDay).unwrap().is_applied());
    h.set("2025-03-03 09:00");
    assert!(
        h.service
            .apply(&alice, Transition::StartTemporaryStop)
            .unwrap()
            .is_applied()
    );
    h.set("2025-03-03 09:30");
    assert!(h.service.apply(&alice, Transition::Resume).unwrap().is_applied());
    h.set("2025-03-03 16:00");
    let end = h
        .service
        .apply(
            &alice,
            Transition::EndDay {
                end_time: None,
                worked_minutes: None,
            },
        )
        .unwrap();
    assert_eq!(end.label(), "applied");
    assert!(h.service.guard().is_empty());
}

#[test]
fn status_counts_running_break_live() {
    let h = Harness::at("2025-03-03 08:00");
    let alice = user("alice");

    h.service.start_day(&alice).unwrap();
    h.set("2025-03-03 12:00");
    h.service.start_temporary_stop(&alice).unwrap();
    h.set("2025-03-03 12:20");

    let view = h.service.status(&alice).unwrap().unwrap();
    assert_eq!(view.live_stop_minutes, 20);
    assert_eq!(view.live_worked_minutes, 240);
    assert_eq!(view.session.total_worked_minutes, 240);
}

#[test]
fn sessions_survive_a_new_service_instance() {
    let h = Harness::at("2025-03-03 08:00");
    let alice = user("alice");
    h.service.start_day(&alice).unwrap();

    let cfg = common::test_config();
    let again = Harness::with_store("2025-03-03 12:00", &cfg, h.store.clone());
    let outcome = again.service.start_temporary_stop(&alice).unwrap();
    assert!(outcome.is_applied());
    assert_eq!(outcome.session().unwrap().day_start_time, dt("2025-03-03 08:00"));
}

#[test]
fn pause_and_resume_without_ledger_row_keep_the_session_moving() {
    let h = Harness::at("2025-03-03 10:00");
    let alice = user("alice");
    h.store
        .write_session(&Session::start(alice.clone(), dt("2025-03-03 08:00")))
        .unwrap();

    let paused = h.service.start_temporary_stop(&alice).unwrap();
    let Outcome::Applied(s) = paused else {
        panic!("expected an applied pause, got {:?}", paused);
    };
    assert_eq!(s.status, SessionStatus::TemporaryStop);
    assert_eq!(s.temporary_stop_count, 1);

    h.set("2025-03-03 10:20");
    let resumed = h.service.resume(&alice).unwrap();
    let Outcome::Applied(s) = resumed else {
        panic!("expected an applied resume, got {:?}", resumed);
    };
    assert_eq!(s.status, SessionStatus::Online);
    assert_eq!(s.total_temporary_stop_minutes, 20);

    let stored = h.store.read_session(&alice).unwrap().unwrap();
    assert_eq!(stored.status, SessionStatus::Online);
    assert_eq!(h.store.entry_count(), 0);
    assert!(h.store.read_entry(&alice, date("2025-03-03")).unwrap().is_none());
}

#[test]
fn monitoring_failures_never_block_transitions() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::new(dt("2025-03-03 08:00")));
    let service = SessionService::new(
        Arc::clone(&store) as Arc<dyn WorktimeStore>,
        clock.clone(),
        &test_config(),
    )
    .unwrap()
    .with_monitor(Arc::new(FailingMonitor));
    let alice = user("alice");

    assert!(matches!(service.start_day(&alice).unwrap(), Outcome::Applied(_)));
    let entry = store.read_entry(&alice, date("2025-03-03")).unwrap().unwrap();
    assert_eq!(entry.sync_state, SyncState::InProcess);

    clock.set(dt("2025-03-03 12:00"));
    assert!(matches!(
        service.start_temporary_stop(&alice).unwrap(),
        Outcome::Applied(_)
    ));
    clock.set(dt("2025-03-03 12:30"));
    assert!(matches!(service.resume(&alice).unwrap(), Outcome::Applied(_)));

    clock.set(dt("2025-03-03 16:30"));
    assert!(matches!(
        service.end_day(&alice, None, None).unwrap(),
        Outcome::Applied(_)
    ));

    let s = store.read_session(&alice).unwrap().unwrap();
    assert_eq!(s.status, SessionStatus::Offline);
    assert_eq!(s.day_end_time, Some(dt("2025-03-03 16:30")));
    let entry = store.read_entry(&alice, date("2025-03-03")).unwrap().unwrap();
    assert_eq!(entry.sync_state, SyncState::UserInput);
    assert_eq!(entry.total_worked_minutes, 480);
    assert_eq!(entry.total_temporary_stop_minutes, 30);
}
