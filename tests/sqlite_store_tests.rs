use rworktime::core::providers::FixedClock;
use rworktime::core::state_machine::SessionService;
use rworktime::db::initialize::init_db;
use rworktime::db::log::{audit, load_audit};
use rworktime::db::migrate::applied_migrations;
use rworktime::db::queries::count_entries;
use rworktime::db::store::{SqliteStore, WorktimeStore};
use rworktime::models::session::{Session, SessionStatus, TemporaryStop};
use rworktime::models::worktime_entry::{SyncState, TimeOffType, WorktimeEntry};
use std::sync::Arc;

mod common;
use common::{date, dt, setup_test_db, test_config, user};

#[test]
fn migrations_run_once() {
    let store = SqliteStore::in_memory().unwrap();

    let versions = store.with_conn(|conn| Ok(applied_migrations(conn)?)).unwrap();
    assert_eq!(versions.len(), 3);

    store.with_conn(init_db).unwrap();
    let again = store.with_conn(|conn| Ok(applied_migrations(conn)?)).unwrap();
    assert_eq!(again, versions);
}

#[test]
fn session_roundtrip_keeps_stops() {
    let store = SqliteStore::in_memory().unwrap();
    let alice = user("alice");

    let mut session = Session::start(alice.clone(), dt("2025-03-03 08:00"));
    session.temporary_stops.push(TemporaryStop {
        start_time: dt("2025-03-03 10:00"),
        end_time: Some(dt("2025-03-03 10:15")),
    });
    session.temporary_stops.push(TemporaryStop::open(dt("2025-03-03 12:00")));
    session.status = SessionStatus::TemporaryStop;
    session.temporary_stop_count = 2;
    session.total_temporary_stop_minutes = 15;
    store.write_session(&session).unwrap();

    let loaded = store.read_session(&alice).unwrap().unwrap();
    assert_eq!(loaded, session);

    session.status = SessionStatus::Offline;
    session.awaiting_resolution = true;
    store.write_session(&session).unwrap();
    assert_eq!(store.list_sessions().unwrap(), vec![session]);
}

#[test]
fn entry_upsert_is_keyed_by_user_and_date() {
    let store = SqliteStore::in_memory().unwrap();
    let alice = user("alice");

    let mut entry = WorktimeEntry::new(alice.clone(), date("2025-03-08"), dt("2025-03-08 09:00"));
    entry.time_off_type = Some(TimeOffType::Weekend);
    store.write_entry(&entry).unwrap();

    entry.total_worked_minutes = 240;
    entry.total_overtime_minutes = 240;
    entry.sync_state = SyncState::UserInput;
    store.write_entry(&entry).unwrap();

    assert_eq!(store.with_conn(count_entries).unwrap(), 1);
    let loaded = store.read_entry(&alice, date("2025-03-08")).unwrap().unwrap();
    assert_eq!(loaded, entry);

    let other = WorktimeEntry::new(user("bob"), date("2025-03-08"), dt("2025-03-08 09:00"));
    store.write_entry(&other).unwrap();
    assert_eq!(store.with_conn(count_entries).unwrap(), 2);
}

#[test]
fn entries_are_listed_by_range() {
    let store = SqliteStore::in_memory().unwrap();
    let alice = user("alice");

    for d in ["2025-02-28", "2025-03-03", "2025-03-04", "2025-04-01"] {
        let e = WorktimeEntry::new(alice.clone(), date(d), dt("2025-03-01 00:00"));
        store.write_entry(&e).unwrap();
    }

    let march = store
        .list_entries(&alice, date("2025-03-01"), date("2025-03-31"))
        .unwrap();
    let days: Vec<String> = march.iter().map(|e| e.work_date.to_string()).collect();
    assert_eq!(days, vec!["2025-03-03", "2025-03-04"]);
}

#[test]
fn audit_rows_are_filtered_by_operation() {
    let store = SqliteStore::in_memory().unwrap();

    store
        .with_conn(|conn| {
            audit(conn, "start", "alice", "day started")?;
            audit(conn, "end", "alice", "day ended")
        })
        .unwrap();

    let ends = store.with_conn(|conn| load_audit(conn, Some("end"))).unwrap();
    assert_eq!(ends.len(), 1);
    assert_eq!(ends[0].target, "alice");

    let all = store.with_conn(|conn| load_audit(conn, None)).unwrap();
    // Migration rows included.
    assert_eq!(all.len(), 5);
}

#[test]
fn service_on_sqlite_file_persists_across_instances() {
    let db_path = setup_test_db("service_on_sqlite_file");
    let alice = user("alice");

    {
        let store = Arc::new(SqliteStore::open(&db_path).unwrap());
        let service = SessionService::new(
            store,
            Arc::new(FixedClock::new(dt("2025-03-03 08:00"))),
            &test_config(),
        )
        .unwrap();
        service.start_day(&alice).unwrap();
    }

    let store = Arc::new(SqliteStore::open(&db_path).unwrap());
    let clock = Arc::new(FixedClock::new(dt("2025-03-03 16:30")));
    let service = SessionService::new(store.clone(), clock, &test_config()).unwrap();
    service.end_day(&alice, None, None).unwrap();

    let entry = store.read_entry(&alice, date("2025-03-03")).unwrap().unwrap();
    assert_eq!(entry.total_worked_minutes, 510);
    assert_eq!(entry.final_minutes(), 480);
    assert_eq!(entry.sync_state, SyncState::UserInput);
}
