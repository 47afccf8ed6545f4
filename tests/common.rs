#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use rworktime::config::Config;
use rworktime::core::monitoring::MonitoringDispatcher;
use rworktime::core::providers::FixedClock;
use rworktime::core::state_machine::SessionService;
use rworktime::db::memory::MemoryStore;
use rworktime::db::store::WorktimeStore;
use rworktime::errors::{AppError, AppResult};
use rworktime::models::user::Username;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub fn rti() -> Command {
    cargo_bin_cmd!("rworktime")
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_rworktime.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    db_path
}

/// `--test init` on a fresh database file.
pub fn init_test_db(name: &str) -> String {
    let db_path = setup_test_db(name);
    rti()
        .args(["--db", &db_path, "--test", "init"])
        .assert()
        .success();
    db_path
}

pub fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").expect("valid datetime")
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
}

pub fn user(name: &str) -> Username {
    Username::parse(name).expect("valid user")
}

/// Defaults with retries that do not sleep.
pub fn test_config() -> Config {
    let mut cfg = Config::default();
    cfg.auto_end.retry_delay_ms = 0;
    cfg
}

/// Monitor calls in order, e.g. `start:alice`.
#[derive(Debug, Default)]
pub struct RecordingMonitor {
    pub calls: Mutex<Vec<String>>,
}

impl RecordingMonitor {
    fn push(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl MonitoringDispatcher for RecordingMonitor {
    fn start_monitoring(&self, user: &Username) -> AppResult<()> {
        self.push(format!("start:{}", user));
        Ok(())
    }

    fn stop_monitoring(&self, user: &Username) -> AppResult<()> {
        self.push(format!("stop:{}", user));
        Ok(())
    }

    fn activate_hourly_monitoring(&self, user: &Username, since: NaiveDateTime) -> AppResult<()> {
        self.push(format!("hourly:{}:{}", user, since.format("%H:%M")));
        Ok(())
    }

    fn resume_schedule_monitoring(&self, user: &Username) -> AppResult<()> {
        self.push(format!("schedule:{}", user));
        Ok(())
    }
}

/// Monitor whose every call fails.
#[derive(Debug, Default)]
pub struct FailingMonitor;

impl FailingMonitor {
    fn fail(call: &str, user: &Username) -> AppResult<()> {
        Err(AppError::Monitoring(format!("{} unavailable for {}", call, user)))
    }
}

impl MonitoringDispatcher for FailingMonitor {
    fn start_monitoring(&self, user: &Username) -> AppResult<()> {
        Self::fail("start", user)
    }

    fn stop_monitoring(&self, user: &Username) -> AppResult<()> {
        Self::fail("stop", user)
    }

    fn activate_hourly_monitoring(&self, user: &Username, _since: NaiveDateTime) -> AppResult<()> {
        Self::fail("hourly", user)
    }

    fn resume_schedule_monitoring(&self, user: &Username) -> AppResult<()> {
        Self::fail("schedule", user)
    }
}

/// Service over an in-memory store with a hand-driven clock.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<FixedClock>,
    pub monitor: Arc<RecordingMonitor>,
    pub service: SessionService,
}

impl Harness {
    pub fn at(now: &str) -> Self {
        Self::with_config(now, &test_config())
    }

    pub fn with_config(now: &str, cfg: &Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::with_store(now, cfg, store)
    }

    pub fn with_store(now: &str, cfg: &Config, store: Arc<MemoryStore>) -> Self {
        let clock = Arc::new(FixedClock::new(dt(now)));
        let monitor = Arc::new(RecordingMonitor::default());
        let service = SessionService::new(
            Arc::clone(&store) as Arc<dyn WorktimeStore>,
            clock.clone(),
            cfg,
        )
        .expect("service")
        .with_monitor(monitor.clone());

        Self {
            store,
            clock,
            monitor,
            service,
        }
    }

    pub fn set(&self, now: &str) {
        self.clock.set(dt(now));
    }

    pub fn advance_minutes(&self, minutes: i64) {
        self.clock.advance(TimeDelta::minutes(minutes));
    }
}
