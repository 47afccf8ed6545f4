//! Time, schedule and holiday sources consumed by the session engine.

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::models::user::Username;
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, TimeDelta, Timelike, Weekday};
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Local wall clock, truncated to whole seconds.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        let now = Local::now().naive_local();
        now.with_nanosecond(0).unwrap_or(now)
    }
}

/// Manually driven clock, used by `--at` and by tests.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, delta: TimeDelta) {
        let mut guard = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *guard += delta;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub trait ScheduleProvider: Send + Sync {
    /// Contracted hours per day.
    fn schedule_hours_for(&self, user: &Username) -> u32;

    /// Minutes the user is expected to work on `date`.
    fn scheduled_minutes_for(&self, user: &Username, date: NaiveDate) -> i64;
}

/// Schedules read from the configuration file. Weekends carry no
/// scheduled minutes.
#[derive(Debug, Clone)]
pub struct ConfigSchedule {
    default_hours: u32,
    per_user: BTreeMap<String, u32>,
}

impl ConfigSchedule {
    pub fn new(default_hours: u32) -> Self {
        Self {
            default_hours,
            per_user: BTreeMap::new(),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self {
            default_hours: cfg.default_schedule_hours,
            per_user: cfg.user_schedules.clone(),
        }
    }

    pub fn with_user(mut self, user: &str, hours: u32) -> Self {
        self.per_user.insert(user.to_string(), hours);
        self
    }
}

impl ScheduleProvider for ConfigSchedule {
    fn schedule_hours_for(&self, user: &Username) -> u32 {
        self.per_user
            .get(user.as_str())
            .copied()
            .unwrap_or(self.default_hours)
    }

    fn scheduled_minutes_for(&self, user: &Username, date: NaiveDate) -> i64 {
        match date.weekday() {
            Weekday::Sat | Weekday::Sun => 0,
            _ => i64::from(self.schedule_hours_for(user)) * 60,
        }
    }
}

pub trait HolidayCalendar: Send + Sync {
    fn is_holiday(&self, date: NaiveDate) -> bool;
}

#[derive(Debug, Default, Clone)]
pub struct ConfigHolidays {
    fixed: HashSet<NaiveDate>,
    recurring: HashSet<(u32, u32)>,
}

impl ConfigHolidays {
    /// Accepts `YYYY-MM-DD` (one date) and `MM-DD` (every year).
    pub fn parse(entries: &[String]) -> AppResult<Self> {
        let mut cal = ConfigHolidays::default();

        for raw in entries {
            let s = raw.trim();
            if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                cal.fixed.insert(d);
                continue;
            }

            // Leap year so that 02-29 is accepted as a recurring date.
            let recurring = NaiveDate::parse_from_str(&format!("2024-{}", s), "%Y-%m-%d")
                .map_err(|_| AppError::Config(format!("invalid holiday entry '{}'", s)))?;
            cal.recurring.insert((recurring.month(), recurring.day()));
        }

        Ok(cal)
    }
}

impl HolidayCalendar for ConfigHolidays {
    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.fixed.contains(&date) || self.recurring.contains(&(date.month(), date.day()))
    }
}
