//! Live work-day session of a single user.

use super::user::Username;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Online,
    TemporaryStop,
    Offline,
}

impl SessionStatus {
    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            SessionStatus::Online => "online",
            SessionStatus::TemporaryStop => "temporary_stop",
            SessionStatus::Offline => "offline",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "online" => Some(SessionStatus::Online),
            "temporary_stop" => Some(SessionStatus::TemporaryStop),
            "offline" => Some(SessionStatus::Offline),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionStatus::Online => "Online",
            SessionStatus::TemporaryStop => "On break",
            SessionStatus::Offline => "Offline",
        }
    }
}

/// A break interval inside a work day. `end_time` stays `None` while the
/// break is running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporaryStop {
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
}

impl TemporaryStop {
    pub fn open(start_time: NaiveDateTime) -> Self {
        Self {
            start_time,
            end_time: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// Duration in whole minutes; an open stop is measured up to `now`.
    pub fn minutes_until(&self, now: NaiveDateTime) -> i64 {
        let end = self.end_time.unwrap_or(now);
        (end - self.start_time).num_minutes().max(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: Username,
    pub status: SessionStatus,
    pub day_start_time: NaiveDateTime,
    pub day_end_time: Option<NaiveDateTime>,
    pub temporary_stops: Vec<TemporaryStop>,
    pub total_worked_minutes: i64,
    pub total_overtime_minutes: i64,
    pub total_temporary_stop_minutes: i64,
    pub temporary_stop_count: u32,
    pub last_activity: NaiveDateTime,
    /// Set on sessions force-reset to Offline while their day was still
    /// running; the ledger row of that day waits for reconciliation.
    pub awaiting_resolution: bool,
}

impl Session {
    /// Fresh Online session starting at `now` with zero totals.
    pub fn start(username: Username, now: NaiveDateTime) -> Self {
        Self {
            username,
            status: SessionStatus::Online,
            day_start_time: now,
            day_end_time: None,
            temporary_stops: Vec::new(),
            total_worked_minutes: 0,
            total_overtime_minutes: 0,
            total_temporary_stop_minutes: 0,
            temporary_stop_count: 0,
            last_activity: now,
            awaiting_resolution: false,
        }
    }

    pub fn work_date(&self) -> NaiveDate {
        self.day_start_time.date()
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            SessionStatus::Online | SessionStatus::TemporaryStop
        )
    }

    /// Still running, but started on an earlier calendar day.
    pub fn is_stale(&self, today: NaiveDate) -> bool {
        self.is_active() && self.work_date() < today
    }

    /// Ended normally on `today` and therefore eligible to be reopened.
    pub fn is_completed_on(&self, today: NaiveDate) -> bool {
        self.status == SessionStatus::Offline
            && !self.awaiting_resolution
            && self.day_end_time.is_some()
            && self.work_date() == today
    }

    pub fn open_stop(&self) -> Option<&TemporaryStop> {
        self.temporary_stops.last().filter(|s| s.is_open())
    }

    /// Close the running break at `at`. Returns false when no break is open.
    pub fn close_open_stop(&mut self, at: NaiveDateTime) -> bool {
        match self.temporary_stops.last_mut() {
            Some(stop) if stop.is_open() => {
                stop.end_time = Some(at.max(stop.start_time));
                true
            }
            _ => false,
        }
    }

    /// Cut the break list at `end`: breaks starting at or after it are
    /// dropped, the others (open ones included) end no later than `end`.
    pub fn clamp_stops_to(&mut self, end: NaiveDateTime) {
        self.temporary_stops.retain(|s| s.start_time < end);
        for stop in &mut self.temporary_stops {
            let stop_end = stop.end_time.map_or(end, |t| t.min(end));
            stop.end_time = Some(stop_end);
        }
    }

    /// Status and break list agree: only the last break may be open, and
    /// it is open exactly when the status is `TemporaryStop`.
    pub fn stops_consistent(&self) -> bool {
        let open = self.temporary_stops.iter().filter(|s| s.is_open()).count();
        let last_open = self.temporary_stops.last().is_some_and(|s| s.is_open());
        let paused = self.status == SessionStatus::TemporaryStop;
        open <= 1 && (open == 0 || last_open) && last_open == paused
    }
}
