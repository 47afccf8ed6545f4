//! Per-day payroll ledger row.

use super::session::Session;
use super::user::Username;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Whether a ledger row still follows the live session or has been
/// finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncState {
    InProcess,
    UserInput,
    AutoEnded,
    Resolved,
    AdminEdited,
}

impl SyncState {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            SyncState::InProcess => "USER_IN_PROCESS",
            SyncState::UserInput => "USER_INPUT",
            SyncState::AutoEnded => "AUTO_ENDED",
            SyncState::Resolved => "RESOLVED",
            SyncState::AdminEdited => "ADMIN_EDITED",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "USER_IN_PROCESS" => Some(SyncState::InProcess),
            "USER_INPUT" => Some(SyncState::UserInput),
            "AUTO_ENDED" => Some(SyncState::AutoEnded),
            "RESOLVED" => Some(SyncState::Resolved),
            "ADMIN_EDITED" => Some(SyncState::AdminEdited),
            _ => None,
        }
    }

    pub fn is_admin_locked(&self) -> bool {
        matches!(self, SyncState::AdminEdited)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimeOffType {
    Weekend,
    Holiday,
    Vacation,
    Medical,
}

impl TimeOffType {
    pub fn code(&self) -> &'static str {
        match self {
            TimeOffType::Weekend => "Weekend",
            TimeOffType::Holiday => "Holiday",
            TimeOffType::Vacation => "Vacation",
            TimeOffType::Medical => "Medical",
        }
    }

    /// Case-insensitive; blank means "no time off".
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "weekend" => Some(TimeOffType::Weekend),
            "holiday" => Some(TimeOffType::Holiday),
            "vacation" => Some(TimeOffType::Vacation),
            "medical" => Some(TimeOffType::Medical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorktimeEntry {
    pub username: Username,
    pub work_date: NaiveDate,
    pub day_start_time: Option<NaiveDateTime>,
    pub day_end_time: Option<NaiveDateTime>,
    pub temporary_stop_count: u32,
    pub total_temporary_stop_minutes: i64,
    /// Net minutes at work (elapsed minus breaks).
    pub total_worked_minutes: i64,
    /// Schedule-capped component of the payroll minutes.
    pub regular_minutes: i64,
    pub total_overtime_minutes: i64,
    pub lunch_break_deducted: bool,
    pub time_off_type: Option<TimeOffType>,
    pub sync_state: SyncState,
    pub updated_at: NaiveDateTime,
}

impl WorktimeEntry {
    pub fn new(username: Username, work_date: NaiveDate, now: NaiveDateTime) -> Self {
        Self {
            username,
            work_date,
            day_start_time: None,
            day_end_time: None,
            temporary_stop_count: 0,
            total_temporary_stop_minutes: 0,
            total_worked_minutes: 0,
            regular_minutes: 0,
            total_overtime_minutes: 0,
            lunch_break_deducted: false,
            time_off_type: None,
            sync_state: SyncState::InProcess,
            updated_at: now,
        }
    }

    pub fn final_minutes(&self) -> i64 {
        self.regular_minutes + self.total_overtime_minutes
    }

    /// Started but never closed: left behind by a crash or a midnight reset.
    pub fn is_dangling(&self) -> bool {
        self.day_end_time.is_none() && self.sync_state == SyncState::InProcess
    }

    /// Copy the session-owned columns. Payroll minutes are set separately.
    pub fn copy_from_session(&mut self, session: &Session) {
        self.day_start_time = Some(session.day_start_time);
        self.day_end_time = session.day_end_time;
        self.temporary_stop_count = session.temporary_stop_count;
        self.total_temporary_stop_minutes = session.total_temporary_stop_minutes;
        self.total_worked_minutes = session.total_worked_minutes;
    }
}
