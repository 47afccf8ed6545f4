//! Weekend / holiday / time-off classification and the overtime override
//! applied to such days.

use crate::core::providers::HolidayCalendar;
use crate::models::day_type::DayType;
use crate::models::worktime_entry::{SyncState, TimeOffType, WorktimeEntry};
use chrono::{Datelike, NaiveDate, Weekday};

/// Classify `date`. A time-off code already on the ledger row wins over
/// the calendar.
pub fn detect_day_type(
    date: NaiveDate,
    existing: Option<&WorktimeEntry>,
    holidays: &dyn HolidayCalendar,
) -> DayType {
    if existing.is_some_and(|e| e.time_off_type.is_some()) {
        return DayType::PreExistingTimeOff;
    }

    match date.weekday() {
        Weekday::Sat | Weekday::Sun => DayType::Weekend,
        _ if holidays.is_holiday(date) => DayType::Holiday,
        _ => DayType::Regular,
    }
}

/// Time-off code written on a special day's row.
pub fn time_off_code(day_type: DayType, current: Option<TimeOffType>) -> Option<TimeOffType> {
    match day_type {
        DayType::Regular => current,
        DayType::Weekend => Some(TimeOffType::Weekend),
        DayType::Holiday => Some(TimeOffType::Holiday),
        DayType::PreExistingTimeOff => current,
    }
}

/// Rebuild `entry` as a special-day row: contracted hours do not apply, so
/// every worked minute becomes overtime.
///
/// The rebuilt row starts from a clean transition state (in process, no
/// breaks recorded); callers re-apply their own fields afterwards.
pub fn apply_special_day_override(entry: &mut WorktimeEntry, day_type: DayType) {
    if !day_type.is_special() {
        return;
    }

    entry.time_off_type = time_off_code(day_type, entry.time_off_type);
    entry.regular_minutes = 0;
    entry.total_overtime_minutes = entry.total_worked_minutes;
    entry.lunch_break_deducted = false;

    entry.sync_state = SyncState::InProcess;
    entry.temporary_stop_count = 0;
    entry.total_temporary_stop_minutes = 0;
}
