use crate::errors::{AppError, AppResult};
use crate::models::session::{Session, SessionStatus, TemporaryStop};
use crate::models::user::Username;
use crate::models::worktime_entry::{SyncState, TimeOffType, WorktimeEntry};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{Connection, OptionalExtension, Result, Row, params};

pub const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATE_FMT: &str = "%Y-%m-%d";

fn conversion_error(col: usize, err: AppError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(col, rusqlite::types::Type::Text, Box::new(err))
}

fn fmt_dt(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FMT).to_string()
}

fn fmt_opt_dt(dt: &Option<NaiveDateTime>) -> Option<String> {
    dt.as_ref().map(fmt_dt)
}

fn parse_dt(col: usize, s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT)
        .map_err(|_| conversion_error(col, AppError::InvalidTime(s.to_string())))
}

fn get_dt(row: &Row, name: &str) -> Result<NaiveDateTime> {
    let idx = row.as_ref().column_index(name)?;
    let raw: String = row.get(idx)?;
    parse_dt(idx, &raw)
}

fn get_opt_dt(row: &Row, name: &str) -> Result<Option<NaiveDateTime>> {
    let idx = row.as_ref().column_index(name)?;
    let raw: Option<String> = row.get(idx)?;
    match raw {
        Some(s) if !s.trim().is_empty() => parse_dt(idx, &s).map(Some),
        _ => Ok(None),
    }
}

fn get_username(row: &Row) -> Result<Username> {
    let idx = row.as_ref().column_index("username")?;
    let raw: String = row.get(idx)?;
    Username::parse(&raw).map_err(|e| conversion_error(idx, e))
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

pub fn map_session_row(row: &Row) -> Result<Session> {
    let status_str: String = row.get("status")?;
    let status = SessionStatus::from_db_str(&status_str).ok_or_else(|| {
        conversion_error(0, AppError::Persistence(format!("Invalid status: {}", status_str)))
    })?;

    let stops_json: String = row.get("temporary_stops")?;
    let temporary_stops: Vec<TemporaryStop> = serde_json::from_str(&stops_json)
        .map_err(|e| conversion_error(0, AppError::Json(e)))?;

    Ok(Session {
        username: get_username(row)?,
        status,
        day_start_time: get_dt(row, "day_start_time")?,
        day_end_time: get_opt_dt(row, "day_end_time")?,
        temporary_stops,
        total_worked_minutes: row.get("total_worked_minutes")?,
        total_overtime_minutes: row.get("total_overtime_minutes")?,
        total_temporary_stop_minutes: row.get("total_temporary_stop_minutes")?,
        temporary_stop_count: row.get("temporary_stop_count")?,
        last_activity: get_dt(row, "last_activity")?,
        awaiting_resolution: row.get::<_, i32>("awaiting_resolution")? == 1,
    })
}

pub fn load_session(conn: &Connection, user: &Username) -> AppResult<Option<Session>> {
    let mut stmt = conn.prepare_cached("SELECT * FROM sessions WHERE username = ?1")?;
    let session = stmt
        .query_row([user.as_str()], map_session_row)
        .optional()?;
    Ok(session)
}

pub fn load_sessions(conn: &Connection) -> AppResult<Vec<Session>> {
    let mut stmt = conn.prepare("SELECT * FROM sessions ORDER BY username ASC")?;
    let rows = stmt.query_map([], map_session_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Insert or replace the single session row of a user.
pub fn save_session(conn: &Connection, s: &Session) -> AppResult<()> {
    let stops_json = serde_json::to_string(&s.temporary_stops)?;

    conn.execute(
        "INSERT INTO sessions (username, status, day_start_time, day_end_time, temporary_stops,
                               total_worked_minutes, total_overtime_minutes,
                               total_temporary_stop_minutes, temporary_stop_count,
                               last_activity, awaiting_resolution)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
         ON CONFLICT(username) DO UPDATE SET
             status = excluded.status,
             day_start_time = excluded.day_start_time,
             day_end_time = excluded.day_end_time,
             temporary_stops = excluded.temporary_stops,
             total_worked_minutes = excluded.total_worked_minutes,
             total_overtime_minutes = excluded.total_overtime_minutes,
             total_temporary_stop_minutes = excluded.total_temporary_stop_minutes,
             temporary_stop_count = excluded.temporary_stop_count,
             last_activity = excluded.last_activity,
             awaiting_resolution = excluded.awaiting_resolution",
        params![
            s.username.as_str(),
            s.status.to_db_str(),
            fmt_dt(&s.day_start_time),
            fmt_opt_dt(&s.day_end_time),
            stops_json,
            s.total_worked_minutes,
            s.total_overtime_minutes,
            s.total_temporary_stop_minutes,
            s.temporary_stop_count,
            fmt_dt(&s.last_activity),
            if s.awaiting_resolution { 1 } else { 0 },
        ],
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Worktime entries
// ---------------------------------------------------------------------------

pub fn map_entry_row(row: &Row) -> Result<WorktimeEntry> {
    let date_str: String = row.get("work_date")?;
    let work_date = NaiveDate::parse_from_str(&date_str, DATE_FMT)
        .map_err(|_| conversion_error(0, AppError::InvalidDate(date_str.clone())))?;

    let time_off: Option<String> = row.get("time_off_type")?;
    let time_off_type = match time_off {
        Some(code) if !code.trim().is_empty() => {
            Some(TimeOffType::from_code(&code).ok_or_else(|| {
                conversion_error(
                    0,
                    AppError::Persistence(format!("Invalid time off type: {}", code)),
                )
            })?)
        }
        _ => None,
    };

    let sync_str: String = row.get("sync_state")?;
    let sync_state = SyncState::from_db_str(&sync_str).ok_or_else(|| {
        conversion_error(0, AppError::Persistence(format!("Invalid sync state: {}", sync_str)))
    })?;

    Ok(WorktimeEntry {
        username: get_username(row)?,
        work_date,
        day_start_time: get_opt_dt(row, "day_start_time")?,
        day_end_time: get_opt_dt(row, "day_end_time")?,
        temporary_stop_count: row.get("temporary_stop_count")?,
        total_temporary_stop_minutes: row.get("total_temporary_stop_minutes")?,
        total_worked_minutes: row.get("total_worked_minutes")?,
        regular_minutes: row.get("regular_minutes")?,
        total_overtime_minutes: row.get("total_overtime_minutes")?,
        lunch_break_deducted: row.get::<_, i32>("lunch_break_deducted")? == 1,
        time_off_type,
        sync_state,
        updated_at: get_dt(row, "updated_at")?,
    })
}

pub fn load_entry(
    conn: &Connection,
    user: &Username,
    date: &NaiveDate,
) -> AppResult<Option<WorktimeEntry>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM worktime_entries WHERE username = ?1 AND work_date = ?2",
    )?;
    let entry = stmt
        .query_row(
            params![user.as_str(), date.format(DATE_FMT).to_string()],
            map_entry_row,
        )
        .optional()?;
    Ok(entry)
}

pub fn load_entries(
    conn: &Connection,
    user: &Username,
    from: &NaiveDate,
    to: &NaiveDate,
) -> AppResult<Vec<WorktimeEntry>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM worktime_entries
         WHERE username = ?1 AND work_date BETWEEN ?2 AND ?3
         ORDER BY work_date ASC",
    )?;

    let rows = stmt.query_map(
        params![
            user.as_str(),
            from.format(DATE_FMT).to_string(),
            to.format(DATE_FMT).to_string()
        ],
        map_entry_row,
    )?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Insert or update the row of `(username, work_date)`.
pub fn save_entry(conn: &Connection, e: &WorktimeEntry) -> AppResult<()> {
    conn.execute(
        "INSERT INTO worktime_entries (username, work_date, day_start_time, day_end_time,
                                       temporary_stop_count, total_temporary_stop_minutes,
                                       total_worked_minutes, regular_minutes,
                                       total_overtime_minutes, lunch_break_deducted,
                                       time_off_type, sync_state, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
         ON CONFLICT(username, work_date) DO UPDATE SET
             day_start_time = excluded.day_start_time,
             day_end_time = excluded.day_end_time,
             temporary_stop_count = excluded.temporary_stop_count,
             total_temporary_stop_minutes = excluded.total_temporary_stop_minutes,
             total_worked_minutes = excluded.total_worked_minutes,
             regular_minutes = excluded.regular_minutes,
             total_overtime_minutes = excluded.total_overtime_minutes,
             lunch_break_deducted = excluded.lunch_break_deducted,
             time_off_type = excluded.time_off_type,
             sync_state = excluded.sync_state,
             updated_at = excluded.updated_at",
        params![
            e.username.as_str(),
            e.work_date.format(DATE_FMT).to_string(),
            fmt_opt_dt(&e.day_start_time),
            fmt_opt_dt(&e.day_end_time),
            e.temporary_stop_count,
            e.total_temporary_stop_minutes,
            e.total_worked_minutes,
            e.regular_minutes,
            e.total_overtime_minutes,
            if e.lunch_break_deducted { 1 } else { 0 },
            e.time_off_type.map(|t| t.code()),
            e.sync_state.to_db_str(),
            fmt_dt(&e.updated_at),
        ],
    )?;
    Ok(())
}

pub fn count_entries(conn: &Connection) -> AppResult<i64> {
    let n = conn.query_row("SELECT COUNT(*) FROM worktime_entries", [], |row| row.get(0))?;
    Ok(n)
}
