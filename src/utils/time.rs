//! Time utilities: parsing `HH:MM` and full timestamps.

use crate::errors::{AppError, AppResult};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

const DATETIME_INPUTS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"];

pub fn parse_time(t: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(t.trim(), "%H:%M").ok()
}

/// Full timestamp (`YYYY-MM-DD HH:MM[:SS]`).
pub fn parse_datetime(s: &str) -> AppResult<NaiveDateTime> {
    let s = s.trim();
    DATETIME_INPUTS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .ok_or_else(|| AppError::InvalidTime(s.to_string()))
}

/// Either a full timestamp or a bare `HH:MM` taken on `date`.
pub fn parse_datetime_on(s: &str, date: NaiveDate) -> AppResult<NaiveDateTime> {
    match parse_time(s) {
        Some(t) => Ok(date.and_time(t)),
        None => parse_datetime(s),
    }
}

pub fn parse_optional_datetime_on(
    input: Option<&String>,
    date: NaiveDate,
) -> AppResult<Option<NaiveDateTime>> {
    input.map(|s| parse_datetime_on(s, date)).transpose()
}

pub fn format_clock(dt: Option<NaiveDateTime>) -> String {
    dt.map(|d| d.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}
