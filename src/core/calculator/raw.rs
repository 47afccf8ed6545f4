//! Raw worked minutes: elapsed wall-clock time minus breaks.

use crate::models::session::TemporaryStop;
use chrono::NaiveDateTime;

/// Total break minutes. The open break, if any, is measured up to `now`
/// and only counted when `include_open` is set (live display).
pub fn stop_minutes(stops: &[TemporaryStop], now: NaiveDateTime, include_open: bool) -> i64 {
    stops
        .iter()
        .filter(|s| include_open || !s.is_open())
        .map(|s| s.minutes_until(now))
        .sum()
}

/// `(until - start)` in minutes minus break minutes, never negative.
pub fn raw_minutes(
    start: NaiveDateTime,
    until: NaiveDateTime,
    stops: &[TemporaryStop],
    include_open: bool,
) -> i64 {
    let elapsed = (until - start).num_minutes();
    (elapsed - stop_minutes(stops, until, include_open)).max(0)
}
