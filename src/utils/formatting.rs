//! Formatting utilities used for CLI outputs.

use crate::models::worktime_entry::WorktimeEntry;

pub fn mins2readable(mins: i64, want_sign: bool, short: bool) -> String {
    let abs_m = mins.abs();
    let hours = abs_m / 60;
    let minutes = abs_m % 60;

    let sign = match (want_sign, mins.signum()) {
        (true, 1) => "+",
        (true, -1) => "-",
        _ => "",
    };

    if short {
        format!("{}{:02}:{:02}", sign, hours, minutes)
    } else {
        format!("{}{:02}h {:02}m", sign, hours, minutes)
    }
}

/// `Weekend`, `Holiday`, … or `-` for ordinary days.
pub fn describe_time_off(entry: &WorktimeEntry) -> &'static str {
    entry.time_off_type.map(|t| t.code()).unwrap_or("-")
}

pub fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}
