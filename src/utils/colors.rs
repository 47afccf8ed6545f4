/// ANSI color helper utilities for terminal output.
use crate::models::session::SessionStatus;
use crate::models::worktime_entry::SyncState;

pub const RESET: &str = "\x1b[0m";

pub const GREY: &str = "\x1b[90m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const BLUE: &str = "\x1b[34m";
pub const CYAN: &str = "\x1b[36m";
pub const MAGENTA: &str = "\x1b[35m";

pub fn color_for_status(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::Online => GREEN,
        SessionStatus::TemporaryStop => YELLOW,
        SessionStatus::Offline => GREY,
    }
}

pub fn color_for_sync_state(state: SyncState) -> &'static str {
    match state {
        SyncState::InProcess => YELLOW,
        SyncState::UserInput => GREEN,
        SyncState::AutoEnded => CYAN,
        SyncState::Resolved => BLUE,
        SyncState::AdminEdited => MAGENTA,
    }
}

/// Overtime color:
/// \>0 → green
/// 0 → reset
pub fn color_for_overtime(value: i64) -> &'static str {
    if value > 0 { GREEN } else if value < 0 { RED } else { RESET }
}

pub fn paint(color: &str, text: &str) -> String {
    format!("{}{}{}", color, text, RESET)
}
