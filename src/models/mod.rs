pub mod command_kind;
pub mod day_type;
pub mod session;
pub mod user;
pub mod worktime_entry;
