pub mod calculator;
pub mod config;
pub mod dedup;
pub mod log;
pub mod monitoring;
pub mod providers;
pub mod special_day;
pub mod state_machine;
pub mod sync;
pub mod transition;
