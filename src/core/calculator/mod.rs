pub mod raw;
pub mod work_time;
