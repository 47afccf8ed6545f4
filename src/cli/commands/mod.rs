pub mod auto_end;
pub mod config;
pub mod context;
pub mod end;
pub mod entries;
pub mod finalize;
pub mod init;
pub mod log;
pub mod midnight_reset;
pub mod pause;
pub mod resolve;
pub mod resume;
pub mod start;
pub mod status;
