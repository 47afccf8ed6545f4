//! Notifications sent to the activity monitor after transitions.
//!
//! Dispatches are fire-and-forget: the session engine logs a failed
//! dispatch and carries on.

use crate::errors::AppResult;
use crate::models::user::Username;
use chrono::NaiveDateTime;
use tracing::info;

pub trait MonitoringDispatcher: Send + Sync {
    fn start_monitoring(&self, user: &Username) -> AppResult<()>;
    fn stop_monitoring(&self, user: &Username) -> AppResult<()>;
    /// Schedule fulfilled: switch to hourly reminders counted from `since`.
    fn activate_hourly_monitoring(&self, user: &Username, since: NaiveDateTime) -> AppResult<()>;
    fn resume_schedule_monitoring(&self, user: &Username) -> AppResult<()>;
}

/// Dispatcher that only records the request in the diagnostic log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMonitor;

impl MonitoringDispatcher for TracingMonitor {
    fn start_monitoring(&self, user: &Username) -> AppResult<()> {
        info!(user = %user, "monitoring started");
        Ok(())
    }

    fn stop_monitoring(&self, user: &Username) -> AppResult<()> {
        info!(user = %user, "monitoring stopped");
        Ok(())
    }

    fn activate_hourly_monitoring(&self, user: &Username, since: NaiveDateTime) -> AppResult<()> {
        info!(user = %user, since = %since, "hourly monitoring activated");
        Ok(())
    }

    fn resume_schedule_monitoring(&self, user: &Username) -> AppResult<()> {
        info!(user = %user, "schedule monitoring resumed");
        Ok(())
    }
}
