//! Session state machine.
//!
//! ```text
//! Offline -> Online -> (TemporaryStop <-> Online) -> Offline
//! ```
//!
//! Every request goes through [`SessionService::apply`]: the dedup guard
//! admits or rejects it, the matching transition validates the current
//! status and mutates the session, the calculation engine refreshes the
//! totals, and the synchronizer reconciles the day's ledger row.
//!
//! A transition whose precondition does not hold logs a warning and
//! returns [`Outcome::Unchanged`]; duplicate triggers from UI races are
//! expected and never fatal.

use crate::config::{AutoEndSettings, Config, LunchPolicy};
use crate::core::calculator::raw::{raw_minutes, stop_minutes};
use crate::core::calculator::work_time::{WorkTime, compute_work_time};
use crate::core::dedup::DedupGuard;
use crate::core::monitoring::{MonitoringDispatcher, TracingMonitor};
use crate::core::providers::{
    Clock, ConfigHolidays, ConfigSchedule, HolidayCalendar, ScheduleProvider,
};
use crate::core::special_day::detect_day_type;
use crate::core::sync::{EntryFields, EntryLookup, EntrySynchronizer};
use crate::core::transition::{Outcome, Transition};
use crate::db::store::WorktimeStore;
use crate::errors::{AppError, AppResult};
use crate::models::session::{Session, SessionStatus, TemporaryStop};
use crate::models::user::Username;
use crate::models::worktime_entry::{SyncState, WorktimeEntry};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Parameters shared by EndDay and AutoEnd.
#[derive(Debug, Clone, Copy)]
struct EndRequest {
    end_time: Option<NaiveDateTime>,
    worked_minutes: Option<i64>,
    sync_state: SyncState,
}

/// Read-only view of a session with live totals.
#[derive(Debug, Clone)]
pub struct SessionStatusView {
    pub session: Session,
    /// Worked minutes up to now; a running break is not counted as work.
    pub live_worked_minutes: i64,
    pub live_stop_minutes: i64,
    pub work_time: WorkTime,
}

pub struct SessionService {
    store: Arc<dyn WorktimeStore>,
    clock: Arc<dyn Clock>,
    schedule: Arc<dyn ScheduleProvider>,
    holidays: Arc<dyn HolidayCalendar>,
    monitor: Arc<dyn MonitoringDispatcher>,
    lunch: LunchPolicy,
    auto_end: AutoEndSettings,
    guard: DedupGuard,
    sessions: Mutex<HashMap<Username, Session>>,
}

/// Last minute of `date`; where a forgotten day is cut off.
fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN))
}

impl SessionService {
    /// Service wired from the configuration: config schedules and holidays,
    /// tracing monitor.
    pub fn new(
        store: Arc<dyn WorktimeStore>,
        clock: Arc<dyn Clock>,
        cfg: &Config,
    ) -> AppResult<Self> {
        Ok(Self {
            store,
            clock,
            schedule: Arc::new(ConfigSchedule::from_config(cfg)),
            holidays: Arc::new(ConfigHolidays::parse(&cfg.holidays)?),
            monitor: Arc::new(TracingMonitor),
            lunch: cfg.lunch.clone(),
            auto_end: cfg.auto_end.clone(),
            guard: DedupGuard::new(cfg.dedup.clone()),
            sessions: Mutex::new(HashMap::new()),
        })
    }

    pub fn with_schedule(mut self, schedule: Arc<dyn ScheduleProvider>) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_holidays(mut self, holidays: Arc<dyn HolidayCalendar>) -> Self {
        self.holidays = holidays;
        self
    }

    pub fn with_monitor(mut self, monitor: Arc<dyn MonitoringDispatcher>) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn guard(&self) -> &DedupGuard {
        &self.guard
    }

    // ── Entry points ─────────────────────────────────────────────────

    /// Run `transition` for `user` behind the dedup guard.
    pub fn apply(&self, user: &Username, transition: Transition) -> AppResult<Outcome> {
        let kind = transition.kind();
        self.guard
            .run(user, kind, Ok(Outcome::Debounced), || self.dispatch(user, transition))
    }

    pub fn start_day(&self, user: &Username) -> AppResult<Outcome> {
        self.apply(user, Transition::StartDay)
    }

    pub fn start_temporary_stop(&self, user: &Username) -> AppResult<Outcome> {
        self.apply(user, Transition::StartTemporaryStop)
    }

    pub fn resume(&self, user: &Username) -> AppResult<Outcome> {
        self.apply(user, Transition::Resume)
    }

    pub fn end_day(
        &self,
        user: &Username,
        end_time: Option<NaiveDateTime>,
        worked_minutes: Option<i64>,
    ) -> AppResult<Outcome> {
        self.apply(
            user,
            Transition::EndDay {
                end_time,
                worked_minutes,
            },
        )
    }

    pub fn auto_end_session(
        &self,
        user: &Username,
        scheduled_end: NaiveDateTime,
    ) -> AppResult<Outcome> {
        self.apply(user, Transition::AutoEnd { scheduled_end })
    }

    pub fn resolve_work_time_entry(
        &self,
        user: &Username,
        date: NaiveDate,
        end_time: Option<NaiveDateTime>,
    ) -> AppResult<Outcome> {
        self.apply(user, Transition::Resolve { date, end_time })
    }

    fn dispatch(&self, user: &Username, transition: Transition) -> AppResult<Outcome> {
        match transition {
            Transition::StartDay => self.run_start_day(user),
            Transition::StartTemporaryStop => self.run_start_temporary_stop(user),
            Transition::Resume => self.run_resume(user),
            Transition::EndDay {
                end_time,
                worked_minutes,
            } => self.run_end_day(
                user,
                EndRequest {
                    end_time,
                    worked_minutes,
                    sync_state: SyncState::UserInput,
                },
            ),
            Transition::AutoEnd { scheduled_end } => self.run_auto_end(user, scheduled_end),
            Transition::Resolve { date, end_time } => self.run_resolve(user, date, end_time),
        }
    }

    // ── Session cache ────────────────────────────────────────────────

    fn cache(&self) -> MutexGuard<'_, HashMap<Username, Session>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// In-memory session, falling back to the durable copy.
    pub fn session(&self, user: &Username) -> AppResult<Option<Session>> {
        if let Some(s) = self.cache().get(user) {
            return Ok(Some(s.clone()));
        }

        let stored = self.store.read_session(user)?;
        if let Some(s) = &stored {
            self.cache().insert(user.clone(), s.clone());
        }
        Ok(stored)
    }

    /// Mirror to durable storage first, then to memory.
    fn save_session(&self, session: &Session) -> AppResult<()> {
        self.store.write_session(session)?;
        self.cache()
            .insert(session.username.clone(), session.clone());
        Ok(())
    }

    fn synchronizer(&self) -> EntrySynchronizer<'_> {
        EntrySynchronizer::new(self.store.as_ref(), self.holidays.as_ref())
    }

    // ── Totals ───────────────────────────────────────────────────────

    /// Recompute every running total of `session` up to `until`.
    fn refresh_totals(&self, session: &mut Session, until: NaiveDateTime) -> AppResult<WorkTime> {
        let raw = raw_minutes(
            session.day_start_time,
            until,
            &session.temporary_stops,
            false,
        );
        let hours = self.schedule.schedule_hours_for(&session.username);
        let work_time = compute_work_time(raw, hours, &self.lunch)?;

        session.total_worked_minutes = raw;
        session.total_overtime_minutes = work_time.overtime_minutes;
        session.total_temporary_stop_minutes = stop_minutes(&session.temporary_stops, until, false);
        session.temporary_stop_count = session.temporary_stops.len() as u32;

        Ok(work_time)
    }

    fn notify<F>(&self, what: &str, user: &Username, dispatch: F)
    where
        F: FnOnce(&dyn MonitoringDispatcher) -> AppResult<()>,
    {
        if let Err(e) = dispatch(self.monitor.as_ref()) {
            warn!(user = %user, error = %e, "{} failed, transition kept", what);
        }
    }

    /// Hourly reminders once the day's schedule is covered, regular
    /// schedule monitoring otherwise.
    fn dispatch_after_resume(&self, session: &Session, work_time: &WorkTime, now: NaiveDateTime) {
        let user = &session.username;
        let scheduled = self.schedule.scheduled_minutes_for(user, session.work_date());

        if work_time.adjusted_minutes >= scheduled {
            self.notify("activate_hourly_monitoring", user, |m| {
                m.activate_hourly_monitoring(user, now)
            });
        } else {
            self.notify("resume_schedule_monitoring", user, |m| {
                m.resume_schedule_monitoring(user)
            });
        }
    }

    /// Close a previous-day session left running. Its ledger row stays in
    /// process until resolved.
    fn force_reset(&self, session: &mut Session, now: NaiveDateTime) -> AppResult<()> {
        let cutoff = end_of_day(session.work_date()).min(now);

        session.close_open_stop(cutoff);
        session.status = SessionStatus::Offline;
        session.day_end_time = None;
        session.awaiting_resolution = true;
        session.total_temporary_stop_minutes = stop_minutes(&session.temporary_stops, cutoff, false);
        session.temporary_stop_count = session.temporary_stops.len() as u32;
        session.last_activity = now;

        self.save_session(session)?;
        warn!(
            user = %session.username,
            date = %session.work_date(),
            "stale session reset to offline, worktime entry awaits resolution"
        );
        let user = &session.username;
        self.notify("stop_monitoring", user, |m| m.stop_monitoring(user));
        Ok(())
    }

    // ── Transitions ──────────────────────────────────────────────────

    fn run_start_day(&self, user: &Username) -> AppResult<Outcome> {
        let now = self.clock.now();
        let today = now.date();

        if let Some(mut existing) = self.session(user)? {
            if existing.is_stale(today) {
                self.force_reset(&mut existing, now)?;
            } else if existing.is_active() {
                warn!(user = %user, status = existing.status.label(), "day already started");
                return Ok(Outcome::Unchanged(Some(existing)));
            } else if existing.is_completed_on(today) {
                warn!(user = %user, "day already completed, resume it to reopen");
                return Ok(Outcome::Unchanged(Some(existing)));
            }
        }

        let mut session = Session::start(user.clone(), now);
        let work_time = self.refresh_totals(&mut session, now)?;
        self.save_session(&session)?;

        let fields = EntryFields::from_session(&session, SyncState::InProcess);
        self.synchronizer()
            .synchronize(&session, &work_time, fields, EntryLookup::FindOrCreate, now)?;

        self.notify("start_monitoring", user, |m| m.start_monitoring(user));
        info!(user = %user, at = %now, "day started");
        Ok(Outcome::Applied(session))
    }

    fn run_start_temporary_stop(&self, user: &Username) -> AppResult<Outcome> {
        let now = self.clock.now();

        let Some(mut session) = self.session(user)? else {
            warn!(user = %user, "no session, cannot start a temporary stop");
            return Ok(Outcome::Unchanged(None));
        };
        if session.status != SessionStatus::Online {
            warn!(user = %user, status = session.status.label(), "temporary stop requires an online session");
            return Ok(Outcome::Unchanged(Some(session)));
        }

        session.temporary_stops.push(TemporaryStop::open(now));
        session.status = SessionStatus::TemporaryStop;
        session.last_activity = now;
        let work_time = self.refresh_totals(&mut session, now)?;
        self.save_session(&session)?;

        let fields = EntryFields::from_session(&session, SyncState::InProcess);
        self.synchronizer()
            .synchronize(&session, &work_time, fields, EntryLookup::RequireExisting, now)?;

        self.notify("stop_monitoring", user, |m| m.stop_monitoring(user));
        info!(user = %user, at = %now, stops = session.temporary_stop_count, "temporary stop started");
        Ok(Outcome::Applied(session))
    }

    fn run_resume(&self, user: &Username) -> AppResult<Outcome> {
        let now = self.clock.now();

        let Some(mut session) = self.session(user)? else {
            warn!(user = %user, "no session to resume");
            return Ok(Outcome::Unchanged(None));
        };

        match session.status {
            SessionStatus::TemporaryStop => {
                session.close_open_stop(now);
            }
            SessionStatus::Offline if session.is_completed_on(now.date()) => {
                if let Some(outcome) = self.reopen_guard(&session)? {
                    return Ok(outcome);
                }
                // The time spent clocked out becomes a break.
                if let Some(ended) = session.day_end_time.take()
                    && now > ended
                {
                    session.temporary_stops.push(TemporaryStop {
                        start_time: ended,
                        end_time: Some(now),
                    });
                }
                info!(user = %user, "completed day reopened");
            }
            _ => {
                warn!(user = %user, status = session.status.label(), "nothing to resume");
                return Ok(Outcome::Unchanged(Some(session)));
            }
        }

        session.status = SessionStatus::Online;
        session.last_activity = now;
        let work_time = self.refresh_totals(&mut session, now)?;
        self.save_session(&session)?;

        let fields = EntryFields::from_session(&session, SyncState::InProcess);
        self.synchronizer()
            .synchronize(&session, &work_time, fields, EntryLookup::RequireExisting, now)?;

        self.dispatch_after_resume(&session, &work_time, now);
        info!(user = %user, at = %now, "resumed");
        Ok(Outcome::Applied(session))
    }

    /// A completed day whose row an administrator finalized stays closed.
    fn reopen_guard(&self, session: &Session) -> AppResult<Option<Outcome>> {
        let entry = self
            .store
            .read_entry(&session.username, session.work_date())?;

        if entry.is_some_and(|e| e.sync_state.is_admin_locked()) {
            warn!(user = %session.username, "day finalized by an administrator, cannot reopen");
            return Ok(Some(Outcome::Unchanged(Some(session.clone()))));
        }
        Ok(None)
    }

    fn run_end_day(&self, user: &Username, request: EndRequest) -> AppResult<Outcome> {
        let now = self.clock.now();

        let Some(mut session) = self.session(user)? else {
            warn!(user = %user, "no session to end");
            return Ok(Outcome::Unchanged(None));
        };

        let unresolved = session.status == SessionStatus::Offline && session.awaiting_resolution;
        if !session.is_active() && !unresolved {
            warn!(user = %user, "day already ended");
            return Ok(Outcome::Unchanged(Some(session)));
        }

        let end = match request.end_time {
            Some(t) => t,
            None if unresolved => end_of_day(session.work_date()).min(now),
            None => now,
        };
        if end < session.day_start_time {
            return Err(AppError::InvalidTime(format!(
                "end time {} is before the day start {}",
                end, session.day_start_time
            )));
        }

        let hours = self.schedule.schedule_hours_for(user);
        let date = session.work_date();
        let before = session.clone();

        session.close_open_stop(end);
        session.status = SessionStatus::Offline;
        session.day_end_time = Some(end);
        session.awaiting_resolution = false;
        session.last_activity = now;
        let measured = self.refresh_totals(&mut session, end)?;

        let pending = self
            .synchronizer()
            .prepare(user, date, EntryLookup::FindOrCreate, now)?;
        let day_type = pending
            .as_ref()
            .map(|p| p.day_type())
            .unwrap_or_else(|| detect_day_type(date, None, self.holidays.as_ref()));

        let work_time = match request.worked_minutes {
            Some(minutes) => {
                session.total_worked_minutes = minutes;
                WorkTime::from_override(minutes, hours)?
            }
            None if day_type.is_special() => measured,
            None => {
                measured.with_scheduled_overtime(self.schedule.scheduled_minutes_for(user, date))
            }
        };
        session.total_overtime_minutes = if day_type.is_special() {
            session.total_worked_minutes
        } else {
            work_time.overtime_minutes
        };

        self.save_session(&session)?;

        if let Some(pending) = pending {
            let fields = EntryFields::from_session(&session, request.sync_state);
            let committed = self
                .synchronizer()
                .commit(pending, &session, &work_time, fields, now);

            // Keep the session running so that a retry can end it again.
            if let Err(e) = committed {
                if let Err(restore) = self.save_session(&before) {
                    warn!(user = %user, error = %restore, "could not restore session after failed ledger write");
                }
                return Err(e);
            }
        }

        self.notify("stop_monitoring", user, |m| m.stop_monitoring(user));
        info!(
            user = %user,
            at = %end,
            worked = session.total_worked_minutes,
            overtime = session.total_overtime_minutes,
            state = request.sync_state.to_db_str(),
            "day ended"
        );
        Ok(Outcome::Applied(session))
    }

    /// EndDay on behalf of the scheduler, retried while it races with
    /// user-triggered transitions.
    fn run_auto_end(&self, user: &Username, scheduled_end: NaiveDateTime) -> AppResult<Outcome> {
        let attempts = self.auto_end.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            let request = EndRequest {
                end_time: Some(scheduled_end),
                worked_minutes: None,
                sync_state: SyncState::AutoEnded,
            };

            match self.run_end_day(user, request) {
                Ok(outcome) => return Ok(outcome),
                Err(e @ (AppError::Validation(_) | AppError::InvalidTime(_))) => return Err(e),
                Err(e) => {
                    warn!(user = %user, attempt, error = %e, "auto-end attempt failed");
                    last_error = e.to_string();
                    if attempt < attempts {
                        thread::sleep(Duration::from_millis(self.auto_end.retry_delay_ms) * attempt);
                    }
                }
            }
        }

        Err(AppError::AutoEndFailed {
            user: user.to_string(),
            attempts,
            last_error,
        })
    }

    fn run_resolve(
        &self,
        user: &Username,
        date: NaiveDate,
        end_time: Option<NaiveDateTime>,
    ) -> AppResult<Outcome> {
        let now = self.clock.now();

        let entry = self.store.read_entry(user, date)?;
        let mut entry = match entry {
            Some(e) if e.is_dangling() && e.day_start_time.is_some() => e,
            Some(_) => {
                warn!(user = %user, %date, "worktime entry is not pending, nothing to resolve");
                return Ok(Outcome::Unchanged(self.session(user)?));
            }
            None => {
                warn!(user = %user, %date, "no worktime entry to resolve");
                return Ok(Outcome::Unchanged(self.session(user)?));
            }
        };

        let Some(start) = entry.day_start_time else {
            return Ok(Outcome::Unchanged(self.session(user)?));
        };
        // A past day without an explicit end is closed at 23:59, like EndDay
        // on a reset session.
        let end = match end_time {
            Some(t) => t,
            None if date < now.date() => end_of_day(date).min(now),
            None => now,
        };
        if end < start {
            return Err(AppError::InvalidTime(format!(
                "end time {} is before the day start {}",
                end, start
            )));
        }

        let today = now.date();
        let mut left_behind = self.session(user)?.filter(|s| {
            s.work_date() == date && (s.awaiting_resolution || s.is_stale(today))
        });

        let (raw, stop_count, stop_total) = match left_behind.as_mut() {
            Some(session) => {
                session.clamp_stops_to(end);
                (
                    raw_minutes(start, end, &session.temporary_stops, false),
                    session.temporary_stops.len() as u32,
                    stop_minutes(&session.temporary_stops, end, false),
                )
            }
            None => (
                ((end - start).num_minutes() - entry.total_temporary_stop_minutes).max(0),
                entry.temporary_stop_count,
                entry.total_temporary_stop_minutes,
            ),
        };

        let hours = self.schedule.schedule_hours_for(user);
        let sync = self.synchronizer();
        let day_type = sync.day_type_of(&entry);

        let work_time = compute_work_time(raw, hours, &self.lunch)?;
        let work_time = if day_type.is_special() {
            work_time
        } else {
            work_time.with_scheduled_overtime(self.schedule.scheduled_minutes_for(user, date))
        };

        entry.day_end_time = Some(end);
        entry.total_worked_minutes = raw;
        let fields = EntryFields {
            sync_state: Some(SyncState::Resolved),
            temporary_stop_count: Some(stop_count),
            total_temporary_stop_minutes: Some(stop_total),
        };
        sync.reconcile(&mut entry, day_type, &work_time, fields, now)?;

        if let Some(session) = left_behind {
            self.close_resolved_session(session, &entry, end, now)?;
        }

        info!(user = %user, %date, worked = raw, "dangling worktime entry resolved");
        Ok(Outcome::Resolved(entry))
    }

    /// Bring the session left behind for the resolved day in line with it.
    /// Its breaks are already cut at `end`.
    fn close_resolved_session(
        &self,
        mut session: Session,
        entry: &WorktimeEntry,
        end: NaiveDateTime,
        now: NaiveDateTime,
    ) -> AppResult<()> {
        session.status = SessionStatus::Offline;
        session.day_end_time = Some(end);
        session.awaiting_resolution = false;
        session.total_worked_minutes = entry.total_worked_minutes;
        session.total_overtime_minutes = entry.total_overtime_minutes;
        session.total_temporary_stop_minutes = stop_minutes(&session.temporary_stops, end, false);
        session.temporary_stop_count = session.temporary_stops.len() as u32;
        session.last_activity = now;
        self.save_session(&session)
    }

    // ── Maintenance and queries ──────────────────────────────────────

    /// Force-reset every session still running from an earlier day.
    /// Returns the users that were reset.
    pub fn reset_stale_sessions(&self) -> AppResult<Vec<Username>> {
        let now = self.clock.now();
        let mut reset = Vec::new();

        for stored in self.store.list_sessions()? {
            let cached = self.cache().get(&stored.username).cloned();
            let mut session = cached.unwrap_or(stored);

            if session.is_stale(now.date()) {
                self.force_reset(&mut session, now)?;
                reset.push(session.username.clone());
            }
        }

        Ok(reset)
    }

    /// Administrative finalize of a day's ledger row.
    pub fn finalize_entry(
        &self,
        user: &Username,
        date: NaiveDate,
        worked_minutes: i64,
        overtime_minutes: i64,
    ) -> AppResult<WorktimeEntry> {
        let entry = self.synchronizer().finalize(
            user,
            date,
            worked_minutes,
            overtime_minutes,
            self.clock.now(),
        )?;
        info!(user = %user, %date, "worktime entry finalized by administrator");
        Ok(entry)
    }

    /// Session snapshot with live totals; a running break counts up to now.
    pub fn status(&self, user: &Username) -> AppResult<Option<SessionStatusView>> {
        let Some(session) = self.session(user)? else {
            return Ok(None);
        };

        let now = self.clock.now();
        let until = session.day_end_time.unwrap_or(now);
        let live_worked = raw_minutes(session.day_start_time, until, &session.temporary_stops, true);
        let live_stops = stop_minutes(&session.temporary_stops, until, true);
        let hours = self.schedule.schedule_hours_for(user);
        let work_time = compute_work_time(live_worked, hours, &self.lunch)?;

        Ok(Some(SessionStatusView {
            session,
            live_worked_minutes: live_worked,
            live_stop_minutes: live_stops,
            work_time,
        }))
    }

    pub fn entries(
        &self,
        user: &Username,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<WorktimeEntry>> {
        self.store.list_entries(user, from, to)
    }

    pub fn entry(&self, user: &Username, date: NaiveDate) -> AppResult<Option<WorktimeEntry>> {
        self.store.read_entry(user, date)
    }
}
