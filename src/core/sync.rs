//! Worktime entry synchronizer: brings the day's ledger row in line with
//! the session after every transition.

use crate::core::calculator::work_time::WorkTime;
use crate::core::providers::HolidayCalendar;
use crate::core::special_day::{apply_special_day_override, detect_day_type};
use crate::db::store::WorktimeStore;
use crate::errors::{AppError, AppResult};
use crate::models::day_type::DayType;
use crate::models::session::Session;
use crate::models::user::Username;
use crate::models::worktime_entry::{SyncState, WorktimeEntry};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, warn};

/// How a transition locates its ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryLookup {
    /// Start, End and AutoEnd create the row when it is missing.
    FindOrCreate,
    /// Pause, Resume and Resolve only touch an existing row.
    RequireExisting,
}

/// Fields owned by the calling transition rather than by the session copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFields {
    pub sync_state: Option<SyncState>,
    pub temporary_stop_count: Option<u32>,
    pub total_temporary_stop_minutes: Option<i64>,
}

impl EntryFields {
    /// Sync state plus the break counters of `session`.
    pub fn from_session(session: &Session, sync_state: SyncState) -> Self {
        Self {
            sync_state: Some(sync_state),
            temporary_stop_count: Some(session.temporary_stop_count),
            total_temporary_stop_minutes: Some(session.total_temporary_stop_minutes),
        }
    }

    pub fn apply(&self, entry: &mut WorktimeEntry) {
        if let Some(state) = self.sync_state {
            entry.sync_state = state;
        }
        if let Some(count) = self.temporary_stop_count {
            entry.temporary_stop_count = count;
        }
        if let Some(minutes) = self.total_temporary_stop_minutes {
            entry.total_temporary_stop_minutes = minutes;
        }
    }
}

/// Customization → special-day override → customization again.
///
/// The override rebuilds special-day rows and resets transition fields, so
/// the transition's own fields must be written once more after it.
#[derive(Debug, Clone)]
pub struct SyncPipeline {
    fields: EntryFields,
    day_type: DayType,
}

impl SyncPipeline {
    pub fn new(fields: EntryFields, day_type: DayType) -> Self {
        Self { fields, day_type }
    }

    pub fn run(&self, entry: &mut WorktimeEntry) {
        self.fields.apply(entry);
        apply_special_day_override(entry, self.day_type);
        self.fields.apply(entry);
    }
}

/// Ledger row located (or created) for a transition, with the day type
/// computed from its state before any change.
#[derive(Debug, Clone)]
pub struct PendingEntry {
    entry: WorktimeEntry,
    day_type: DayType,
}

impl PendingEntry {
    pub fn day_type(&self) -> DayType {
        self.day_type
    }

    pub fn entry(&self) -> &WorktimeEntry {
        &self.entry
    }
}

pub struct EntrySynchronizer<'a> {
    store: &'a dyn WorktimeStore,
    holidays: &'a dyn HolidayCalendar,
}

impl<'a> EntrySynchronizer<'a> {
    pub fn new(store: &'a dyn WorktimeStore, holidays: &'a dyn HolidayCalendar) -> Self {
        Self { store, holidays }
    }

    pub fn day_type_of(&self, entry: &WorktimeEntry) -> DayType {
        detect_day_type(entry.work_date, Some(entry), self.holidays)
    }

    /// Locate the row for `(user, date)`. `None` means a required row is
    /// missing; the inconsistency is logged, not repaired.
    pub fn prepare(
        &self,
        user: &Username,
        date: NaiveDate,
        lookup: EntryLookup,
        now: NaiveDateTime,
    ) -> AppResult<Option<PendingEntry>> {
        let entry = match (self.store.read_entry(user, date)?, lookup) {
            (Some(entry), _) => entry,
            (None, EntryLookup::FindOrCreate) => {
                debug!(user = %user, %date, "creating worktime entry");
                WorktimeEntry::new(user.clone(), date, now)
            }
            (None, EntryLookup::RequireExisting) => {
                warn!(user = %user, %date, "no worktime entry for this day, ledger left untouched");
                return Ok(None);
            }
        };

        let day_type = self.day_type_of(&entry);
        Ok(Some(PendingEntry { entry, day_type }))
    }

    /// Copy the session onto the row, run the pipeline and persist.
    /// Administratively edited rows are returned unchanged.
    pub fn commit(
        &self,
        pending: PendingEntry,
        session: &Session,
        work_time: &WorkTime,
        fields: EntryFields,
        now: NaiveDateTime,
    ) -> AppResult<WorktimeEntry> {
        let PendingEntry {
            mut entry,
            day_type,
        } = pending;

        if entry.sync_state.is_admin_locked() {
            warn!(
                user = %entry.username,
                date = %entry.work_date,
                "worktime entry was finalized by an administrator, not overwritten"
            );
            return Ok(entry);
        }

        entry.copy_from_session(session);
        self.reconcile(&mut entry, day_type, work_time, fields, now)?;
        Ok(entry)
    }

    pub fn synchronize(
        &self,
        session: &Session,
        work_time: &WorkTime,
        fields: EntryFields,
        lookup: EntryLookup,
        now: NaiveDateTime,
    ) -> AppResult<Option<WorktimeEntry>> {
        match self.prepare(&session.username, session.work_date(), lookup, now)? {
            Some(pending) => self
                .commit(pending, session, work_time, fields, now)
                .map(Some),
            None => Ok(None),
        }
    }

    /// Write payroll minutes, run the pipeline and persist. The row's
    /// worked minutes must already be up to date.
    pub fn reconcile(
        &self,
        entry: &mut WorktimeEntry,
        day_type: DayType,
        work_time: &WorkTime,
        fields: EntryFields,
        now: NaiveDateTime,
    ) -> AppResult<()> {
        entry.regular_minutes = work_time.processed_minutes;
        entry.total_overtime_minutes = work_time.overtime_minutes;
        entry.lunch_break_deducted = work_time.lunch_deducted;

        SyncPipeline::new(fields, day_type).run(entry);

        entry.updated_at = now;
        self.store.write_entry(entry)
    }

    /// Administrative finalize: explicit minutes, row locked against the
    /// live session.
    pub fn finalize(
        &self,
        user: &Username,
        date: NaiveDate,
        worked_minutes: i64,
        overtime_minutes: i64,
        now: NaiveDateTime,
    ) -> AppResult<WorktimeEntry> {
        if worked_minutes < 0 || overtime_minutes < 0 {
            return Err(AppError::Validation(format!(
                "minutes must not be negative (worked {}, overtime {})",
                worked_minutes, overtime_minutes
            )));
        }
        if overtime_minutes > worked_minutes {
            return Err(AppError::Validation(format!(
                "overtime ({}) cannot exceed worked minutes ({})",
                overtime_minutes, worked_minutes
            )));
        }

        let mut entry = self
            .store
            .read_entry(user, date)?
            .unwrap_or_else(|| WorktimeEntry::new(user.clone(), date, now));

        entry.total_worked_minutes = worked_minutes;
        entry.regular_minutes = worked_minutes - overtime_minutes;
        entry.total_overtime_minutes = overtime_minutes;
        entry.sync_state = SyncState::AdminEdited;
        entry.updated_at = now;

        self.store.write_entry(&entry)?;
        Ok(entry)
    }
}
