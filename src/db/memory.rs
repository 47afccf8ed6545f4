//! In-process store, for embedding and tests.

use crate::db::store::WorktimeStore;
use crate::errors::AppResult;
use crate::models::session::Session;
use crate::models::user::Username;
use crate::models::worktime_entry::WorktimeEntry;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Tables {
    sessions: BTreeMap<Username, Session>,
    entries: BTreeMap<(Username, NaiveDate), WorktimeEntry>,
    entry_inserts: usize,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of ledger rows ever inserted (updates excluded).
    pub fn entry_inserts(&self) -> usize {
        self.tables().entry_inserts
    }

    pub fn entry_count(&self) -> usize {
        self.tables().entries.len()
    }
}

impl WorktimeStore for MemoryStore {
    fn read_session(&self, user: &Username) -> AppResult<Option<Session>> {
        Ok(self.tables().sessions.get(user).cloned())
    }

    fn write_session(&self, session: &Session) -> AppResult<()> {
        self.tables()
            .sessions
            .insert(session.username.clone(), session.clone());
        Ok(())
    }

    fn list_sessions(&self) -> AppResult<Vec<Session>> {
        Ok(self.tables().sessions.values().cloned().collect())
    }

    fn read_entry(&self, user: &Username, date: NaiveDate) -> AppResult<Option<WorktimeEntry>> {
        Ok(self.tables().entries.get(&(user.clone(), date)).cloned())
    }

    fn write_entry(&self, entry: &WorktimeEntry) -> AppResult<()> {
        let mut tables = self.tables();
        let previous = tables.entries.insert(
            (entry.username.clone(), entry.work_date),
            entry.clone(),
        );
        if previous.is_none() {
            tables.entry_inserts += 1;
        }
        Ok(())
    }

    fn list_entries(
        &self,
        user: &Username,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<WorktimeEntry>> {
        if from > to {
            return Ok(Vec::new());
        }
        Ok(self
            .tables()
            .entries
            .range((user.clone(), from)..=(user.clone(), to))
            .map(|(_, e)| e.clone())
            .collect())
    }
}
