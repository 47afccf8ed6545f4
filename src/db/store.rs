//! Durable storage seam of the session engine.

use crate::db::initialize::init_db;
use crate::db::pool::DbPool;
use crate::db::queries;
use crate::errors::AppResult;
use crate::models::session::Session;
use crate::models::user::Username;
use crate::models::worktime_entry::WorktimeEntry;
use chrono::NaiveDate;
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};

pub trait WorktimeStore: Send + Sync {
    fn read_session(&self, user: &Username) -> AppResult<Option<Session>>;
    fn write_session(&self, session: &Session) -> AppResult<()>;
    fn list_sessions(&self) -> AppResult<Vec<Session>>;

    fn read_entry(&self, user: &Username, date: NaiveDate) -> AppResult<Option<WorktimeEntry>>;
    fn write_entry(&self, entry: &WorktimeEntry) -> AppResult<()>;
    /// Rows of `user` with `from <= work_date <= to`, oldest first.
    fn list_entries(
        &self,
        user: &Username,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<WorktimeEntry>>;
}

/// SQLite-backed store. The connection is shared behind a mutex held only
/// for the duration of a single statement batch.
pub struct SqliteStore {
    pool: Mutex<DbPool>,
}

impl SqliteStore {
    /// Open the database at `path` and bring its schema up to date.
    pub fn open(path: &str) -> AppResult<Self> {
        let pool = DbPool::new(path)?;
        init_db(&pool.conn)?;
        Ok(Self {
            pool: Mutex::new(pool),
        })
    }

    /// Fresh private database, schema included.
    pub fn in_memory() -> AppResult<Self> {
        let pool = DbPool::in_memory()?;
        init_db(&pool.conn)?;
        Ok(Self {
            pool: Mutex::new(pool),
        })
    }

    fn pool(&self) -> MutexGuard<'_, DbPool> {
        self.pool.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Helper to execute a closure with the shared connection.
    pub fn with_conn<F, T>(&self, func: F) -> AppResult<T>
    where
        F: FnOnce(&Connection) -> AppResult<T>,
    {
        let pool = self.pool();
        func(&pool.conn)
    }
}

impl WorktimeStore for SqliteStore {
    fn read_session(&self, user: &Username) -> AppResult<Option<Session>> {
        self.with_conn(|conn| queries::load_session(conn, user))
    }

    fn write_session(&self, session: &Session) -> AppResult<()> {
        self.with_conn(|conn| queries::save_session(conn, session))
    }

    fn list_sessions(&self) -> AppResult<Vec<Session>> {
        self.with_conn(queries::load_sessions)
    }

    fn read_entry(&self, user: &Username, date: NaiveDate) -> AppResult<Option<WorktimeEntry>> {
        self.with_conn(|conn| queries::load_entry(conn, user, &date))
    }

    fn write_entry(&self, entry: &WorktimeEntry) -> AppResult<()> {
        self.with_conn(|conn| queries::save_entry(conn, entry))
    }

    fn list_entries(
        &self,
        user: &Username,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<WorktimeEntry>> {
        self.with_conn(|conn| queries::load_entries(conn, user, &from, &to))
    }
}
