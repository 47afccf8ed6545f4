use crate::ui::messages::success;
use rusqlite::{Connection, OptionalExtension, Result};

/// Ordered schema migrations. Each one runs once and is recorded in the
/// `log` table as `migration_applied`.
const MIGRATIONS: &[(&str, &str, &str)] = &[
    (
        "20250301_0001_create_sessions",
        "Created sessions table",
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            username                      TEXT PRIMARY KEY,
            status                        TEXT NOT NULL
                CHECK(status IN ('online','temporary_stop','offline')),
            day_start_time                TEXT NOT NULL,
            day_end_time                  TEXT,
            temporary_stops               TEXT NOT NULL DEFAULT '[]',
            total_worked_minutes          INTEGER NOT NULL DEFAULT 0,
            total_overtime_minutes        INTEGER NOT NULL DEFAULT 0,
            total_temporary_stop_minutes  INTEGER NOT NULL DEFAULT 0,
            temporary_stop_count          INTEGER NOT NULL DEFAULT 0,
            last_activity                 TEXT NOT NULL,
            awaiting_resolution           INTEGER NOT NULL DEFAULT 0
        );
        "#,
    ),
    (
        "20250301_0002_create_worktime_entries",
        "Created worktime_entries table",
        r#"
        CREATE TABLE IF NOT EXISTS worktime_entries (
            id                            INTEGER PRIMARY KEY AUTOINCREMENT,
            username                      TEXT NOT NULL,
            work_date                     TEXT NOT NULL,
            day_start_time                TEXT,
            day_end_time                  TEXT,
            temporary_stop_count          INTEGER NOT NULL DEFAULT 0,
            total_temporary_stop_minutes  INTEGER NOT NULL DEFAULT 0,
            total_worked_minutes          INTEGER NOT NULL DEFAULT 0,
            regular_minutes               INTEGER NOT NULL DEFAULT 0,
            total_overtime_minutes        INTEGER NOT NULL DEFAULT 0,
            lunch_break_deducted          INTEGER NOT NULL DEFAULT 0,
            time_off_type                 TEXT,
            sync_state                    TEXT NOT NULL DEFAULT 'USER_IN_PROCESS',
            updated_at                    TEXT NOT NULL,
            UNIQUE(username, work_date)
        );
        "#,
    ),
    (
        "20250315_0003_index_open_entries",
        "Indexed worktime_entries by sync state",
        r#"
        CREATE INDEX IF NOT EXISTS idx_entries_user_date ON worktime_entries(username, work_date);
        CREATE INDEX IF NOT EXISTS idx_entries_sync_state ON worktime_entries(sync_state);
        "#,
    ),
];

/// Ensure that the `log` table exists with the modern schema.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn is_applied(conn: &Connection, version: &str) -> Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

fn apply_migration(conn: &Connection, version: &str, message: &str, sql: &str) -> Result<()> {
    conn.execute_batch(sql)?;

    conn.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (datetime('now'), 'migration_applied', ?1, ?2)",
        [version, message],
    )?;

    success(format!("Migration applied: {} → {}", version, message));
    Ok(())
}

/// Versions recorded as applied, oldest first.
pub fn applied_migrations(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT target FROM log WHERE operation = 'migration_applied' ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Public entry point: run all pending migrations.
///
/// Called by db::init_db().
pub fn run_pending_migrations(conn: &Connection) -> Result<()> {
    ensure_log_table(conn)?;

    for (version, message, sql) in MIGRATIONS {
        if !is_applied(conn, version)? {
            apply_migration(conn, version, message, sql)?;
        }
    }

    Ok(())
}
