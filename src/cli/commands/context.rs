//! Wiring shared by the session commands: store, clock, service, user.

use crate::cli::parser::Cli;
use crate::config::Config;
use crate::core::providers::{Clock, FixedClock, SystemClock};
use crate::core::state_machine::SessionService;
use crate::core::transition::Outcome;
use crate::db::log::audit;
use crate::db::store::{SqliteStore, WorktimeStore};
use crate::errors::{AppError, AppResult};
use crate::models::session::Session;
use crate::models::user::Username;
use crate::ui::messages::{info, success, warning};
use crate::utils::colors::{color_for_status, paint};
use crate::utils::formatting::mins2readable;
use crate::utils::time::{format_clock, parse_datetime};
use chrono::NaiveDate;
use std::sync::Arc;

pub struct Context {
    pub store: Arc<SqliteStore>,
    pub clock: Arc<dyn Clock>,
    pub service: SessionService,
}

/// `--user`, then `$USER` / `$USERNAME`.
pub fn resolve_user(cli: &Cli) -> AppResult<Username> {
    let raw = cli
        .user
        .clone()
        .or_else(|| std::env::var("USER").ok())
        .or_else(|| std::env::var("USERNAME").ok())
        .ok_or_else(|| AppError::Validation("no user given, use --user".into()))?;
    Username::parse(&raw)
}

/// `--at` pins the clock; otherwise the local wall clock.
pub fn build_clock(at: Option<&String>) -> AppResult<Arc<dyn Clock>> {
    match at {
        Some(s) => Ok(Arc::new(FixedClock::new(parse_datetime(s)?))),
        None => Ok(Arc::new(SystemClock)),
    }
}

impl Context {
    pub fn open(cli: &Cli, cfg: &Config) -> AppResult<Self> {
        let store = Arc::new(SqliteStore::open(&cfg.database)?);
        let clock = build_clock(cli.at.as_ref())?;
        let service = SessionService::new(
            Arc::clone(&store) as Arc<dyn WorktimeStore>,
            Arc::clone(&clock),
            cfg,
        )?;

        Ok(Self {
            store,
            clock,
            service,
        })
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Audit row; a failure is reported but does not fail the command.
    pub fn audit(&self, operation: &str, target: &str, message: &str) {
        if let Err(e) = self
            .store
            .with_conn(|conn| audit(conn, operation, target, message))
        {
            warning(format!("Failed to write internal log: {}", e));
        }
    }

    /// Print the outcome of a transition and audit it when applied.
    pub fn report(&self, operation: &str, user: &Username, outcome: &Outcome) {
        match outcome {
            Outcome::Applied(session) => {
                let message = describe(session);
                self.audit(operation, user.as_str(), &message);
                success(format!("{} ({}): {}", operation, user, message));
            }
            Outcome::Resolved(entry) => {
                let message = format!(
                    "{} resolved: worked {}, final {}",
                    entry.work_date,
                    mins2readable(entry.total_worked_minutes, false, true),
                    mins2readable(entry.final_minutes(), false, true)
                );
                self.audit(operation, user.as_str(), &message);
                success(message);
            }
            Outcome::Unchanged(Some(session)) => {
                warning(format!("{} ignored, session unchanged: {}", operation, describe(session)));
            }
            Outcome::Unchanged(None) => {
                warning(format!("{} ignored: no session for {}", operation, user));
            }
            Outcome::Debounced => info(format!("{} already in progress for {}", operation, user)),
        }
    }
}

/// One-line session summary.
pub fn describe(session: &Session) -> String {
    format!(
        "{} since {} (end {}), worked {}, breaks {} ({})",
        paint(color_for_status(session.status), session.status.label()),
        session.day_start_time.format("%Y-%m-%d %H:%M"),
        format_clock(session.day_end_time),
        mins2readable(session.total_worked_minutes, false, true),
        session.temporary_stop_count,
        mins2readable(session.total_temporary_stop_minutes, false, true)
    )
}
