use crate::models::command_kind::CommandKind;
use crate::models::session::Session;
use crate::models::worktime_entry::WorktimeEntry;
use chrono::{NaiveDate, NaiveDateTime};

/// Every request the session engine accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    StartDay,
    StartTemporaryStop,
    Resume,
    EndDay {
        /// Defaults to now.
        end_time: Option<NaiveDateTime>,
        /// Replaces the measured minutes when given.
        worked_minutes: Option<i64>,
    },
    AutoEnd {
        scheduled_end: NaiveDateTime,
    },
    Resolve {
        date: NaiveDate,
        end_time: Option<NaiveDateTime>,
    },
}

impl Transition {
    pub fn kind(&self) -> CommandKind {
        match self {
            Transition::StartDay => CommandKind::StartDay,
            Transition::StartTemporaryStop => CommandKind::StartTemporaryStop,
            Transition::Resume => CommandKind::Resume,
            Transition::EndDay { .. } => CommandKind::EndDay,
            Transition::AutoEnd { .. } => CommandKind::AutoEnd,
            Transition::Resolve { .. } => CommandKind::Resolve,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Transition applied; the session after the change.
    Applied(Session),
    /// Dangling ledger row repaired.
    Resolved(WorktimeEntry),
    /// Precondition not met; the session as it was, if any.
    Unchanged(Option<Session>),
    /// Rejected by the deduplication guard.
    Debounced,
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_) | Outcome::Resolved(_))
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            Outcome::Applied(s) => Some(s),
            Outcome::Unchanged(s) => s.as_ref(),
            Outcome::Resolved(_) | Outcome::Debounced => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Applied(_) => "applied",
            Outcome::Resolved(_) => "resolved",
            Outcome::Unchanged(_) => "unchanged",
            Outcome::Debounced => "debounced",
        }
    }
}
