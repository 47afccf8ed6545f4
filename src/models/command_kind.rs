use serde::Serialize;

/// Transition kinds tracked by the deduplication guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CommandKind {
    StartDay,
    StartTemporaryStop,
    Resume,
    EndDay,
    AutoEnd,
    Resolve,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::StartDay => "start",
            CommandKind::StartTemporaryStop => "pause",
            CommandKind::Resume => "resume",
            CommandKind::EndDay => "end",
            CommandKind::AutoEnd => "auto_end",
            CommandKind::Resolve => "resolve",
        }
    }
}
