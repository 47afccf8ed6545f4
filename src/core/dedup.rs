//! Per-user, per-command debounce.
//!
//! A soft guard against double clicks and overlapping triggers: it rejects
//! a repeat of the *same* command for the same user while the first one is
//! still inside its cooldown. Different commands are never serialized
//! against each other.

use crate::config::DedupSettings;
use crate::models::command_kind::CommandKind;
use crate::models::user::Username;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;
use tracing::debug;

type Key = (Username, CommandKind);

#[derive(Debug)]
pub struct DedupGuard {
    settings: DedupSettings,
    registry: Mutex<HashMap<Key, Instant>>,
}

/// Removes the key when the guarded call returns or unwinds.
struct Release<'a> {
    guard: &'a DedupGuard,
    key: Option<Key>,
}

impl Drop for Release<'_> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.guard.registry().remove(&key);
        }
    }
}

impl DedupGuard {
    pub fn new(settings: DedupSettings) -> Self {
        Self {
            settings,
            registry: Mutex::new(HashMap::new()),
        }
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<Key, Instant>> {
        self.registry.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `op` unless the same command for `user` is still cooling down,
    /// in which case `rejected` is returned and nothing runs.
    pub fn run<T, F>(&self, user: &Username, kind: CommandKind, rejected: T, op: F) -> T
    where
        F: FnOnce() -> T,
    {
        if !self.admit(user, kind, Instant::now()) {
            debug!(user = %user, command = kind.as_str(), "duplicate command ignored");
            return rejected;
        }

        let _release = Release {
            guard: self,
            key: Some((user.clone(), kind)),
        };
        op()
    }

    /// Stamp `(user, kind)` at `now` unless a previous stamp is younger than
    /// the command's cooldown. Returns whether the call was admitted.
    pub fn admit(&self, user: &Username, kind: CommandKind, now: Instant) -> bool {
        let cooldown = self.settings.cooldown_for(kind);
        let key = (user.clone(), kind);
        let mut registry = self.registry();

        if let Some(prior) = registry.get(&key)
            && now.saturating_duration_since(*prior) < cooldown
        {
            return false;
        }

        registry.insert(key, now);

        if registry.len() > self.settings.sweep_threshold {
            Self::sweep_locked(&mut registry, now, &self.settings);
        }

        true
    }

    pub fn release(&self, user: &Username, kind: CommandKind) {
        self.registry().remove(&(user.clone(), kind));
    }

    /// Drop stamps older than the retention window. Returns how many went.
    pub fn sweep(&self, now: Instant) -> usize {
        let mut registry = self.registry();
        Self::sweep_locked(&mut registry, now, &self.settings)
    }

    fn sweep_locked(
        registry: &mut HashMap<Key, Instant>,
        now: Instant,
        settings: &DedupSettings,
    ) -> usize {
        let retention = settings.retention();
        let before = registry.len();
        registry.retain(|_, stamp| now.saturating_duration_since(*stamp) <= retention);
        let removed = before - registry.len();
        if removed > 0 {
            debug!(removed, remaining = registry.len(), "swept stale dedup keys");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.registry().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
