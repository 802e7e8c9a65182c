//! Session state machine.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a watcher session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Idle,
    Running,
    Stopped,
}

/// State machine for tracking session progress.
///
/// `Stopped` is absorbing: once reached, further transitions are ignored.
#[derive(Debug, Clone)]
pub struct SessionStateMachine {
    state: SessionState,
    batches: usize,
    changes: usize,
    skipped_lines: usize,
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStateMachine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            batches: 0,
            changes: 0,
            skipped_lines: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.state == SessionState::Stopped
    }

    pub fn transition(&mut self, new_state: SessionState) {
        if self.is_stopped() {
            tracing::trace!(to = ?new_state, "Ignoring transition out of Stopped");
            return;
        }
        tracing::debug!(from = ?self.state, to = ?new_state, "State transition");
        self.state = new_state;
    }

    pub fn record_batch(&mut self, changes: usize) {
        self.batches = self.batches.saturating_add(1);
        self.changes = self.changes.saturating_add(changes);
    }

    pub fn record_skipped_line(&mut self) {
        self.skipped_lines = self.skipped_lines.saturating_add(1);
    }

    #[must_use]
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            batches: self.batches,
            changes: self.changes,
            skipped_lines: self.skipped_lines,
        }
    }
}

/// Session statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub batches: usize,
    pub changes: usize,
    pub skipped_lines: usize,
}
