//! Decoded change records and the per-session output shape.

use serde::{Deserialize, Serialize};

use super::FlagValue;

/// One decoded change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventRecord {
    /// Decoded event flags.
    pub flags: FlagValue,
    /// Event id assigned by the watcher.
    pub id: u64,
    /// Affected path.
    pub path: String,
}

/// Which shape each change takes in a delivered batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Only the affected path.
    #[default]
    Plain,
    /// Path plus decoded flags and event id.
    Augmented,
}

impl OutputMode {
    /// Select the mode from a "use flags and id" toggle.
    #[must_use]
    pub fn from_flags_and_id(use_flags_and_id: bool) -> Self {
        if use_flags_and_id {
            Self::Augmented
        } else {
            Self::Plain
        }
    }
}

/// A single entry of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Change {
    /// Plain mode entry.
    Path(String),
    /// Augmented mode entry.
    Event(EventRecord),
}

impl Change {
    /// The affected path, whatever the shape.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Path(path) => path,
            Self::Event(record) => &record.path,
        }
    }

    /// The full record, if this change was decoded in augmented mode.
    #[must_use]
    pub fn record(&self) -> Option<&EventRecord> {
        match self {
            Self::Path(_) => None,
            Self::Event(record) => Some(record),
        }
    }
}
