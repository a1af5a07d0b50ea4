//! Per-schema synchronization status.

use std::fmt;

/// Surfaced to the UI as a badge; never an exception. Local state remains
/// the source of truth whatever this says.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SyncStatus {
    #[default]
    Idle,
    Saving,
    Error(String),
}

impl SyncStatus {
    pub fn is_error(&self) -> bool {
        matches!(self, SyncStatus::Error(_))
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Idle => f.write_str("idle"),
            SyncStatus::Saving => f.write_str("saving"),
            SyncStatus::Error(message) => write!(f, "error: {message}"),
        }
    }
}
