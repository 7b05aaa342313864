//! Per-file progress events reported by the remote client
//!
//! A sync client reports one or more events per file through a
//! [`ProgressProvider`]. The provider decides what to do with them: the CLI
//! appends them to a per-run log and prints a table line, tests record them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Where a file is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// About to be sent
    Before,
    /// Accepted by the remote store
    Completed,
    /// Skipped without an error
    Omitted,
    /// Refused by the remote store
    Rejected,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Before => "before",
            Self::Completed => "completed",
            Self::Omitted => "omitted",
            Self::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// What an event is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventData {
    File {
        path: String,
        size_in_bytes: u64,
        content_type: Option<String>,
    },
    Rename {
        old_path: String,
        new_path: String,
    },
}

impl EventData {
    /// File payload without size or type
    pub fn file(path: impl Into<String>) -> Self {
        Self::File {
            path: path.into(),
            size_in_bytes: 0,
            content_type: None,
        }
    }

    pub fn rename(old_path: impl Into<String>, new_path: impl Into<String>) -> Self {
        Self::Rename {
            old_path: old_path.into(),
            new_path: new_path.into(),
        }
    }

    /// Path of the file, or the new path of a rename
    pub fn path(&self) -> &str {
        match self {
            Self::File { path, .. } => path,
            Self::Rename { new_path, .. } => new_path,
        }
    }

    /// Bytes carried by the event; renames carry none
    pub fn size_in_bytes(&self) -> u64 {
        match self {
            Self::File { size_in_bytes, .. } => *size_in_bytes,
            Self::Rename { .. } => 0,
        }
    }
}

/// One progress notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub phase: Phase,
    pub reason: Option<String>,
    pub data: EventData,
}

impl ProgressEvent {
    pub fn before(data: EventData) -> Self {
        Self {
            phase: Phase::Before,
            reason: None,
            data,
        }
    }

    pub fn completed(data: EventData) -> Self {
        Self {
            phase: Phase::Completed,
            reason: None,
            data,
        }
    }

    pub fn omitted(data: EventData, reason: impl Into<String>) -> Self {
        Self {
            phase: Phase::Omitted,
            reason: Some(reason.into()),
            data,
        }
    }

    pub fn rejected(data: EventData, reason: impl Into<String>) -> Self {
        Self {
            phase: Phase::Rejected,
            reason: Some(reason.into()),
            data,
        }
    }
}

/// Sink for progress events
pub trait ProgressProvider: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Discards everything
pub struct NullProvider;

impl ProgressProvider for NullProvider {
    fn report(&self, _event: ProgressEvent) {}
}

impl dyn ProgressProvider {
    pub fn null() -> Box<dyn ProgressProvider> {
        Box::new(NullProvider)
    }
}

/// Keeps every event in emission order
#[derive(Clone, Default)]
pub struct RecordingProvider {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events reported so far
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl ProgressProvider for RecordingProvider {
    fn report(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
