//! In-process event bus
//!
//! Raw file-change notifications come in as [`BusEvent::Watch`], watch
//! adapters announce configuration rewrites with [`BusEvent::ConfigUpdated`],
//! and finished sync runs publish a [`BusEvent::Named`] completion event.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokio::sync::broadcast;

const BUS_CAPACITY: usize = 256;

/// Kind of a raw file-change notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Changed,
    Added,
    Deleted,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Changed => "changed",
            Self::Added => "added",
            Self::Deleted => "deleted",
        })
    }
}

impl FromStr for ChangeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "changed" => Ok(Self::Changed),
            "added" => Ok(Self::Added),
            "deleted" => Ok(Self::Deleted),
            other => Err(format!("unknown change kind '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    /// A file under the project changed
    Watch { kind: ChangeKind, path: String },
    /// A configuration key was rewritten
    ConfigUpdated { key: String },
    /// Free-form named event such as `mozusync:upload:complete`
    Named(String),
}

/// Name of the event published after a successful run of `action`
pub fn completion_event(action: &str) -> String {
    format!("mozusync:{action}:complete")
}

/// Cloneable handle to a broadcast channel of [`BusEvent`]s
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<BusEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    /// Publish to every current subscriber; returns how many received it
    pub fn publish(&self, event: BusEvent) -> usize {
        log::trace!("bus <- {event:?}");
        // No subscribers is not an error for a fire-and-forget bus
        self.tx.send(event).unwrap_or(0)
    }

    pub fn emit(&self, name: impl Into<String>) -> usize {
        self.publish(BusEvent::Named(name.into()))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
