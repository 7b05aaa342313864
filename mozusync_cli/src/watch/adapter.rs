//! Watch adapters and their registry

use super::change_set::ChangeSet;
use super::debounce::Debouncer;
use crate::config::SharedConfig;
use crate::file_discovery::escape_literal;
use crate::output::wordlist;
use mozusync_core::events::{BusEvent, ChangeKind, EventBus};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WatchError {
    #[error("Please supply a src and action path to modify in the watch adapter config.")]
    MissingField,

    #[error("Watch adapters support the `upload` and `delete` actions, not `{0}`.")]
    UnsupportedAction(String),
}

/// Which change kinds an adapter keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionFamily {
    Upload,
    Delete,
}

impl ActionFamily {
    pub fn is_relevant(self, kind: ChangeKind) -> bool {
        match self {
            Self::Upload => matches!(kind, ChangeKind::Changed | ChangeKind::Added),
            Self::Delete => kind == ChangeKind::Deleted,
        }
    }
}

impl FromStr for ActionFamily {
    type Err = WatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upload" => Ok(Self::Upload),
            "delete" => Ok(Self::Delete),
            other => Err(WatchError::UnsupportedAction(other.to_string())),
        }
    }
}

impl fmt::Display for ActionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Upload => "upload",
            Self::Delete => "delete",
        })
    }
}

/// One `watch_adapters` entry
///
/// `src` is the dotted configuration key to rewrite, for example
/// `targets.upload.src`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct WatchAdapterConfig {
    pub src: Option<String>,
    pub action: Option<String>,
    #[serde(default)]
    pub always: Vec<String>,
}

impl WatchAdapterConfig {
    pub fn new(src: &str, action: &str) -> Self {
        Self {
            src: Some(src.to_string()),
            action: Some(action.to_string()),
            always: Vec::new(),
        }
    }

    pub fn with_always(mut self, always: &[&str]) -> Self {
        self.always = always.iter().map(|p| p.to_string()).collect();
        self
    }

    /// The key and family, or the setup error
    pub fn validate(&self) -> Result<(String, ActionFamily), WatchError> {
        match (self.src.as_deref(), self.action.as_deref()) {
            (Some(src), Some(action)) if !src.is_empty() && !action.is_empty() => {
                Ok((src.to_string(), action.parse()?))
            }
            _ => Err(WatchError::MissingField),
        }
    }
}

/// Coalesces change notifications into one configuration key
pub struct WatchAdapter {
    key: String,
    family: ActionFamily,
    changes: ChangeSet,
    debouncer: Debouncer,
    config: SharedConfig,
    bus: EventBus,
}

impl WatchAdapter {
    pub fn bind(
        adapter: &WatchAdapterConfig,
        config: SharedConfig,
        bus: EventBus,
    ) -> Result<Self, WatchError> {
        let (key, family) = adapter.validate()?;
        log::debug!("Attaching watch adapter to mozusync {family}");
        Ok(Self {
            key,
            family,
            changes: ChangeSet::new(adapter.always.clone()),
            debouncer: Debouncer::default(),
            config,
            bus,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    /// Record a relevant change and poke the debouncer
    pub fn handle(&mut self, event: &BusEvent, now: Instant) {
        let BusEvent::Watch { kind, path } = event else {
            return;
        };
        if !self.family.is_relevant(*kind) {
            return;
        }

        self.changes.record(path.clone(), *kind);
        if self.debouncer.call(now) {
            self.flush();
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Trailing edge, if due
    pub fn on_deadline(&mut self, now: Instant) {
        if self.debouncer.expire(now) {
            self.flush();
        }
    }

    /// Write the current paths to the bound key and start over
    pub fn flush(&mut self) {
        let paths = self.changes.paths();
        log::debug!(
            "Updating change hash in {} to include {}",
            self.key,
            wordlist(&paths)
        );

        // Upload sources are glob-expanded; recorded names must match literally
        let entries: Vec<String> = paths
            .into_iter()
            .map(|path| match self.family {
                ActionFamily::Upload if self.changes.kind(&path).is_some() => {
                    escape_literal(&path)
                }
                _ => path,
            })
            .collect();

        match self.config.set(&self.key, json!(entries)) {
            Ok(()) => {
                self.bus.publish(BusEvent::ConfigUpdated {
                    key: self.key.clone(),
                });
            }
            Err(e) => log::warn!("{e}"),
        }
        self.changes.reset();
    }

    /// Drive the adapter from `rx` until the bus closes
    pub fn spawn(self, rx: broadcast::Receiver<BusEvent>) -> JoinHandle<()> {
        tokio::spawn(self.run(rx))
    }

    async fn run(mut self, mut rx: broadcast::Receiver<BusEvent>) {
        loop {
            let deadline = self.deadline();
            tokio::select! {
                received = rx.recv() => match received {
                    Ok(event) => self.handle(&event, Instant::now()),
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!("Watch adapter for {} missed {skipped} event(s)", self.key);
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.on_deadline(Instant::now());
                }
            }
        }
    }
}

/// Attaches each distinct adapter configuration once
pub struct WatchAdapterRegistry {
    attached: HashSet<WatchAdapterConfig>,
    config: SharedConfig,
    bus: EventBus,
}

impl WatchAdapterRegistry {
    pub fn new(config: SharedConfig, bus: EventBus) -> Self {
        Self {
            attached: HashSet::new(),
            config,
            bus,
        }
    }

    /// Bind, subscribe and spawn; `None` when this configuration is already attached
    pub fn attach(
        &mut self,
        adapter: &WatchAdapterConfig,
    ) -> Result<Option<JoinHandle<()>>, WatchError> {
        if self.attached.contains(adapter) {
            log::debug!("Watch adapter for {:?} already attached", adapter.src);
            return Ok(None);
        }

        let bound = WatchAdapter::bind(adapter, self.config.clone(), self.bus.clone())?;
        let handle = bound.spawn(self.bus.subscribe());
        self.attached.insert(adapter.clone());
        Ok(Some(handle))
    }

    pub fn len(&self) -> usize {
        self.attached.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attached.is_empty()
    }
}
