//! Raw change notifications from the file system

use mozusync_core::client::remote_path;
use mozusync_core::events::{BusEvent, ChangeKind, EventBus};
use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};

/// Publishes project changes as [`BusEvent::Watch`] until dropped
pub struct ProjectWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl ProjectWatcher {
    pub fn start(root: &Path, bus: EventBus) -> notify::Result<Self> {
        let root = root.canonicalize()?;
        let callback_root = root.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    for bus_event in to_bus_events(&callback_root, event) {
                        bus.publish(bus_event);
                    }
                }
                Err(e) => log::warn!("watch error: {e}"),
            },
            notify::Config::default(),
        )?;
        watcher.watch(&root, RecursiveMode::Recursive)?;
        log::debug!("Watching {}", root.display());

        Ok(Self {
            _watcher: watcher,
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Map one notify event to zero or more project-relative notifications
pub fn to_bus_events(root: &Path, event: notify::Event) -> Vec<BusEvent> {
    let kinds: Vec<ChangeKind> = match event.kind {
        EventKind::Create(_) => vec![ChangeKind::Added; event.paths.len()],
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if event.paths.len() == 2 => {
            vec![ChangeKind::Deleted, ChangeKind::Added]
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            vec![ChangeKind::Deleted; event.paths.len()]
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            vec![ChangeKind::Added; event.paths.len()]
        }
        // Single-path renames (FSEvents, atomic saves) carry no direction
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .iter()
            .map(|path| {
                if path.exists() {
                    ChangeKind::Added
                } else {
                    ChangeKind::Deleted
                }
            })
            .collect(),
        EventKind::Modify(_) => vec![ChangeKind::Changed; event.paths.len()],
        EventKind::Remove(_) => vec![ChangeKind::Deleted; event.paths.len()],
        _ => Vec::new(),
    };

    kinds
        .into_iter()
        .zip(event.paths)
        .filter_map(|(kind, path)| {
            let relative = path.strip_prefix(root).ok()?;
            let path = remote_path(relative);
            (!path.is_empty()).then_some(BusEvent::Watch { kind, path })
        })
        .collect()
}
