//! Watch-driven change aggregation
//!
//! A [`WatchAdapter`] listens for raw `watch` notifications on the event bus,
//! keeps the paths relevant to its action family in a [`ChangeSet`], and on
//! each debounced flush writes them into the shared configuration so the next
//! sync run picks them up.

pub mod adapter;
pub mod change_set;
pub mod debounce;
pub mod fs_watcher;

pub use adapter::{
    ActionFamily, WatchAdapter, WatchAdapterConfig, WatchAdapterRegistry, WatchError,
};
pub use change_set::ChangeSet;
pub use debounce::{DEBOUNCE_WINDOW, Debouncer};
pub use fs_watcher::ProjectWatcher;
