//! Command handlers shared by the binary and the integration tests

mod run;
mod targets;
mod watch;

pub use run::{TargetSpec, run_specs};
pub use targets::list_targets;
pub use watch::{WatchSession, run_watch_tasks};

use crate::config::ConfigManager;
use crate::orchestrators::SyncOrchestrator;
use crate::output::Console;
use mozusync_core::client::AppDevClientFactory;
use mozusync_core::events::EventBus;
use std::path::PathBuf;
use std::sync::Arc;

/// What every command needs: configuration, a client factory and output
pub struct App {
    pub manager: ConfigManager,
    pub console: Console,
    pub bus: EventBus,
    factory: Arc<dyn AppDevClientFactory>,
}

impl App {
    pub fn new(manager: ConfigManager, factory: Arc<dyn AppDevClientFactory>, console: Console) -> Self {
        Self {
            manager,
            console,
            bus: EventBus::new(),
            factory,
        }
    }

    pub fn project_root(&self) -> PathBuf {
        self.manager.project_root()
    }

    pub fn orchestrator(&self) -> SyncOrchestrator {
        SyncOrchestrator::new(
            Arc::clone(&self.factory),
            self.bus.clone(),
            self.console.clone(),
        )
    }
}
