//! `mozusync watch`

use super::App;
use super::run::TargetSpec;
use crate::config::{SharedConfig, resolve_target, target_names, watch_section};
use crate::error::{CliError, CliResult};
use crate::orchestrators::SyncRequest;
use crate::watch::{ProjectWatcher, WatchAdapterRegistry};
use mozusync_core::events::BusEvent;
use serde_json::Value;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

/// Adapters attached for every target of the loaded configuration
pub struct WatchSession {
    pub shared: SharedConfig,
    pub registry: WatchAdapterRegistry,
}

impl WatchSession {
    /// Attach each distinct `watch_adapters` entry across all targets
    pub fn attach(app: &App, config: Value) -> CliResult<Self> {
        let shared = SharedConfig::new(config);
        let snapshot = shared.snapshot();
        let mut registry = WatchAdapterRegistry::new(shared.clone(), app.bus.clone());

        for name in target_names(&snapshot) {
            let target = resolve_target(&snapshot, &name)?;
            for adapter in &target.options.watch_adapters {
                registry.attach(adapter)?;
            }
        }

        log::debug!("{} watch adapter(s) attached", registry.len());
        Ok(Self { shared, registry })
    }

    /// Watch the project and rerun `[watch].tasks` after each update until Ctrl-C
    pub async fn run(&self, app: &App) -> CliResult<()> {
        self.run_until(app, tokio::signal::ctrl_c()).await
    }

    /// Watch loop that stops as soon as `shutdown` completes, even mid-run
    pub async fn run_until<F: Future>(&self, app: &App, shutdown: F) -> CliResult<()> {
        let mut rx = app.bus.subscribe();
        let root = app.project_root();
        let _watcher = ProjectWatcher::start(&root, app.bus.clone())
            .map_err(|e| CliError::filesystem(&format!("Cannot watch {}: {e}", root.display())))?;

        app.console.ok(&format!(
            "Watching {} for changes. Press Ctrl-C to stop.",
            root.display()
        ));

        tokio::pin!(shutdown);

        loop {
            let updated = tokio::select! {
                _ = &mut shutdown => break,
                received = rx.recv() => match received {
                    Ok(BusEvent::ConfigUpdated { key }) => {
                        log::debug!("{key} updated");
                        true
                    }
                    Ok(_) => false,
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!("Watch loop missed {skipped} event(s)");
                        false
                    }
                    Err(RecvError::Closed) => break,
                },
            };
            if !updated {
                continue;
            }

            drain(&mut rx);
            let config = self.shared.snapshot();
            tokio::select! {
                _ = &mut shutdown => {
                    log::debug!("Interrupted while running watch tasks");
                    break;
                }
                _ = run_watch_tasks(app, &config) => {}
            }
        }

        Ok(())
    }
}

/// Discard the backlog; the next run reads the latest configuration anyway
fn drain(rx: &mut tokio::sync::broadcast::Receiver<BusEvent>) {
    loop {
        match rx.try_recv() {
            Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
}

/// Run each `[watch].tasks` entry in turn; failures are reported and the
/// watch goes on
///
/// Every entry counts as requested, so solo actions listed beside other
/// tasks are refused unless configured with `solo_only = false`.
pub async fn run_watch_tasks(app: &App, config: &Value) -> usize {
    let orchestrator = app.orchestrator();
    let specs: Vec<TargetSpec> = watch_section(config)
        .tasks
        .iter()
        .map(|spec| TargetSpec::parse(spec))
        .collect();
    let requested: Vec<String> = specs.iter().map(TargetSpec::task).collect();
    let mut succeeded = 0;

    for spec in specs {
        let target = match resolve_target(config, &spec.target) {
            Ok(target) => target,
            Err(e) => {
                eprintln!("{}", CliError::from(e).format_for_user(false));
                continue;
            }
        };

        let request = SyncRequest::new(target, app.project_root())
            .with_cli_credentials(spec.user, spec.password)
            .with_requested_tasks(requested.clone());
        match orchestrator.run(request).await {
            Ok(_) => succeeded += 1,
            Err(e) => eprintln!("{}", CliError::from(e).format_for_user(false)),
        }
    }

    succeeded
}
