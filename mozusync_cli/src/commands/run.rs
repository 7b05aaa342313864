//! `mozusync run <target[:user[:password]]>...`

use super::App;
use crate::config::resolve_target;
use crate::error::CliResult;
use crate::orchestrators::{SyncReport, SyncRequest, sync_orchestrator::task_name};
use serde_json::Value;

/// A target with optional credentials from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pub target: String,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl TargetSpec {
    /// `target[:user[:password]]`; the password may itself contain colons
    pub fn parse(spec: &str) -> Self {
        let mut parts = spec.splitn(3, ':');
        let target = parts.next().unwrap_or_default().to_string();
        let mut next = || parts.next().filter(|s| !s.is_empty()).map(str::to_string);
        let user = next();
        let password = next();
        Self {
            target,
            user,
            password,
        }
    }

    pub fn task(&self) -> String {
        task_name(&self.target)
    }
}

/// Run targets in order against `config`, stopping at the first failure
pub async fn run_specs(app: &App, config: &Value, specs: &[String]) -> CliResult<Vec<SyncReport>> {
    let specs: Vec<TargetSpec> = specs.iter().map(|spec| TargetSpec::parse(spec)).collect();
    let requested: Vec<String> = specs.iter().map(TargetSpec::task).collect();
    let orchestrator = app.orchestrator();

    let mut reports = Vec::with_capacity(specs.len());
    for spec in specs {
        log::debug!("Running task {}", spec.task());
        let target = resolve_target(config, &spec.target)?;
        let request = SyncRequest::new(target, app.project_root())
            .with_cli_credentials(spec.user, spec.password)
            .with_requested_tasks(requested.clone());
        reports.push(orchestrator.run(request).await?);
    }

    Ok(reports)
}
