//! Sync command orchestrator
//!
//! Turns one resolved target into exactly one action run against the remote
//! file store: validate and normalize the options, pick the action, enforce
//! the solo policy, build the work list, run with credential retries, then
//! print the summary and announce completion on the event bus.

use super::report::{EventLog, completed_bytes, summarize};
use crate::actions::{ActionKind, ActionWork, UnknownAction};
use crate::config::{ResolvedTarget, SyncOptions, TargetData};
use crate::file_discovery::{DiscoveryError, expand_sources};
use crate::output::{Console, WRAP_WIDTH, wraptext};
use mozusync_core::auth::{DeveloperContext, PRODUCTION_BASE_URL};
use mozusync_core::client::{AppDevClientFactory, ClientSettings, RenameSpec, TransferOptions};
use mozusync_core::error::INVALID_CREDENTIALS;
use mozusync_core::events::{EventBus, completion_event};
use mozusync_core::progress::{Phase, ProgressEvent};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Credential invalidate-and-retry rounds allowed per invocation
pub const MAX_CREDENTIAL_RETRIES: u32 = 3;

const GENERIC_FAILURE: &str = "Unknown error! Please try again.";

#[derive(Debug, Error)]
pub enum SyncError {
    /// Missing or malformed options
    #[error("{0}")]
    Configuration(String),

    /// Also a configuration error; kept apart so callers can suggest a fix
    #[error(transparent)]
    UnknownAction(#[from] UnknownAction),

    #[error(
        "The `{task}` task is meant to be run only by itself, but it was run as part of the task `{requested}`. Use the config \"solo_only = false\" to override."
    )]
    SoloOnly { task: String, requested: String },

    /// Remote failure, already mapped to its user-facing text
    #[error("{message}")]
    Remote {
        message: String,
        #[source]
        source: mozusync_core::Error,
    },

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}

/// One invocation of a target
#[derive(Debug, Clone)]
pub struct SyncRequest {
    pub target: String,
    pub options: SyncOptions,
    pub data: TargetData,
    /// Positional `user` from the command line
    pub cli_user: Option<String>,
    /// Positional `password` from the command line
    pub cli_password: Option<String>,
    /// Every task requested by the command line, as `mozusync:<target>`
    pub requested_tasks: Vec<String>,
    pub project_root: PathBuf,
}

impl SyncRequest {
    /// Request for `target` run on its own
    pub fn new(target: ResolvedTarget, project_root: impl Into<PathBuf>) -> Self {
        let task = task_name(&target.name);
        Self {
            target: target.name,
            options: target.options,
            data: target.data,
            cli_user: None,
            cli_password: None,
            requested_tasks: vec![task],
            project_root: project_root.into(),
        }
    }

    /// Apply `user:password` arguments; a lone value is the password
    pub fn with_cli_credentials(mut self, user: Option<String>, password: Option<String>) -> Self {
        match (user, password) {
            (Some(lone), None) => {
                self.cli_user = None;
                self.cli_password = Some(lone);
            }
            (user, password) => {
                self.cli_user = user;
                self.cli_password = password;
            }
        }
        self
    }

    pub fn with_requested_tasks(mut self, tasks: Vec<String>) -> Self {
        self.requested_tasks = tasks;
        self
    }

    fn task(&self) -> String {
        task_name(&self.target)
    }
}

/// `mozusync:<target>`
pub fn task_name(target: &str) -> String {
    format!("mozusync:{target}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// Nothing qualified; no client was created
    Canceled,
}

/// What a finished invocation did
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub action: ActionKind,
    pub outcome: RunOutcome,
    pub events: Vec<ProgressEvent>,
    pub summary: Vec<String>,
    /// Times the action was run, retries included
    pub attempts: u32,
}

impl SyncReport {
    pub fn total_bytes(&self) -> u64 {
        completed_bytes(&self.events)
    }
}

/// Retry bookkeeping for one invocation
#[derive(Debug)]
pub struct SyncSession {
    retries_left: u32,
    attempts: u32,
}

impl Default for SyncSession {
    fn default() -> Self {
        Self {
            retries_left: MAX_CREDENTIAL_RETRIES,
            attempts: 0,
        }
    }
}

impl SyncSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn begin_attempt(&mut self) {
        self.attempts += 1;
    }

    /// Spend one retry; false once the budget is gone
    fn take_retry(&mut self) -> bool {
        if self.retries_left == 0 {
            return false;
        }
        self.retries_left -= 1;
        true
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// Runs targets against clients built by the factory
pub struct SyncOrchestrator {
    factory: Arc<dyn AppDevClientFactory>,
    bus: EventBus,
    console: Console,
}

impl SyncOrchestrator {
    pub fn new(factory: Arc<dyn AppDevClientFactory>, bus: EventBus, console: Console) -> Self {
        Self {
            factory,
            bus,
            console,
        }
    }

    pub async fn run(&self, request: SyncRequest) -> Result<SyncReport, SyncError> {
        let options = &request.options;

        let application_key = options
            .application_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                SyncError::Configuration(
                    "The `mozusync` task requires an `application_key` config property containing the application key of the theme in order to sync."
                        .to_string(),
                )
            })?;

        let context = options.context.clone().ok_or_else(|| {
            SyncError::Configuration(
                "The `mozusync` task requires a `context` config property containing the developer account and environment in order to sync."
                    .to_string(),
            )
        })?;

        let base_url = context
            .base_url
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| PRODUCTION_BASE_URL.to_string());
        let mut account = context.developer_account.unwrap_or_default();

        if let Some(user) = &request.cli_user {
            log::debug!("Using developer account `{user}`, provided at command line.");
            account.email_address = Some(user.clone());
        }

        let email_address = account
            .email_address
            .filter(|email| !email.is_empty())
            .ok_or_else(|| {
                SyncError::Configuration(
                    "The `mozusync` task requires a `context.developer_account.email_address` property, either provided in mozusync.toml or at the command line after the target name, e.g. `mozusync run upload:user@example.com:Password123`."
                        .to_string(),
                )
            })?;

        if request.cli_password.is_some() {
            log::debug!("Password provided at command line.");
        }
        let password = request.cli_password.clone().or(account.password);

        let action: ActionKind = options.action.parse()?;

        let task = request.task();
        let solo_only = options.solo_only.unwrap_or(action.solo_only());
        if solo_only && request.requested_tasks != [task.as_str()] {
            return Err(SyncError::SoloOnly {
                requested: request.requested_tasks.join(" "),
                task,
            });
        }

        let work = self.build_work(action, &request)?;

        if !action.needs_to_run(&work) {
            self.console.ok(&format!(
                "{} canceled; no qualifying files were found.",
                action.present_tense()
            ));
            return Ok(SyncReport {
                action,
                outcome: RunOutcome::Canceled,
                events: Vec::new(),
                summary: Vec::new(),
                attempts: 0,
            });
        }

        let mut developer = DeveloperContext::new(base_url, email_address);
        if let Some(password) = password.filter(|p| !p.is_empty()) {
            developer = developer.with_password(password);
        }

        let client = self
            .factory
            .create(ClientSettings {
                application_key: application_key.clone(),
                context: developer,
                no_store_auth: options.no_store_auth,
                local_root: request.project_root.clone(),
            })
            .map_err(remote_failure)?;

        self.console.subhead(&action.table_head());

        let transfer = TransferOptions {
            no_clobber: options.no_clobber,
        };
        let event_log = EventLog::new(action, self.console.clone());
        let mut session = SyncSession::new();

        loop {
            session.begin_attempt();
            match action.run(client.as_ref(), &work, &transfer, &event_log).await {
                Ok(()) => break,
                Err(e) if e.is_invalid_credentials() && session.take_retry() => {
                    log::debug!(
                        "Credentials rejected on attempt {}; invalidating and retrying",
                        session.attempts()
                    );
                    client.invalidate_credentials().await.map_err(remote_failure)?;
                }
                Err(e) => return Err(remote_failure(e)),
            }
        }

        let events = event_log.events();
        let summary = summarize(action, &application_key, &events);
        if events.iter().any(|event| event.phase == Phase::Completed) {
            self.console.line("");
        }
        for line in &summary {
            self.console.ok(line);
        }

        self.bus.emit(completion_event(action.name()));

        Ok(SyncReport {
            action,
            outcome: RunOutcome::Completed,
            events,
            summary,
            attempts: session.attempts(),
        })
    }

    fn build_work(&self, action: ActionKind, request: &SyncRequest) -> Result<ActionWork, SyncError> {
        let mut work = ActionWork::default();
        match action {
            ActionKind::Upload => {
                let candidates = expand_sources(&request.project_root, &request.data.src)?;
                let total = candidates.len();
                work.upload_list = candidates
                    .into_iter()
                    .filter(|path| {
                        let full = request.project_root.join(path);
                        full.exists() && !full.is_dir()
                    })
                    .collect();
                log::debug!(
                    "{} of {total} source path(s) qualify for upload",
                    work.upload_list.len()
                );
            }
            ActionKind::Delete => work.remove = request.data.remove.clone(),
            ActionKind::Rename => {
                work.renames = request
                    .data
                    .files
                    .iter()
                    .map(|file| RenameSpec::new(&file.src, &file.dest))
                    .collect();
            }
            ActionKind::DeleteAll => {}
        }
        Ok(work)
    }
}

/// User-facing text for a remote failure
pub fn custom_message(error: &mozusync_core::Error) -> String {
    match error.error_code() {
        Some(INVALID_CREDENTIALS) => "Invalid credentials. Please re-enter your username and password, and/or check your mozusync.toml file to see that you are using the right developer account ID and environment.".to_string(),
        _ => {
            let text = error.to_string();
            if text.is_empty() {
                GENERIC_FAILURE.to_string()
            } else {
                text
            }
        }
    }
}

fn remote_failure(error: mozusync_core::Error) -> SyncError {
    log::debug!("{error:?}");
    SyncError::Remote {
        message: wraptext(WRAP_WIDTH, &custom_message(&error)),
        source: error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ContextOptions, DeveloperAccount};
    use mozusync_core::error::RemoteError;

    fn request(action: &str) -> SyncRequest {
        SyncRequest::new(
            ResolvedTarget {
                name: "t".to_string(),
                options: SyncOptions {
                    action: action.to_string(),
                    application_key: Some("APPKEY".to_string()),
                    context: Some(ContextOptions {
                        base_url: None,
                        developer_account: Some(DeveloperAccount {
                            email_address: Some("dev@example.com".to_string()),
                            password: None,
                        }),
                    }),
                    ..Default::default()
                },
                data: TargetData::default(),
            },
            ".",
        )
    }

    #[test]
    fn test_lone_cli_value_is_password() {
        let req = request("upload").with_cli_credentials(Some("secret".to_string()), None);
        assert_eq!(req.cli_user, None);
        assert_eq!(req.cli_password.as_deref(), Some("secret"));

        let req = request("upload")
            .with_cli_credentials(Some("me@example.com".to_string()), Some("pw".to_string()));
        assert_eq!(req.cli_user.as_deref(), Some("me@example.com"));
        assert_eq!(req.cli_password.as_deref(), Some("pw"));
    }

    #[test]
    fn test_session_budget() {
        let mut session = SyncSession::new();
        assert!(session.take_retry());
        assert!(session.take_retry());
        assert!(session.take_retry());
        assert!(!session.take_retry());
    }

    #[test]
    fn test_custom_message_for_invalid_credentials() {
        let error: mozusync_core::Error =
            RemoteError::api(401, Some(INVALID_CREDENTIALS), "Unauthorized").into();
        assert!(custom_message(&error).starts_with("Invalid credentials."));

        let error: mozusync_core::Error =
            RemoteError::api(500, Some("SERVER_ERROR"), "boom").into();
        assert_eq!(custom_message(&error), error.to_string());
    }

    #[test]
    fn test_remote_failure_wraps_message() {
        let error: mozusync_core::Error =
            RemoteError::api(401, Some(INVALID_CREDENTIALS), "Unauthorized").into();
        let SyncError::Remote { message, .. } = remote_failure(error) else {
            panic!("expected a remote error");
        };
        assert!(message.lines().all(|line| line.chars().count() <= WRAP_WIDTH));
        assert!(message.lines().count() > 1);
    }
}
