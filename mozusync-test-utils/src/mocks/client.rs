//! Mock implementation of AppDevClient for testing

use async_trait::async_trait;
use mozusync_core::client::{
    AppDevClient, AppDevClientFactory, ClientSettings, RenameSpec, TransferOptions, remote_path,
};
use mozusync_core::error::{INVALID_CREDENTIALS, IoError, RemoteError};
use mozusync_core::progress::{EventData, ProgressEvent, ProgressProvider};
use mozusync_core::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A recorded call on the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Upload { paths: Vec<String>, no_clobber: bool },
    Delete { paths: Vec<String> },
    Rename { specs: Vec<RenameSpec> },
    DeleteAll,
}

/// Failure the mock answers operations with
#[derive(Debug, Clone)]
pub enum MockFailure {
    InvalidCredentials,
    Remote { error_code: String, message: String },
    FileNotFound(String),
}

impl From<MockFailure> for Error {
    fn from(failure: MockFailure) -> Self {
        match failure {
            MockFailure::InvalidCredentials => Error::Remote(RemoteError::api(
                401,
                Some(INVALID_CREDENTIALS),
                "Invalid credentials",
            )),
            MockFailure::Remote {
                error_code,
                message,
            } => Error::Remote(RemoteError::api(500, Some(&error_code), message)),
            MockFailure::FileNotFound(path) => Error::Io(IoError::file_not_found(Path::new(&path))),
        }
    }
}

#[derive(Default)]
struct MockState {
    /// Failures consumed one per operation before falling back to success
    failures: Vec<MockFailure>,
    always_fail: Option<MockFailure>,
    scripted_events: Option<Vec<ProgressEvent>>,
    file_sizes: HashMap<String, u64>,
    remote_files: Vec<String>,
    calls: Vec<MockCall>,
    invalidations: usize,
    delay: Option<Duration>,
}

/// Configurable in-memory stand-in for the remote file store
///
/// Clones share state, so a test can keep one handle while the code under
/// test owns another.
///
/// ```rust,no_run
/// use mozusync_test_utils::{MockAppDevClient, MockFailure};
///
/// let mock = MockAppDevClient::new();
/// mock.fail_times(MockFailure::InvalidCredentials, 2);
/// ```
#[derive(Clone, Default)]
pub struct MockAppDevClient {
    state: Arc<Mutex<MockState>>,
}

impl MockAppDevClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `times` operations with `failure`
    pub fn fail_times(&self, failure: MockFailure, times: usize) {
        let mut state = self.state.lock().unwrap();
        state.failures.extend(std::iter::repeat_n(failure, times));
    }

    /// Fail every operation with `failure`
    pub fn fail_always(&self, failure: MockFailure) {
        self.state.lock().unwrap().always_fail = Some(failure);
    }

    /// Report exactly these events on the next successful operation
    pub fn with_events(&self, events: Vec<ProgressEvent>) {
        self.state.lock().unwrap().scripted_events = Some(events);
    }

    /// Size reported for an uploaded path
    pub fn with_file_size(&self, path: &str, size: u64) {
        self.state
            .lock()
            .unwrap()
            .file_sizes
            .insert(path.to_string(), size);
    }

    /// Files reported by a delete-all listing
    pub fn with_remote_files(&self, files: &[&str]) {
        self.state.lock().unwrap().remote_files = files.iter().map(|f| f.to_string()).collect();
    }

    /// Take `delay` (on the tokio clock) before answering each operation
    pub fn with_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    pub fn invalidations(&self) -> usize {
        self.state.lock().unwrap().invalidations
    }

    /// Record the call, wait out any delay, then either fail or report events
    async fn answer(
        &self,
        call: MockCall,
        default_events: Vec<ProgressEvent>,
        sink: &dyn ProgressProvider,
    ) -> Result<()> {
        let delay = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(call);
            state.delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let events = {
            let mut state = self.state.lock().unwrap();
            if let Some(failure) = state.always_fail.clone() {
                return Err(failure.into());
            }
            if !state.failures.is_empty() {
                return Err(state.failures.remove(0).into());
            }
            state.scripted_events.take().unwrap_or(default_events)
        };

        for event in events {
            sink.report(event);
        }
        Ok(())
    }

    fn file_events(&self, paths: &[String]) -> Vec<ProgressEvent> {
        let sizes = self.state.lock().unwrap().file_sizes.clone();
        paths
            .iter()
            .flat_map(|path| {
                let data = EventData::File {
                    path: path.clone(),
                    size_in_bytes: sizes.get(path).copied().unwrap_or(0),
                    content_type: None,
                };
                [
                    ProgressEvent::before(data.clone()),
                    ProgressEvent::completed(data),
                ]
            })
            .collect()
    }
}

#[async_trait]
impl AppDevClient for MockAppDevClient {
    async fn upload_files(
        &self,
        paths: &[PathBuf],
        options: &TransferOptions,
        sink: &dyn ProgressProvider,
    ) -> Result<()> {
        let paths: Vec<String> = paths.iter().map(|p| remote_path(p)).collect();
        let events = self.file_events(&paths);
        self.answer(
            MockCall::Upload {
                paths,
                no_clobber: options.no_clobber,
            },
            events,
            sink,
        )
        .await
    }

    async fn delete_files(&self, paths: &[String], sink: &dyn ProgressProvider) -> Result<()> {
        let events = self.file_events(paths);
        self.answer(
            MockCall::Delete {
                paths: paths.to_vec(),
            },
            events,
            sink,
        )
        .await
    }

    async fn rename_files(&self, specs: &[RenameSpec], sink: &dyn ProgressProvider) -> Result<()> {
        let events = specs
            .iter()
            .map(|spec| {
                ProgressEvent::completed(EventData::rename(&spec.old_full_path, &spec.new_full_path))
            })
            .collect();
        self.answer(
            MockCall::Rename {
                specs: specs.to_vec(),
            },
            events,
            sink,
        )
        .await
    }

    async fn delete_all_files(&self, sink: &dyn ProgressProvider) -> Result<()> {
        let files = self.state.lock().unwrap().remote_files.clone();
        let events = self.file_events(&files);
        self.answer(MockCall::DeleteAll, events, sink).await
    }

    async fn invalidate_credentials(&self) -> Result<()> {
        self.state.lock().unwrap().invalidations += 1;
        Ok(())
    }
}

/// Factory handing out one shared [`MockAppDevClient`]
#[derive(Clone, Default)]
pub struct MockClientFactory {
    client: MockAppDevClient,
    created: Arc<Mutex<Vec<ClientSettings>>>,
}

impl MockClientFactory {
    pub fn new(client: MockAppDevClient) -> Self {
        Self {
            client,
            created: Arc::default(),
        }
    }

    pub fn client(&self) -> &MockAppDevClient {
        &self.client
    }

    /// Settings of every client created so far
    pub fn created(&self) -> Vec<ClientSettings> {
        self.created.lock().unwrap().clone()
    }
}

impl AppDevClientFactory for MockClientFactory {
    fn create(&self, settings: ClientSettings) -> Result<Arc<dyn AppDevClient>> {
        self.created.lock().unwrap().push(settings);
        Ok(Arc::new(self.client.clone()))
    }
}
