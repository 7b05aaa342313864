//! Remote file store client
//!
//! [`AppDevClient`] is the seam between a sync run and the developer file
//! store. Every operation reports per-file [`ProgressEvent`]s to a sink and
//! resolves to a single result for the whole batch.
//!
//! [`ProgressEvent`]: crate::progress::ProgressEvent

pub mod http;

pub use http::{HttpAppDevClient, HttpClientFactory};

use crate::auth::DeveloperContext;
use crate::error::Result;
use crate::progress::ProgressProvider;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything needed to build a client for one application
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub application_key: String,
    pub context: DeveloperContext,
    /// Do not persist auth tickets or prompt for passwords
    pub no_store_auth: bool,
    /// Directory that upload paths are relative to
    pub local_root: PathBuf,
}

/// Options for uploads
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferOptions {
    /// Send the local modification time so the server refuses to overwrite newer files
    pub no_clobber: bool,
}

/// One remote rename
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameSpec {
    pub old_full_path: String,
    pub new_full_path: String,
}

impl RenameSpec {
    pub fn new(old_full_path: impl Into<String>, new_full_path: impl Into<String>) -> Self {
        Self {
            old_full_path: old_full_path.into(),
            new_full_path: new_full_path.into(),
        }
    }
}

#[async_trait]
pub trait AppDevClient: Send + Sync {
    /// Upload local files, relative to the client's local root
    async fn upload_files(
        &self,
        paths: &[PathBuf],
        options: &TransferOptions,
        sink: &dyn ProgressProvider,
    ) -> Result<()>;

    /// Delete remote files by path
    async fn delete_files(&self, paths: &[String], sink: &dyn ProgressProvider) -> Result<()>;

    async fn rename_files(&self, specs: &[RenameSpec], sink: &dyn ProgressProvider) -> Result<()>;

    /// Delete every file in the application
    async fn delete_all_files(&self, sink: &dyn ProgressProvider) -> Result<()>;

    /// Discard the cached ticket or saved password behind the last call
    async fn invalidate_credentials(&self) -> Result<()>;
}

/// Builds clients once configuration has been validated
pub trait AppDevClientFactory: Send + Sync {
    fn create(&self, settings: ClientSettings) -> Result<Arc<dyn AppDevClient>>;
}

/// Remote path for a local relative path, always with forward slashes
pub fn remote_path(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            std::path::Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
