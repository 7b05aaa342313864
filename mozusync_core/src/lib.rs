//! mozusync core library
//!
//! Building blocks for syncing a local theme or application directory with a
//! developer file store: the remote client, per-file progress events, the
//! in-process event bus, and developer account authentication.

pub mod auth;
pub mod client;
pub mod error;
pub mod events;
pub mod progress;
pub mod security;

pub use auth::{CredentialResolver, Credentials, DeveloperContext, PasswordPrompter};
pub use client::{
    AppDevClient, AppDevClientFactory, ClientSettings, HttpAppDevClient, HttpClientFactory,
    RenameSpec, TransferOptions,
};
pub use error::{Error, Result};
pub use events::{BusEvent, ChangeKind, EventBus};
pub use progress::{EventData, NullProvider, Phase, ProgressEvent, ProgressProvider};
