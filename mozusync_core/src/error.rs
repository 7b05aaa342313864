//! Error types for the mozusync core library
//!
//! Errors are grouped by where they come from so callers can decide what is
//! retryable: local file access, the remote file store, and credential
//! resolution.

use thiserror::Error;

pub mod credential;
pub mod io;
pub mod remote;

pub use self::credential::CredentialError;
pub use self::io::{IoError, IoErrorKind};
pub use self::remote::{INVALID_CREDENTIALS, RemoteError};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the mozusync core library
///
/// - I/O errors: reading local files that are about to be synced
/// - Remote errors: anything the developer file store or the transport rejected
/// - Credential errors: keychain, ticket cache, and password prompt failures
#[derive(Error, Debug)]
pub enum Error {
    /// I/O related errors
    #[error(transparent)]
    Io(#[from] IoError),

    /// Remote file store errors
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Credential related errors
    #[error(transparent)]
    Credential(#[from] CredentialError),
}

impl Error {
    /// The error code reported by the remote API, if this error carries one
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Remote(remote) => remote.error_code(),
            _ => None,
        }
    }

    /// Whether the remote side rejected the credentials used for this call
    pub fn is_invalid_credentials(&self) -> bool {
        self.error_code() == Some(INVALID_CREDENTIALS)
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io(IoError::from_std(source))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Remote(RemoteError::from(err))
    }
}

impl From<crate::security::CredentialStoreError> for Error {
    fn from(err: crate::security::CredentialStoreError) -> Self {
        Self::Credential(CredentialError::from(err))
    }
}
