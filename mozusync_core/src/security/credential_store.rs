//! Credential storage trait and the saved password record

use crate::security::SecureString;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

/// Errors that can occur while reading or writing saved passwords
#[derive(Debug, Error)]
pub enum CredentialStoreError {
    /// No password saved for this service and username
    #[error("Credential not found: {0}")]
    NotFound(String),

    /// The store location could not be determined or opened
    #[error("Failed to access credential store: {0}")]
    AccessDenied(String),

    /// The store file could not be parsed
    #[error("Corrupted credential data: {0}")]
    CorruptedData(String),

    /// Encryption or decryption failed
    #[error("Cryptographic error: {0}")]
    CryptoError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A password saved for one developer account on one environment
#[derive(Clone)]
pub struct SavedPassword {
    /// Service name, e.g. `Mozu AppDev Sync: Production`
    pub service: String,
    /// Developer account email address
    pub username: String,
    pub password: SecureString,
    pub saved_at: Option<DateTime<Utc>>,
}

impl SavedPassword {
    pub fn new(
        service: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<SecureString>,
    ) -> Self {
        Self {
            service: service.into(),
            username: username.into(),
            password: password.into(),
            saved_at: None,
        }
    }
}

impl fmt::Debug for SavedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SavedPassword")
            .field("service", &self.service)
            .field("username", &self.username)
            .field("password", &"***")
            .field("saved_at", &self.saved_at)
            .finish()
    }
}

/// Keychain-like storage keyed by service and username
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Save or replace a password
    async fn store(&self, entry: &SavedPassword) -> Result<(), CredentialStoreError>;

    /// Look up the password for a service and username
    async fn retrieve(
        &self,
        service: &str,
        username: &str,
    ) -> Result<SavedPassword, CredentialStoreError>;

    /// Remove a saved password
    async fn delete(&self, service: &str, username: &str) -> Result<(), CredentialStoreError>;

    /// Usernames with a saved password for a service
    async fn list_accounts(&self, service: &str) -> Result<Vec<String>, CredentialStoreError>;

    /// Services with at least one saved password
    async fn list_services(&self) -> Result<Vec<String>, CredentialStoreError>;

    async fn exists(&self, service: &str, username: &str) -> Result<bool, CredentialStoreError> {
        match self.retrieve(service, username).await {
            Ok(_) => Ok(true),
            Err(CredentialStoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Human readable name of the backend
    fn name(&self) -> &str;
}
