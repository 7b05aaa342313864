//! Credential related error types

use crate::security::CredentialStoreError;
use thiserror::Error;

/// Failures while finding, prompting for, or caching developer credentials
#[derive(Error, Debug)]
pub enum CredentialError {
    /// No ticket, stored password or prompted password could be obtained
    #[error("Need authorization for {service} to continue.")]
    AuthorizationRequired { service: String },

    /// A password is needed but none was configured and prompting is disabled
    #[error("No password available for developer account {account}")]
    MissingPassword { account: String },

    /// The password prompt could not be shown or was aborted
    #[error("Password prompt failed: {message}")]
    Prompt { message: String },

    /// The auth ticket cache could not be read or written
    #[error("Auth ticket cache error: {message}")]
    TicketCache { message: String },

    /// The keychain replacement failed
    #[error(transparent)]
    Store(#[from] CredentialStoreError),
}

impl CredentialError {
    /// Create an authorization required error for a service
    pub fn authorization_required(service: &str) -> Self {
        Self::AuthorizationRequired {
            service: service.to_string(),
        }
    }

    /// Create a missing password error
    pub fn missing_password(account: &str) -> Self {
        Self::MissingPassword {
            account: account.to_string(),
        }
    }

    pub fn prompt(message: impl Into<String>) -> Self {
        Self::Prompt {
            message: message.into(),
        }
    }

    /// Create a ticket cache error
    pub fn ticket_cache(message: impl Into<String>) -> Self {
        Self::TicketCache {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_required_message() {
        let error = CredentialError::authorization_required("Mozu AppDev Sync: Production");
        assert_eq!(
            error.to_string(),
            "Need authorization for Mozu AppDev Sync: Production to continue."
        );
    }

    #[test]
    fn test_store_error_is_transparent() {
        let error = CredentialError::from(CredentialStoreError::NotFound("svc/user".to_string()));
        assert_eq!(error.to_string(), "Credential not found: svc/user");
    }
}
