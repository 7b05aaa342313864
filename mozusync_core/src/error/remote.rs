//! Remote file store error types

use thiserror::Error;

/// Error code the developer platform uses for a rejected login or ticket
pub const INVALID_CREDENTIALS: &str = "INVALID_CREDENTIALS";

/// Errors reported by (or on the way to) the developer file store
#[derive(Error, Debug)]
pub enum RemoteError {
    /// The API answered with an error status
    #[error("{message}")]
    Api {
        status: u16,
        error_code: Option<String>,
        message: String,
    },

    /// The request never produced a usable response
    #[error("Request failed: {message}")]
    Transport { message: String },

    /// The API answered with a body we could not understand
    #[error("Unexpected response from the developer center: {message}")]
    UnexpectedResponse { message: String },
}

impl RemoteError {
    /// Create an API error with status, optional error code and message
    pub fn api(status: u16, error_code: Option<&str>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            error_code: error_code.map(str::to_string),
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create an unexpected-response error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            message: message.into(),
        }
    }

    /// The platform error code, when the API supplied one
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Api { error_code, .. } => error_code.as_deref(),
            _ => None,
        }
    }

    /// HTTP status of an API error
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::unexpected(err.to_string())
        } else {
            Self::transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_exposes_code_and_status() {
        let error = RemoteError::api(409, Some("VALIDATION_CONFLICT"), "File is newer on server");
        assert_eq!(error.error_code(), Some("VALIDATION_CONFLICT"));
        assert_eq!(error.status(), Some(409));
        assert_eq!(error.to_string(), "File is newer on server");
    }

    #[test]
    fn test_transport_error_has_no_code() {
        let error = RemoteError::transport("dns failure");
        assert_eq!(error.error_code(), None);
        assert_eq!(error.status(), None);
        assert!(error.to_string().contains("dns failure"));
    }
}
