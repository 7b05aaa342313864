//! Developer account authentication
//!
//! Calls to the file store carry a developer auth ticket. Tickets are cached
//! per environment and account; when none is cached a password is needed,
//! which comes from configuration, the saved-password store, or a prompt.

pub mod environment;
pub mod resolver;
pub mod ticket;

pub use environment::{PRODUCTION_BASE_URL, environment_name, service_name};
pub use resolver::{
    CredentialResolver, Credentials, InvalidationMode, PasswordPrompter, PromptingResolver,
    TicketResolver,
};
pub use ticket::{AuthTicket, FileTicketStore, MemoryTicketStore, TicketStore};

use crate::security::SecureString;

/// The developer account a sync run acts as
#[derive(Debug, Clone)]
pub struct DeveloperContext {
    pub base_url: String,
    pub email_address: String,
    /// Password given in configuration or on the command line
    pub password: Option<SecureString>,
}

impl DeveloperContext {
    pub fn new(base_url: impl Into<String>, email_address: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            email_address: email_address.into(),
            password: None,
        }
    }

    pub fn with_password(mut self, password: impl Into<SecureString>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Service name used for saved passwords
    pub fn service_name(&self) -> String {
        service_name(&self.base_url)
    }
}
