//! Credential resolution for remote calls
//!
//! [`TicketResolver`] answers with a cached ticket or the configured password.
//! [`PromptingResolver`] wraps it and, when neither is available, falls back to
//! the saved-password store and finally an interactive prompt.

use crate::auth::{AuthTicket, DeveloperContext, TicketStore};
use crate::error::{CredentialError, Result};
use crate::security::{CredentialStore, CredentialStoreError, SavedPassword, SecureString};
use async_trait::async_trait;
use log::{debug, warn};
use std::sync::{Arc, Mutex};

/// What a remote call should authenticate with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// A cached access token
    Ticket(AuthTicket),
    /// A password to exchange for a new ticket
    Password {
        username: String,
        password: SecureString,
    },
}

#[async_trait]
pub trait CredentialResolver: Send + Sync {
    async fn resolve(&self, context: &DeveloperContext) -> Result<Credentials>;

    /// Remember a ticket obtained with a password
    async fn store_ticket(&self, context: &DeveloperContext, ticket: &AuthTicket) -> Result<()>;

    /// Discard whatever credential the last resolution produced
    async fn invalidate(&self, context: &DeveloperContext) -> Result<()>;
}

/// Asks the user for a developer account password
#[async_trait]
pub trait PasswordPrompter: Send + Sync {
    async fn prompt_password(&self, username: &str, message: &str) -> Result<SecureString>;
}

/// Cached ticket, else configured password
pub struct TicketResolver {
    tickets: Arc<dyn TicketStore>,
}

impl TicketResolver {
    pub fn new(tickets: Arc<dyn TicketStore>) -> Self {
        Self { tickets }
    }

    async fn cached_ticket(&self, context: &DeveloperContext) -> Result<Option<AuthTicket>> {
        self.tickets
            .get(context.base_url(), &context.email_address)
            .await
    }
}

#[async_trait]
impl CredentialResolver for TicketResolver {
    async fn resolve(&self, context: &DeveloperContext) -> Result<Credentials> {
        if let Some(password) = &context.password {
            return Ok(Credentials::Password {
                username: context.email_address.clone(),
                password: password.clone(),
            });
        }
        match self.cached_ticket(context).await? {
            Some(ticket) => Ok(Credentials::Ticket(ticket)),
            None => Err(CredentialError::missing_password(&context.email_address).into()),
        }
    }

    async fn store_ticket(&self, context: &DeveloperContext, ticket: &AuthTicket) -> Result<()> {
        self.tickets
            .put(context.base_url(), &context.email_address, ticket)
            .await
    }

    async fn invalidate(&self, context: &DeveloperContext) -> Result<()> {
        debug!("Removing invalid auth ticket");
        self.tickets
            .remove(context.base_url(), &context.email_address)
            .await
    }
}

/// Which stored credential is discarded on invalidation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidationMode {
    /// Only the cached ticket
    #[default]
    Ticket,
    /// The cached ticket and the saved password
    SavedPassword,
}

#[derive(Default)]
struct PromptState {
    mode: InvalidationMode,
    /// Password obtained from the store or the prompt during this process
    password: Option<SecureString>,
}

/// Falls back to the saved-password store and a prompt
pub struct PromptingResolver {
    base: TicketResolver,
    passwords: Arc<dyn CredentialStore>,
    prompter: Arc<dyn PasswordPrompter>,
    state: Mutex<PromptState>,
}

impl PromptingResolver {
    pub fn new(
        tickets: Arc<dyn TicketStore>,
        passwords: Arc<dyn CredentialStore>,
        prompter: Arc<dyn PasswordPrompter>,
    ) -> Self {
        Self {
            base: TicketResolver::new(tickets),
            passwords,
            prompter,
            state: Mutex::new(PromptState::default()),
        }
    }

    /// Invalidation that applies after the most recent resolution
    pub fn invalidation_mode(&self) -> InvalidationMode {
        self.state
            .lock()
            .map(|state| state.mode)
            .unwrap_or_default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut PromptState) -> T) -> Result<T> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| CredentialError::ticket_cache("resolver state lock poisoned"))?;
        Ok(f(&mut state))
    }

    async fn saved_or_prompted(&self, context: &DeveloperContext) -> Result<SecureString> {
        let service = context.service_name();
        let username = &context.email_address;

        match self.passwords.retrieve(&service, username).await {
            Ok(saved) => {
                debug!(
                    "Found credential for {username} on {service} in credential store. Obtaining new auth ticket..."
                );
                return Ok(saved.password);
            }
            Err(CredentialStoreError::NotFound(_)) => {
                debug!(
                    "Could not find a stored credential for {username} on {service}. Need authorization to upload."
                );
            }
            Err(e) => warn!("Credential store unavailable: {e}"),
        }

        let message = format!("Enter your password to upload to {service}.");
        let password = match self.prompter.prompt_password(username, &message).await {
            Ok(password) if !password.is_empty() => password,
            Ok(_) | Err(_) => return Err(CredentialError::authorization_required(&service).into()),
        };

        debug!("Storing credential in credential store...");
        let entry = SavedPassword::new(&service, username, password.clone());
        if let Err(e) = self.passwords.store(&entry).await {
            warn!("Could not save credential for {username}: {e}");
        }
        Ok(password)
    }
}

#[async_trait]
impl CredentialResolver for PromptingResolver {
    async fn resolve(&self, context: &DeveloperContext) -> Result<Credentials> {
        if context.password.is_some() {
            self.with_state(|state| state.mode = InvalidationMode::Ticket)?;
            return self.base.resolve(context).await;
        }

        let remembered = self.with_state(|state| state.password.clone())?;
        if let Some(password) = remembered {
            return Ok(Credentials::Password {
                username: context.email_address.clone(),
                password,
            });
        }

        if let Some(ticket) = self.base.cached_ticket(context).await? {
            debug!("Found stored authentication ticket for {}", context.email_address);
            self.with_state(|state| state.mode = InvalidationMode::Ticket)?;
            return Ok(Credentials::Ticket(ticket));
        }

        let password = self.saved_or_prompted(context).await?;
        self.with_state(|state| {
            state.mode = InvalidationMode::SavedPassword;
            state.password = Some(password.clone());
        })?;
        Ok(Credentials::Password {
            username: context.email_address.clone(),
            password,
        })
    }

    async fn store_ticket(&self, context: &DeveloperContext, ticket: &AuthTicket) -> Result<()> {
        self.base.store_ticket(context, ticket).await
    }

    async fn invalidate(&self, context: &DeveloperContext) -> Result<()> {
        self.base.invalidate(context).await?;

        let mode = self.with_state(|state| {
            let mode = state.mode;
            if mode == InvalidationMode::SavedPassword {
                state.password = None;
            }
            mode
        })?;

        if mode == InvalidationMode::SavedPassword {
            debug!("Removing invalid saved credential");
            match self
                .passwords
                .delete(&context.service_name(), &context.email_address)
                .await
            {
                Ok(()) | Err(CredentialStoreError::NotFound(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
