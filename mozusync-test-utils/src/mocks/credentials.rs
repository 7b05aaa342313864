//! In-memory credential store and scripted password prompter

use async_trait::async_trait;
use mozusync_core::auth::PasswordPrompter;
use mozusync_core::error::CredentialError;
use mozusync_core::security::{CredentialStore, CredentialStoreError, SavedPassword, SecureString};
use mozusync_core::Result;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Saved passwords kept in a map
#[derive(Clone, Default)]
pub struct MockCredentialStore {
    entries: Arc<Mutex<BTreeMap<(String, String), String>>>,
}

impl MockCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_password(self, service: &str, username: &str, password: &str) -> Self {
        self.entries.lock().unwrap().insert(
            (service.to_string(), username.to_string()),
            password.to_string(),
        );
        self
    }

    pub fn password(&self, service: &str, username: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap()
            .get(&(service.to_string(), username.to_string()))
            .cloned()
    }
}

#[async_trait]
impl CredentialStore for MockCredentialStore {
    async fn store(&self, entry: &SavedPassword) -> std::result::Result<(), CredentialStoreError> {
        self.entries.lock().unwrap().insert(
            (entry.service.clone(), entry.username.clone()),
            entry.password.expose_secret(),
        );
        Ok(())
    }

    async fn retrieve(
        &self,
        service: &str,
        username: &str,
    ) -> std::result::Result<SavedPassword, CredentialStoreError> {
        self.password(service, username)
            .map(|password| SavedPassword::new(service, username, password))
            .ok_or_else(|| CredentialStoreError::NotFound(format!("{service}/{username}")))
    }

    async fn delete(
        &self,
        service: &str,
        username: &str,
    ) -> std::result::Result<(), CredentialStoreError> {
        self.entries
            .lock()
            .unwrap()
            .remove(&(service.to_string(), username.to_string()))
            .map(|_| ())
            .ok_or_else(|| CredentialStoreError::NotFound(format!("{service}/{username}")))
    }

    async fn list_accounts(
        &self,
        service: &str,
    ) -> std::result::Result<Vec<String>, CredentialStoreError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .keys()
            .filter(|(s, _)| s == service)
            .map(|(_, u)| u.clone())
            .collect())
    }

    async fn list_services(&self) -> std::result::Result<Vec<String>, CredentialStoreError> {
        let mut services: Vec<String> = self
            .entries
            .lock()
            .unwrap()
            .keys()
            .map(|(s, _)| s.clone())
            .collect();
        services.dedup();
        Ok(services)
    }

    fn name(&self) -> &str {
        "Mock Credential Store"
    }
}

/// Prompter answering from a queue; an empty queue declines
#[derive(Clone, Default)]
pub struct MockPrompter {
    answers: Arc<Mutex<VecDeque<String>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answering(answers: &[&str]) -> Self {
        let prompter = Self::new();
        prompter
            .answers
            .lock()
            .unwrap()
            .extend(answers.iter().map(|a| a.to_string()));
        prompter
    }

    /// Messages shown so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl PasswordPrompter for MockPrompter {
    async fn prompt_password(&self, _username: &str, message: &str) -> Result<SecureString> {
        self.prompts.lock().unwrap().push(message.to_string());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .map(SecureString::from)
            .ok_or_else(|| CredentialError::authorization_required("mock prompt declined").into())
    }
}
