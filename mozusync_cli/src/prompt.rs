//! Interactive password prompt

use crate::terminal::can_prompt;
use async_trait::async_trait;
use dialoguer::Password;
use mozusync_core::error::{CredentialError, Result};
use mozusync_core::auth::PasswordPrompter;
use mozusync_core::security::SecureString;

/// Asks on the terminal with masked input
pub struct DialoguerPrompter;

#[async_trait]
impl PasswordPrompter for DialoguerPrompter {
    async fn prompt_password(&self, username: &str, message: &str) -> Result<SecureString> {
        if !can_prompt() {
            return Err(CredentialError::prompt(format!(
                "cannot prompt for the password of {username} without a terminal"
            ))
            .into());
        }

        let prompt = format!("{message}\nPassword for {username}");
        let answer =
            tokio::task::spawn_blocking(move || Password::new().with_prompt(prompt).interact())
                .await
                .map_err(|e| CredentialError::prompt(e.to_string()))?
                .map_err(|e| CredentialError::prompt(e.to_string()))?;

        Ok(SecureString::new(answer))
    }
}
