//! Authentication commands
//!
//! Passwords are saved per environment: the service name is derived from the
//! project's `base_url`, the same way a sync run looks them up.

use anyhow::{Context, Result};
use dialoguer::{Input, Password};
use mozusync_core::auth::{FileTicketStore, TicketStore, service_name};
use mozusync_core::security::{CredentialStore, SavedPassword, SecureString, create_credential_store};

/// Environment and account the commands act on
#[derive(Debug, Clone)]
pub struct AuthTarget {
    pub base_url: String,
    pub email_address: Option<String>,
}

impl AuthTarget {
    pub fn service(&self) -> String {
        service_name(&self.base_url)
    }
}

/// Save a developer account password
pub async fn login(target: &AuthTarget) -> Result<()> {
    let service = target.service();
    println!("{service}");
    println!("{}", "=".repeat(service.chars().count()));

    let username = match &target.email_address {
        Some(email) => email.clone(),
        None => Input::new()
            .with_prompt("Developer account email")
            .interact_text()
            .context("Failed to read email address")?,
    };

    let password = Password::new()
        .with_prompt(format!("Password for {username}"))
        .interact()
        .context("Failed to read password")?;
    let password = SecureString::new(password);

    let store = create_credential_store()
        .await
        .context("Failed to open credential store")?;
    store
        .store(&SavedPassword::new(&service, &username, password))
        .await
        .context("Failed to store credentials")?;

    println!("\n✓ Credentials stored securely");
    Ok(())
}

/// Remove a saved password and its cached auth ticket
pub async fn logout(target: &AuthTarget) -> Result<()> {
    let service = target.service();
    let store = create_credential_store()
        .await
        .context("Failed to open credential store")?;

    let accounts = store
        .list_accounts(&service)
        .await
        .context("Failed to list accounts")?;

    if accounts.is_empty() {
        println!("No stored credentials found for {service}.");
        return Ok(());
    }

    let chosen: Vec<String> = match &target.email_address {
        Some(email) if accounts.contains(email) => vec![email.clone()],
        Some(email) => {
            println!("Account not found: {email}");
            return Ok(());
        }
        None if accounts.len() == 1 => accounts.clone(),
        None => {
            println!("Multiple accounts found:");
            for (i, account) in accounts.iter().enumerate() {
                println!("{}. {}", i + 1, account);
            }

            let choice: String = Input::new()
                .with_prompt("Enter account name to remove (or 'all' to remove all)")
                .interact_text()
                .context("Failed to read choice")?;

            if choice.eq_ignore_ascii_case("all") {
                accounts.clone()
            } else if accounts.contains(&choice) {
                vec![choice]
            } else {
                println!("Account not found: {choice}");
                return Ok(());
            }
        }
    };

    let tickets = FileTicketStore::open_default().context("Failed to open ticket cache")?;
    for account in &chosen {
        remove_account(store.as_ref(), &tickets, &service, &target.base_url, account).await?;
        println!("✓ Removed credentials for: {account}");
    }

    Ok(())
}

async fn remove_account(
    store: &dyn CredentialStore,
    tickets: &dyn TicketStore,
    service: &str,
    base_url: &str,
    account: &str,
) -> Result<()> {
    store
        .delete(service, account)
        .await
        .context("Failed to delete credentials")?;
    tickets
        .remove(base_url, account)
        .await
        .context("Failed to remove auth ticket")?;
    Ok(())
}

/// List saved accounts without exposing passwords
pub async fn status(target: &AuthTarget) -> Result<()> {
    let store = create_credential_store()
        .await
        .context("Failed to open credential store")?;

    let services = store
        .list_services()
        .await
        .context("Failed to list services")?;

    if services.is_empty() {
        println!("No stored credentials found.");
        println!("Use 'mozusync auth login' to add credentials.");
        return Ok(());
    }

    let current = target.service();
    for service in services {
        let marker = if service == current { " (current)" } else { "" };
        println!("{service}{marker}:");
        for account in store
            .list_accounts(&service)
            .await
            .context("Failed to list accounts")?
        {
            println!("  • {account}");
        }
    }

    Ok(())
}
