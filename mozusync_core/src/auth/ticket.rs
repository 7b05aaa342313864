//! Cached developer auth tickets

use crate::error::{CredentialError, Result};
use crate::security::SecureString;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::fs;
use tokio::io::AsyncWriteExt;

const TICKET_FILE: &str = "tickets.json";

/// An access token issued for a developer account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthTicket {
    pub access_token: SecureString,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthTicket {
    pub fn new(access_token: impl Into<SecureString>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: None,
        }
    }

    pub fn expiring_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Storage for auth tickets keyed by environment and account
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// A live ticket, if one is cached; expired tickets count as absent
    async fn get(&self, base_url: &str, account: &str) -> Result<Option<AuthTicket>>;

    async fn put(&self, base_url: &str, account: &str, ticket: &AuthTicket) -> Result<()>;

    /// Forget a ticket; removing a missing ticket is not an error
    async fn remove(&self, base_url: &str, account: &str) -> Result<()>;
}

fn ticket_key(base_url: &str, account: &str) -> String {
    format!("{}|{}", base_url.trim_end_matches('/'), account)
}

/// Tickets held only for the life of the process
#[derive(Default)]
pub struct MemoryTicketStore {
    tickets: Mutex<HashMap<String, AuthTicket>>,
}

impl MemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, AuthTicket>>> {
        self.tickets
            .lock()
            .map_err(|_| CredentialError::ticket_cache("ticket cache lock poisoned").into())
    }
}

#[async_trait]
impl TicketStore for MemoryTicketStore {
    async fn get(&self, base_url: &str, account: &str) -> Result<Option<AuthTicket>> {
        let tickets = self.lock()?;
        Ok(tickets
            .get(&ticket_key(base_url, account))
            .filter(|ticket| !ticket.is_expired(Utc::now()))
            .cloned())
    }

    async fn put(&self, base_url: &str, account: &str, ticket: &AuthTicket) -> Result<()> {
        self.lock()?
            .insert(ticket_key(base_url, account), ticket.clone());
        Ok(())
    }

    async fn remove(&self, base_url: &str, account: &str) -> Result<()> {
        self.lock()?.remove(&ticket_key(base_url, account));
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct TicketRecord {
    access_token: String,
    expires_at: Option<DateTime<Utc>>,
}

/// Tickets persisted as JSON in the user data directory
pub struct FileTicketStore {
    path: PathBuf,
}

impl FileTicketStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/mozusync/tickets.json`
    pub fn open_default() -> Result<Self> {
        let dir = dirs::data_dir()
            .ok_or_else(|| CredentialError::ticket_cache("could not determine data directory"))?;
        Ok(Self::new(dir.join("mozusync").join(TICKET_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, TicketRecord>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let data = fs::read(&self.path).await?;
        serde_json::from_slice(&data)
            .map_err(|e| CredentialError::ticket_cache(format!("unreadable ticket cache: {e}")).into())
    }

    async fn save(&self, records: &BTreeMap<String, TicketRecord>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let data = serde_json::to_vec_pretty(records)
            .map_err(|e| CredentialError::ticket_cache(e.to_string()))?;

        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl TicketStore for FileTicketStore {
    async fn get(&self, base_url: &str, account: &str) -> Result<Option<AuthTicket>> {
        let records = self.load().await?;
        Ok(records
            .get(&ticket_key(base_url, account))
            .map(|record| AuthTicket {
                access_token: SecureString::new(record.access_token.clone()),
                expires_at: record.expires_at,
            })
            .filter(|ticket| !ticket.is_expired(Utc::now())))
    }

    async fn put(&self, base_url: &str, account: &str, ticket: &AuthTicket) -> Result<()> {
        let mut records = self.load().await?;
        records.insert(
            ticket_key(base_url, account),
            TicketRecord {
                access_token: ticket.access_token.expose_secret(),
                expires_at: ticket.expires_at,
            },
        );
        debug!("Caching auth ticket for {account}");
        self.save(&records).await
    }

    async fn remove(&self, base_url: &str, account: &str) -> Result<()> {
        let mut records = self.load().await?;
        if records.remove(&ticket_key(base_url, account)).is_some() {
            self.save(&records).await?;
        }
        Ok(())
    }
}
