//! HTTP implementation of [`AppDevClient`]

use crate::auth::{
    AuthTicket, CredentialResolver, Credentials, MemoryTicketStore, PasswordPrompter,
    PromptingResolver, TicketResolver, TicketStore,
};
use crate::client::{
    AppDevClient, AppDevClientFactory, ClientSettings, RenameSpec, TransferOptions, remote_path,
};
use crate::error::{INVALID_CREDENTIALS, Result, RemoteError};
use crate::progress::{EventData, ProgressEvent, ProgressProvider};
use crate::security::{CredentialStore, SecureString};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use futures::future::try_join_all;
use log::{debug, warn};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

const USER_CLAIMS_HEADER: &str = "x-vol-user-claims";
const FILE_MISSING: &str = "file does not exist";
const FILE_NOT_ON_SERVER: &str = "file was not found on the server";

/// Client for the file-based package API of one application
pub struct HttpAppDevClient {
    http: Client,
    settings: ClientSettings,
    resolver: Arc<dyn CredentialResolver>,
    token: Mutex<Option<SecureString>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthTicketRequest<'a> {
    email_address: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthTicketResponse {
    access_token: String,
    access_token_expiration: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ApiErrorBody {
    error_code: Option<String>,
    message: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RenameRequest<'a> {
    rename_infos: &'a [RenameSpec],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteFile {
    path: String,
}

impl HttpAppDevClient {
    pub fn new(settings: ClientSettings, resolver: Arc<dyn CredentialResolver>) -> Self {
        Self::with_client(Client::new(), settings, resolver)
    }

    pub fn with_client(
        http: Client,
        settings: ClientSettings,
        resolver: Arc<dyn CredentialResolver>,
    ) -> Self {
        Self {
            http,
            settings,
            resolver,
            token: Mutex::new(None),
        }
    }

    fn package_url(&self) -> String {
        format!(
            "{}/api/platform/appdev/filebasedpackage/packages/{}",
            self.settings.context.base_url(),
            self.settings.application_key
        )
    }

    fn auth_url(&self) -> String {
        format!(
            "{}/api/platform/developer/authtickets",
            self.settings.context.base_url()
        )
    }

    /// Token for the user-claims header, obtaining a ticket if needed
    async fn access_token(&self) -> Result<String> {
        let mut token = self.token.lock().await;
        if let Some(token) = token.as_ref() {
            return Ok(token.expose_secret());
        }

        let context = &self.settings.context;
        let ticket = match self.resolver.resolve(context).await? {
            Credentials::Ticket(ticket) => ticket,
            Credentials::Password { username, password } => {
                let ticket = self.request_ticket(&username, &password).await?;
                if let Err(e) = self.resolver.store_ticket(context, &ticket).await {
                    warn!("Could not cache auth ticket: {e}");
                }
                ticket
            }
        };

        let value = ticket.access_token.expose_secret();
        *token = Some(ticket.access_token);
        Ok(value)
    }

    async fn request_ticket(&self, username: &str, password: &SecureString) -> Result<AuthTicket> {
        debug!("Requesting auth ticket for {username}");
        let response = self
            .http
            .post(self.auth_url())
            .json(&AuthTicketRequest {
                email_address: username,
                password: password.as_str(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await.into());
        }

        let body: AuthTicketResponse = response.json().await?;
        let ticket = AuthTicket::new(body.access_token);
        Ok(match body.access_token_expiration {
            Some(expires_at) => ticket.expiring_at(expires_at),
            None => ticket,
        })
    }

    async fn upload_one(
        &self,
        path: &Path,
        options: &TransferOptions,
        sink: &dyn ProgressProvider,
    ) -> Result<()> {
        let remote = remote_path(path);
        let local = self.settings.local_root.join(path);
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        let (metadata, body) = match (
            tokio::fs::metadata(&local).await,
            tokio::fs::read(&local).await,
        ) {
            (Ok(metadata), Ok(body)) => (metadata, body),
            (Err(e), _) | (_, Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                sink.report(ProgressEvent::omitted(EventData::file(remote), FILE_MISSING));
                return Ok(());
            }
            (Err(e), _) | (_, Err(e)) => {
                return Err(crate::error::IoError::from_std(e).with_path(&local).into());
            }
        };

        let data = EventData::File {
            path: remote.clone(),
            size_in_bytes: body.len() as u64,
            content_type: Some(content_type.clone()),
        };
        sink.report(ProgressEvent::before(data.clone()));

        let mut query = vec![("filepath", remote)];
        if options.no_clobber
            && let Ok(modified) = metadata.modified()
        {
            let modified: DateTime<Utc> = modified.into();
            query.push((
                "lastModifiedTime",
                modified.to_rfc3339_opts(SecondsFormat::Millis, true),
            ));
        }

        let response = self
            .http
            .put(self.package_url())
            .query(&query)
            .header(USER_CLAIMS_HEADER, self.access_token().await?)
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => sink.report(ProgressEvent::completed(data)),
            StatusCode::CONFLICT => {
                let error = error_from_response(response).await;
                sink.report(ProgressEvent::rejected(data, error.to_string()));
            }
            _ => return Err(error_from_response(response).await.into()),
        }
        Ok(())
    }

    async fn delete_one(&self, path: &str, sink: &dyn ProgressProvider) -> Result<()> {
        let data = EventData::file(path);
        sink.report(ProgressEvent::before(data.clone()));

        let response = self
            .http
            .delete(self.package_url())
            .query(&[("filepath", path)])
            .header(USER_CLAIMS_HEADER, self.access_token().await?)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => sink.report(ProgressEvent::completed(data)),
            StatusCode::NOT_FOUND => {
                sink.report(ProgressEvent::omitted(data, FILE_NOT_ON_SERVER))
            }
            _ => return Err(error_from_response(response).await.into()),
        }
        Ok(())
    }

    async fn list_files(&self) -> Result<Vec<RemoteFile>> {
        let response = self
            .http
            .get(format!("{}/files", self.package_url()))
            .header(USER_CLAIMS_HEADER, self.access_token().await?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await.into());
        }
        Ok(response.json().await?)
    }
}

/// Turn a failed response into a [`RemoteError`]
async fn error_from_response(response: Response) -> RemoteError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let body: ApiErrorBody = serde_json::from_str(&text).unwrap_or_default();

    let error_code = match body.error_code {
        Some(code) => Some(code),
        None if status == StatusCode::UNAUTHORIZED => Some(INVALID_CREDENTIALS.to_string()),
        None => None,
    };
    let message = body
        .message
        .or_else(|| (!text.trim().is_empty()).then(|| text.trim().to_string()))
        .unwrap_or_else(|| status.to_string());

    RemoteError::Api {
        status: status.as_u16(),
        error_code,
        message,
    }
}

#[async_trait]
impl AppDevClient for HttpAppDevClient {
    async fn upload_files(
        &self,
        paths: &[PathBuf],
        options: &TransferOptions,
        sink: &dyn ProgressProvider,
    ) -> Result<()> {
        try_join_all(paths.iter().map(|path| self.upload_one(path, options, sink))).await?;
        Ok(())
    }

    async fn delete_files(&self, paths: &[String], sink: &dyn ProgressProvider) -> Result<()> {
        try_join_all(paths.iter().map(|path| self.delete_one(path, sink))).await?;
        Ok(())
    }

    async fn rename_files(&self, specs: &[RenameSpec], sink: &dyn ProgressProvider) -> Result<()> {
        if specs.is_empty() {
            return Ok(());
        }
        let events: Vec<EventData> = specs
            .iter()
            .map(|spec| EventData::rename(&spec.old_full_path, &spec.new_full_path))
            .collect();
        for data in &events {
            sink.report(ProgressEvent::before(data.clone()));
        }

        let response = self
            .http
            .post(format!("{}/files_rename", self.package_url()))
            .header(USER_CLAIMS_HEADER, self.access_token().await?)
            .json(&RenameRequest {
                rename_infos: specs,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await.into());
        }
        for data in events {
            sink.report(ProgressEvent::completed(data));
        }
        Ok(())
    }

    async fn delete_all_files(&self, sink: &dyn ProgressProvider) -> Result<()> {
        let files = self.list_files().await?;
        debug!("Deleting {} remote files", files.len());
        try_join_all(files.iter().map(|file| self.delete_one(&file.path, sink))).await?;
        Ok(())
    }

    async fn invalidate_credentials(&self) -> Result<()> {
        self.token.lock().await.take();
        self.resolver.invalidate(&self.settings.context).await
    }
}

/// Builds [`HttpAppDevClient`]s with the right credential resolver
pub struct HttpClientFactory {
    http: Client,
    tickets: Arc<dyn TicketStore>,
    passwords: Arc<dyn CredentialStore>,
    prompter: Arc<dyn PasswordPrompter>,
}

impl HttpClientFactory {
    pub fn new(
        tickets: Arc<dyn TicketStore>,
        passwords: Arc<dyn CredentialStore>,
        prompter: Arc<dyn PasswordPrompter>,
    ) -> Self {
        Self {
            http: Client::new(),
            tickets,
            passwords,
            prompter,
        }
    }
}

impl AppDevClientFactory for HttpClientFactory {
    fn create(&self, settings: ClientSettings) -> Result<Arc<dyn AppDevClient>> {
        let resolver: Arc<dyn CredentialResolver> = if settings.no_store_auth {
            Arc::new(TicketResolver::new(Arc::new(MemoryTicketStore::new())))
        } else {
            Arc::new(PromptingResolver::new(
                Arc::clone(&self.tickets),
                Arc::clone(&self.passwords),
                Arc::clone(&self.prompter),
            ))
        };
        Ok(Arc::new(HttpAppDevClient::with_client(
            self.http.clone(),
            settings,
            resolver,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::DeveloperContext;
    use crate::progress::{Phase, RecordingProvider};
    use mockito::{Matcher, Server};
    use tempfile::TempDir;

    const PACKAGE: &str = "/api/platform/appdev/filebasedpackage/packages/APPKEY";

    fn client_for(server: &Server, root: &Path, resolver: Arc<dyn CredentialResolver>) -> HttpAppDevClient {
        let settings = ClientSettings {
            application_key: "APPKEY".to_string(),
            context: DeveloperContext::new(server.url(), "dev@example.com"),
            no_store_auth: false,
            local_root: root.to_path_buf(),
        };
        HttpAppDevClient::new(settings, resolver)
    }

    async fn ticketed_resolver(server: &Server) -> Arc<dyn CredentialResolver> {
        let tickets = Arc::new(MemoryTicketStore::new());
        tickets
            .put(&server.url(), "dev@example.com", &AuthTicket::new("TICKET"))
            .await
            .unwrap();
        Arc::new(TicketResolver::new(tickets))
    }

    #[tokio::test]
    async fn test_upload_reports_completed_with_size() {
        let mut server = Server::new_async().await;
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("app.js"), b"console.log(1);").unwrap();

        let mock = server
            .mock("PUT", PACKAGE)
            .match_query(Matcher::UrlEncoded("filepath".into(), "app.js".into()))
            .match_header(USER_CLAIMS_HEADER, "TICKET")
            .with_status(200)
            .create_async()
            .await;

        let client = client_for(&server, temp.path(), ticketed_resolver(&server).await);
        let sink = RecordingProvider::new();
        client
            .upload_files(&[PathBuf::from("app.js")], &TransferOptions::default(), &sink)
            .await
            .unwrap();

        mock.assert_async().await;
        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].phase, Phase::Completed);
        assert_eq!(events[1].data.size_in_bytes(), 15);
    }

    #[tokio::test]
    async fn test_upload_of_vanished_file_is_omitted() {
        let server = Server::new_async().await;
        let temp = TempDir::new().unwrap();
        let client = client_for(&server, temp.path(), ticketed_resolver(&server).await);
        let sink = RecordingProvider::new();

        client
            .upload_files(&[PathBuf::from("gone.css")], &TransferOptions::default(), &sink)
            .await
            .unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].phase, Phase::Omitted);
        assert_eq!(events[0].reason.as_deref(), Some(FILE_MISSING));
    }

    #[tokio::test]
    async fn test_upload_conflict_is_rejected_not_failed() {
        let mut server = Server::new_async().await;
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("theme.json"), b"{}").unwrap();

        server
            .mock("PUT", PACKAGE)
            .match_query(Matcher::Any)
            .with_status(409)
            .with_body(r#"{"errorCode":"VALIDATION_CONFLICT","message":"server copy is newer"}"#)
            .create_async()
            .await;

        let client = client_for(&server, temp.path(), ticketed_resolver(&server).await);
        let sink = RecordingProvider::new();
        client
            .upload_files(
                &[PathBuf::from("theme.json")],
                &TransferOptions { no_clobber: true },
                &sink,
            )
            .await
            .unwrap();

        let last = sink.events().pop().unwrap();
        assert_eq!(last.phase, Phase::Rejected);
        assert_eq!(last.reason.as_deref(), Some("server copy is newer"));
    }

    #[tokio::test]
    async fn test_bare_unauthorized_maps_to_invalid_credentials() {
        let mut server = Server::new_async().await;
        server
            .mock("DELETE", PACKAGE)
            .match_query(Matcher::Any)
            .with_status(401)
            .create_async()
            .await;

        let temp = TempDir::new().unwrap();
        let client = client_for(&server, temp.path(), ticketed_resolver(&server).await);
        let err = client
            .delete_files(&["a.css".to_string()], &RecordingProvider::new())
            .await
            .unwrap_err();

        assert!(err.is_invalid_credentials());
    }

    #[tokio::test]
    async fn test_delete_missing_remote_file_is_omitted() {
        let mut server = Server::new_async().await;
        server
            .mock("DELETE", PACKAGE)
            .match_query(Matcher::UrlEncoded("filepath".into(), "old.css".into()))
            .with_status(404)
            .create_async()
            .await;

        let temp = TempDir::new().unwrap();
        let client = client_for(&server, temp.path(), ticketed_resolver(&server).await);
        let sink = RecordingProvider::new();
        client
            .delete_files(&["old.css".to_string()], &sink)
            .await
            .unwrap();

        let last = sink.events().pop().unwrap();
        assert_eq!(last.phase, Phase::Omitted);
        assert_eq!(last.reason.as_deref(), Some(FILE_NOT_ON_SERVER));
    }

    #[tokio::test]
    async fn test_password_is_exchanged_for_cached_ticket() {
        let mut server = Server::new_async().await;
        let auth = server
            .mock("POST", "/api/platform/developer/authtickets")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "emailAddress": "dev@example.com",
                "password": "Password123"
            })))
            .with_status(200)
            .with_body(r#"{"accessToken":"FRESH"}"#)
            .create_async()
            .await;
        server
            .mock("POST", format!("{PACKAGE}/files_rename").as_str())
            .match_header(USER_CLAIMS_HEADER, "FRESH")
            .with_status(200)
            .create_async()
            .await;

        let tickets = Arc::new(MemoryTicketStore::new());
        let resolver = Arc::new(TicketResolver::new(tickets.clone()));
        let temp = TempDir::new().unwrap();
        let mut client = client_for(&server, temp.path(), resolver);
        client.settings.context = client.settings.context.clone().with_password("Password123");

        let sink = RecordingProvider::new();
        client
            .rename_files(&[RenameSpec::new("a.css", "b.css")], &sink)
            .await
            .unwrap();

        auth.assert_async().await;
        let cached = tickets.get(&server.url(), "dev@example.com").await.unwrap();
        assert_eq!(cached, Some(AuthTicket::new("FRESH")));
        assert_eq!(sink.events().last().unwrap().phase, Phase::Completed);
    }

    #[tokio::test]
    async fn test_delete_all_lists_then_deletes() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", format!("{PACKAGE}/files").as_str())
            .with_status(200)
            .with_body(r#"[{"path":"a.css"},{"path":"b.js"}]"#)
            .create_async()
            .await;
        let deletes = server
            .mock("DELETE", PACKAGE)
            .match_query(Matcher::Any)
            .with_status(200)
            .expect(2)
            .create_async()
            .await;

        let temp = TempDir::new().unwrap();
        let client = client_for(&server, temp.path(), ticketed_resolver(&server).await);
        let sink = RecordingProvider::new();
        client.delete_all_files(&sink).await.unwrap();

        deletes.assert_async().await;
        let completed = sink
            .events()
            .iter()
            .filter(|e| e.phase == Phase::Completed)
            .count();
        assert_eq!(completed, 2);
    }
}
