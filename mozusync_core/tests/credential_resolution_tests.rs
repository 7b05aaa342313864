//! Credential resolution through the saved-password store and prompt

use mozusync_core::auth::{
    AuthTicket, CredentialResolver, Credentials, DeveloperContext, InvalidationMode,
    MemoryTicketStore, PromptingResolver, TicketStore,
};
use mozusync_core::error::{CredentialError, Error};
use mozusync_test_utils::{MockCredentialStore, MockPrompter};
use std::sync::Arc;

const BASE: &str = "https://home.mozu.com";
const SERVICE: &str = "Mozu AppDev Sync: Production";
const USER: &str = "dev@example.com";

fn context() -> DeveloperContext {
    DeveloperContext::new(BASE, USER)
}

fn resolver(
    tickets: Arc<MemoryTicketStore>,
    store: MockCredentialStore,
    prompter: MockPrompter,
) -> PromptingResolver {
    PromptingResolver::new(tickets, Arc::new(store), Arc::new(prompter))
}

fn password_of(credentials: Credentials) -> String {
    match credentials {
        Credentials::Password { password, .. } => password.expose_secret(),
        other => panic!("expected a password, got {other:?}"),
    }
}

#[tokio::test]
async fn cached_ticket_is_used_without_prompting() {
    let tickets = Arc::new(MemoryTicketStore::new());
    tickets.put(BASE, USER, &AuthTicket::new("T")).await.unwrap();
    let prompter = MockPrompter::new();
    let resolver = resolver(tickets.clone(), MockCredentialStore::new(), prompter.clone());

    let credentials = resolver.resolve(&context()).await.unwrap();

    assert_eq!(credentials, Credentials::Ticket(AuthTicket::new("T")));
    assert!(prompter.prompts().is_empty());
    assert_eq!(resolver.invalidation_mode(), InvalidationMode::Ticket);

    resolver.invalidate(&context()).await.unwrap();
    assert!(tickets.get(BASE, USER).await.unwrap().is_none());
}

#[tokio::test]
async fn saved_password_is_used_before_prompting() {
    let store = MockCredentialStore::new().with_password(SERVICE, USER, "saved");
    let prompter = MockPrompter::new();
    let resolver = resolver(Arc::new(MemoryTicketStore::new()), store, prompter.clone());

    let credentials = resolver.resolve(&context()).await.unwrap();

    assert_eq!(password_of(credentials), "saved");
    assert!(prompter.prompts().is_empty());
    assert_eq!(resolver.invalidation_mode(), InvalidationMode::SavedPassword);
}

#[tokio::test]
async fn prompted_password_is_saved_for_next_time() {
    let store = MockCredentialStore::new();
    let prompter = MockPrompter::answering(&["typed"]);
    let resolver = resolver(Arc::new(MemoryTicketStore::new()), store.clone(), prompter.clone());

    let credentials = resolver.resolve(&context()).await.unwrap();

    assert_eq!(password_of(credentials), "typed");
    assert_eq!(
        prompter.prompts(),
        vec!["Enter your password to upload to Mozu AppDev Sync: Production.".to_string()]
    );
    assert_eq!(store.password(SERVICE, USER).as_deref(), Some("typed"));
}

#[tokio::test]
async fn invalidating_a_saved_password_prompts_again() {
    let store = MockCredentialStore::new().with_password(SERVICE, USER, "wrong");
    let prompter = MockPrompter::answering(&["right"]);
    let resolver = resolver(Arc::new(MemoryTicketStore::new()), store.clone(), prompter.clone());

    assert_eq!(password_of(resolver.resolve(&context()).await.unwrap()), "wrong");

    resolver.invalidate(&context()).await.unwrap();
    assert!(store.password(SERVICE, USER).is_none());

    assert_eq!(password_of(resolver.resolve(&context()).await.unwrap()), "right");
    assert_eq!(prompter.prompts().len(), 1);
}

#[tokio::test]
async fn declined_prompt_requires_authorization() {
    let resolver = resolver(
        Arc::new(MemoryTicketStore::new()),
        MockCredentialStore::new(),
        MockPrompter::new(),
    );

    let err = resolver.resolve(&context()).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Credential(CredentialError::AuthorizationRequired { ref service }) if service == SERVICE
    ));
    assert_eq!(
        err.to_string(),
        "Need authorization for Mozu AppDev Sync: Production to continue."
    );
}

#[tokio::test]
async fn configured_password_skips_store_and_prompt() {
    let prompter = MockPrompter::new();
    let resolver = resolver(
        Arc::new(MemoryTicketStore::new()),
        MockCredentialStore::new(),
        prompter.clone(),
    );

    let credentials = resolver
        .resolve(&context().with_password("Password123"))
        .await
        .unwrap();

    assert_eq!(password_of(credentials), "Password123");
    assert!(prompter.prompts().is_empty());
}
