//! Mock implementations for testing

mod client;
mod credentials;

pub use client::{MockAppDevClient, MockCall, MockClientFactory, MockFailure};
pub use credentials::{MockCredentialStore, MockPrompter};
