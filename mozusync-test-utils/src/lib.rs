//! Test utilities for mozusync
//!
//! Mock remote clients, credential stores and prompters, plus a builder for
//! throwaway project directories.

pub mod builders;
pub mod mocks;

pub use builders::TestProjectBuilder;
pub use mocks::{
    MockAppDevClient, MockCall, MockClientFactory, MockCredentialStore, MockFailure, MockPrompter,
};
