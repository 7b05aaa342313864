//! Local storage for developer account passwords
//!
//! Passwords entered at the prompt are kept per service and username in an
//! encrypted file so later runs against the same environment do not prompt.

pub mod credential_store;
pub mod encrypted_file;
pub mod secure_string;

pub use credential_store::{CredentialStore, CredentialStoreError, SavedPassword};
pub use encrypted_file::EncryptedFileStore;
pub use secure_string::SecureString;

/// Environment variable that relocates the credential store directory
pub const CREDENTIAL_STORE_DIR_ENV: &str = "MOZUSYNC_CREDENTIAL_STORE_DIR";

/// Open the default credential store for this user
pub async fn create_credential_store() -> Result<Box<dyn CredentialStore>, CredentialStoreError> {
    EncryptedFileStore::open_default()
        .await
        .map(|store| Box::new(store) as Box<dyn CredentialStore>)
}
