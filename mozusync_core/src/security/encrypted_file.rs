//! Password storage in an encrypted JSON file
//!
//! Each password is sealed with AES-256-GCM under a key derived with
//! Argon2id from a per-user master key and the store's salt.

use crate::security::{CREDENTIAL_STORE_DIR_ENV, CredentialStore, CredentialStoreError, SavedPassword};
use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use argon2::{Algorithm, Argon2, Params, Version, password_hash::SaltString};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use zeroize::Zeroizing;

const STORE_FILE: &str = "passwords.json";
const MASTER_KEY_FILE: &str = ".key";
const STORE_VERSION: u32 = 1;

/// Password store backed by a single encrypted file
pub struct EncryptedFileStore {
    file_path: PathBuf,
    master_key: Zeroizing<Vec<u8>>,
}

#[derive(Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    salt: String,
    /// service -> username -> sealed password
    services: BTreeMap<String, BTreeMap<String, SealedPassword>>,
}

#[derive(Serialize, Deserialize)]
struct SealedPassword {
    nonce: Vec<u8>,
    ciphertext: Vec<u8>,
    saved_at: DateTime<Utc>,
}

impl EncryptedFileStore {
    /// Open the store in `$MOZUSYNC_CREDENTIAL_STORE_DIR` or the user config directory
    pub async fn open_default() -> Result<Self, CredentialStoreError> {
        let dir = match std::env::var(CREDENTIAL_STORE_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => dirs::config_dir()
                .ok_or_else(|| {
                    CredentialStoreError::AccessDenied(
                        "Could not determine config directory".to_string(),
                    )
                })?
                .join("mozusync")
                .join("credentials"),
        };
        Self::open(&dir).await
    }

    /// Open (creating if needed) the store in a directory
    pub async fn open(dir: &Path) -> Result<Self, CredentialStoreError> {
        fs::create_dir_all(dir).await?;
        let master_key = load_or_create_master_key(&dir.join(MASTER_KEY_FILE)).await?;
        debug!("Opened credential store at {}", dir.display());

        Ok(Self {
            file_path: dir.join(STORE_FILE),
            master_key,
        })
    }

    fn cipher(&self, salt: &str) -> Result<Aes256Gcm, CredentialStoreError> {
        let salt = SaltString::from_b64(salt).map_err(crypto_error)?;
        let params = Params::new(19 * 1024, 2, 1, Some(32)).map_err(crypto_error)?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut key_bytes = Zeroizing::new([0u8; 32]);
        argon2
            .hash_password_into(&self.master_key, salt.as_str().as_bytes(), key_bytes.as_mut())
            .map_err(crypto_error)?;

        Ok(Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key_bytes.as_ref())))
    }

    async fn load(&self) -> Result<StoreFile, CredentialStoreError> {
        if !self.file_path.exists() {
            return Ok(StoreFile {
                version: STORE_VERSION,
                salt: SaltString::generate(&mut OsRng).to_string(),
                services: BTreeMap::new(),
            });
        }

        let data = fs::read(&self.file_path).await?;
        let file: StoreFile = serde_json::from_slice(&data)
            .map_err(|e| CredentialStoreError::CorruptedData(e.to_string()))?;
        if file.version != STORE_VERSION {
            return Err(CredentialStoreError::CorruptedData(format!(
                "unsupported store version {}",
                file.version
            )));
        }
        Ok(file)
    }

    async fn save(&self, file: &StoreFile) -> Result<(), CredentialStoreError> {
        let data = serde_json::to_vec_pretty(file)
            .map_err(|e| CredentialStoreError::CorruptedData(e.to_string()))?;

        let temp_path = self.file_path.with_extension("tmp");
        let mut out = fs::File::create(&temp_path).await?;
        out.write_all(&data).await?;
        out.sync_all().await?;
        drop(out);

        fs::rename(&temp_path, &self.file_path).await?;
        Ok(())
    }
}

async fn load_or_create_master_key(path: &Path) -> Result<Zeroizing<Vec<u8>>, CredentialStoreError> {
    if path.exists() {
        return Ok(Zeroizing::new(fs::read(path).await?));
    }

    let key = Aes256Gcm::generate_key(&mut OsRng).to_vec();
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(&key).await?;
    file.sync_all().await?;
    Ok(Zeroizing::new(key))
}

fn crypto_error(e: impl std::fmt::Display) -> CredentialStoreError {
    CredentialStoreError::CryptoError(e.to_string())
}

fn not_found(service: &str, username: &str) -> CredentialStoreError {
    CredentialStoreError::NotFound(format!("{service}/{username}"))
}

#[async_trait]
impl CredentialStore for EncryptedFileStore {
    async fn store(&self, entry: &SavedPassword) -> Result<(), CredentialStoreError> {
        let mut file = self.load().await?;
        let cipher = self.cipher(&file.salt)?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, entry.password.as_bytes())
            .map_err(crypto_error)?;

        file.services
            .entry(entry.service.clone())
            .or_default()
            .insert(
                entry.username.clone(),
                SealedPassword {
                    nonce: nonce.to_vec(),
                    ciphertext,
                    saved_at: Utc::now(),
                },
            );

        self.save(&file).await
    }

    async fn retrieve(
        &self,
        service: &str,
        username: &str,
    ) -> Result<SavedPassword, CredentialStoreError> {
        let file = self.load().await?;
        let sealed = file
            .services
            .get(service)
            .and_then(|users| users.get(username))
            .ok_or_else(|| not_found(service, username))?;

        let plaintext = self
            .cipher(&file.salt)?
            .decrypt(Nonce::from_slice(&sealed.nonce), sealed.ciphertext.as_ref())
            .map_err(|e| CredentialStoreError::CryptoError(format!("Decryption failed: {e}")))?;
        let password = String::from_utf8(plaintext)
            .map_err(|e| CredentialStoreError::CorruptedData(e.to_string()))?;

        Ok(SavedPassword {
            saved_at: Some(sealed.saved_at),
            ..SavedPassword::new(service, username, password)
        })
    }

    async fn delete(&self, service: &str, username: &str) -> Result<(), CredentialStoreError> {
        let mut file = self.load().await?;
        let users = file
            .services
            .get_mut(service)
            .ok_or_else(|| not_found(service, username))?;
        if users.remove(username).is_none() {
            return Err(not_found(service, username));
        }
        if users.is_empty() {
            file.services.remove(service);
        }

        self.save(&file).await
    }

    async fn list_accounts(&self, service: &str) -> Result<Vec<String>, CredentialStoreError> {
        let file = self.load().await?;
        Ok(file
            .services
            .get(service)
            .map(|users| users.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn list_services(&self) -> Result<Vec<String>, CredentialStoreError> {
        Ok(self.load().await?.services.into_keys().collect())
    }

    fn name(&self) -> &str {
        "Encrypted File Store"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PRODUCTION: &str = "Mozu AppDev Sync: Production";

    async fn open_store() -> (EncryptedFileStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = EncryptedFileStore::open(&temp.path().join("credentials"))
            .await
            .unwrap();
        (store, temp)
    }

    #[tokio::test]
    async fn test_store_and_retrieve() {
        let (store, _temp) = open_store().await;
        store
            .store(&SavedPassword::new(PRODUCTION, "dev@example.com", "Password123"))
            .await
            .unwrap();

        let saved = store.retrieve(PRODUCTION, "dev@example.com").await.unwrap();
        assert_eq!(saved.password.as_str(), "Password123");
        assert!(saved.saved_at.is_some());
    }

    #[tokio::test]
    async fn test_password_is_not_stored_in_clear() {
        let (store, temp) = open_store().await;
        store
            .store(&SavedPassword::new(PRODUCTION, "dev@example.com", "Password123"))
            .await
            .unwrap();

        let raw = std::fs::read_to_string(temp.path().join("credentials").join(STORE_FILE)).unwrap();
        assert!(raw.contains("dev@example.com"));
        assert!(!raw.contains("Password123"));
    }

    #[tokio::test]
    async fn test_store_replaces_existing_password() {
        let (store, _temp) = open_store().await;
        store
            .store(&SavedPassword::new(PRODUCTION, "dev@example.com", "old"))
            .await
            .unwrap();
        store
            .store(&SavedPassword::new(PRODUCTION, "dev@example.com", "new"))
            .await
            .unwrap();

        let saved = store.retrieve(PRODUCTION, "dev@example.com").await.unwrap();
        assert_eq!(saved.password.as_str(), "new");
        assert_eq!(store.list_accounts(PRODUCTION).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_empty_service() {
        let (store, _temp) = open_store().await;
        store
            .store(&SavedPassword::new(PRODUCTION, "dev@example.com", "pw"))
            .await
            .unwrap();

        store.delete(PRODUCTION, "dev@example.com").await.unwrap();

        assert!(!store.exists(PRODUCTION, "dev@example.com").await.unwrap());
        assert!(store.list_services().await.unwrap().is_empty());
        assert!(matches!(
            store.delete(PRODUCTION, "dev@example.com").await,
            Err(CredentialStoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_services_are_kept_apart() {
        let (store, _temp) = open_store().await;
        store
            .store(&SavedPassword::new(PRODUCTION, "a@example.com", "pw1"))
            .await
            .unwrap();
        store
            .store(&SavedPassword::new("Mozu AppDev Sync: sandbox.example.com", "a@example.com", "pw2"))
            .await
            .unwrap();

        assert_eq!(store.list_services().await.unwrap().len(), 2);
        let saved = store.retrieve(PRODUCTION, "a@example.com").await.unwrap();
        assert_eq!(saved.password.as_str(), "pw1");
    }

    #[tokio::test]
    async fn test_reopen_uses_same_master_key() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("credentials");
        EncryptedFileStore::open(&dir)
            .await
            .unwrap()
            .store(&SavedPassword::new(PRODUCTION, "dev@example.com", "persisted"))
            .await
            .unwrap();

        let reopened = EncryptedFileStore::open(&dir).await.unwrap();
        let saved = reopened.retrieve(PRODUCTION, "dev@example.com").await.unwrap();
        assert_eq!(saved.password.as_str(), "persisted");
    }

    #[tokio::test]
    #[serial_test::serial]
    async fn test_open_default_honors_env_dir() {
        let temp = TempDir::new().unwrap();
        // SAFETY: serialized with every other test touching this variable
        unsafe { std::env::set_var(CREDENTIAL_STORE_DIR_ENV, temp.path()) };

        let store = EncryptedFileStore::open_default().await.unwrap();
        store
            .store(&SavedPassword::new(PRODUCTION, "dev@example.com", "pw"))
            .await
            .unwrap();

        unsafe { std::env::remove_var(CREDENTIAL_STORE_DIR_ENV) };
        assert!(temp.path().join(STORE_FILE).exists());
    }
}
