//! Signing keys and key persistence.
//!
//! # Security
//! - Keys are loaded from a file, an environment variable, or generated fresh
//! - Keys are never logged; only the derived owner address is

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer as _;
use async_trait::async_trait;
use thiserror::Error;

use crate::config::schema::{IdentityConfig, KeySource};
use crate::transport::Owner;

/// Errors raised while loading, creating or using a signing key.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum KeyStoreError {
    /// Key material could not be parsed.
    #[error("invalid private key format: {0}")]
    InvalidKey(String),

    /// Key file could not be read or written.
    #[error("key storage error at {path}: {reason}")]
    Io { path: String, reason: String },

    /// Environment variable holding the key is not set.
    #[error("environment variable {0} not set")]
    MissingEnv(String),

    /// Signing failed.
    #[error("signing failed: {0}")]
    Signing(String),
}

/// A signing identity.
#[async_trait]
pub trait Signer: Send + Sync + fmt::Debug {
    /// Owner address derived from the key.
    fn address(&self) -> String;

    /// Sign arbitrary bytes; returns a `0x`-prefixed hex signature.
    async fn sign_message(&self, message: &[u8]) -> Result<String, KeyStoreError>;
}

/// Secp256k1 signer held in memory.
#[derive(Clone)]
pub struct LocalSigner {
    inner: PrivateKeySigner,
}

impl LocalSigner {
    /// Generate a fresh random key.
    pub fn random() -> Self {
        Self {
            inner: PrivateKeySigner::random(),
        }
    }

    /// Parse a hex-encoded private key (with or without 0x prefix).
    pub fn from_private_key(private_key_hex: &str) -> Result<Self, KeyStoreError> {
        let key_hex = private_key_hex
            .trim()
            .strip_prefix("0x")
            .unwrap_or(private_key_hex.trim());
        let inner: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| KeyStoreError::InvalidKey(format!("{}", e)))?;
        Ok(Self { inner })
    }

    fn to_hex(&self) -> String {
        alloy::hex::encode(self.inner.to_bytes())
    }
}

impl fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.inner.address())
            .finish()
    }
}

#[async_trait]
impl Signer for LocalSigner {
    fn address(&self) -> String {
        self.inner.address().to_string().to_lowercase()
    }

    async fn sign_message(&self, message: &[u8]) -> Result<String, KeyStoreError> {
        let signature = self
            .inner
            .sign_message(message)
            .await
            .map_err(|e| KeyStoreError::Signing(e.to_string()))?;
        Ok(alloy::hex::encode_prefixed(signature.as_bytes()))
    }
}

/// Source of the signing key used for self-provisioned sessions.
pub trait KeyStore: Send + Sync {
    fn signing_key(&self) -> Result<Arc<dyn Signer>, KeyStoreError>;
}

/// Generates a new key on every call; nothing is persisted.
#[derive(Debug, Default, Clone, Copy)]
pub struct EphemeralKeyStore;

impl KeyStore for EphemeralKeyStore {
    fn signing_key(&self) -> Result<Arc<dyn Signer>, KeyStoreError> {
        Ok(Arc::new(LocalSigner::random()))
    }
}

/// Hex key stored in a file, created on first use.
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    path: PathBuf,
}

impl FileKeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_error(&self, e: std::io::Error) -> KeyStoreError {
        KeyStoreError::Io {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        }
    }

    fn create(&self) -> Result<LocalSigner, KeyStoreError> {
        let signer = LocalSigner::random();
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let mut file = open_private(&self.path).map_err(|e| self.io_error(e))?;
        file.write_all(signer.to_hex().as_bytes())
            .map_err(|e| self.io_error(e))?;
        tracing::info!(
            path = %self.path.display(),
            address = %signer.address(),
            "Created new signing key"
        );
        Ok(signer)
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new().write(true).create_new(true).open(path)
}

impl KeyStore for FileKeyStore {
    fn signing_key(&self) -> Result<Arc<dyn Signer>, KeyStoreError> {
        let signer = if self.path.exists() {
            let content = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
            LocalSigner::from_private_key(&content)?
        } else {
            self.create()?
        };
        Ok(Arc::new(signer))
    }
}

/// Hex key read from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvKeyStore {
    var: String,
}

impl EnvKeyStore {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl KeyStore for EnvKeyStore {
    fn signing_key(&self) -> Result<Arc<dyn Signer>, KeyStoreError> {
        let key = std::env::var(&self.var).map_err(|_| KeyStoreError::MissingEnv(self.var.clone()))?;
        Ok(Arc::new(LocalSigner::from_private_key(&key)?))
    }
}

/// Build the key store selected by configuration.
pub fn key_store_from_config(config: &IdentityConfig) -> Arc<dyn KeyStore> {
    match config.key_source {
        KeySource::Ephemeral => Arc::new(EphemeralKeyStore),
        KeySource::File => Arc::new(FileKeyStore::new(
            config.key_path.clone().unwrap_or_default(),
        )),
        KeySource::Env => Arc::new(EnvKeyStore::new(config.key_env_var.clone())),
    }
}

/// Validate a signer's address as an owner.
pub(crate) fn owner_of(signer: &dyn Signer) -> Result<Owner, String> {
    Owner::parse(&signer.address())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known test private key (Anvil's first account)
    const TEST_PRIVATE_KEY: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    #[test]
    fn test_signer_from_private_key() {
        let signer = LocalSigner::from_private_key(TEST_PRIVATE_KEY).unwrap();
        assert_eq!(signer.address(), TEST_ADDRESS);

        let prefixed = LocalSigner::from_private_key(&format!("0x{}\n", TEST_PRIVATE_KEY)).unwrap();
        assert_eq!(prefixed.address(), TEST_ADDRESS);
    }

    #[test]
    fn test_invalid_private_key() {
        let result = LocalSigner::from_private_key("invalid_key");
        assert!(matches!(result, Err(KeyStoreError::InvalidKey(_))));
    }

    #[test]
    fn test_ephemeral_keys_differ() {
        let store = EphemeralKeyStore;
        let a = store.signing_key().unwrap();
        let b = store.signing_key().unwrap();
        assert_ne!(a.address(), b.address());
        assert!(owner_of(a.as_ref()).is_ok());
    }

    #[test]
    fn test_file_key_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys").join("signer.key");
        let store = FileKeyStore::new(&path);

        let first = store.signing_key().unwrap();
        assert!(path.exists());
        let second = store.signing_key().unwrap();
        assert_eq!(first.address(), second.address());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_file_key_store_reads_existing_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signer.key");
        fs::write(&path, TEST_PRIVATE_KEY).unwrap();
        let signer = FileKeyStore::new(&path).signing_key().unwrap();
        assert_eq!(signer.address(), TEST_ADDRESS);
    }

    #[test]
    fn test_env_key_store() {
        let var = "LEDGER_SYNC_TEST_KEY_STORE";
        std::env::remove_var(var);
        let store = EnvKeyStore::new(var);
        assert_eq!(
            store.signing_key().unwrap_err(),
            KeyStoreError::MissingEnv(var.to_string())
        );
        std::env::set_var(var, TEST_PRIVATE_KEY);
        assert_eq!(store.signing_key().unwrap().address(), TEST_ADDRESS);
        std::env::remove_var(var);
    }

    #[tokio::test]
    async fn test_sign_message() {
        let signer = LocalSigner::from_private_key(TEST_PRIVATE_KEY).unwrap();
        let signature = signer.sign_message(b"p1:chain-9").await.unwrap();
        // 0x + 65 bytes (r, s, v)
        assert_eq!(signature.len(), 2 + 130);
        assert!(signature.starts_with("0x"));
    }
}
