//! Persistent wallet record storage
//!
//! The wallet persists exactly one [`WalletRecord`] under a fixed key:
//! the account identifier, the sealed private key envelope, and the
//! currently selected network. Backends:
//!
//! - **MemoryStore**: in-memory (testing)
//! - **FileStore**: local JSON files with restrictive permissions
//!
//! The interface is async to support remote backends.

use crate::vault::SecretEnvelope;
use crate::{AccountId, Error, NetworkId, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The single persisted wallet record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletRecord {
    /// Account this wallet controls
    pub account_id: AccountId,
    /// Sealed private key
    pub envelope: SecretEnvelope,
    /// Currently selected network
    pub network: NetworkId,
}

/// Trait for wallet record storage backends
#[async_trait]
pub trait WalletStore: Send + Sync {
    /// Store a record under the given key, replacing any existing one
    async fn put(&self, key: &str, record: &WalletRecord) -> Result<()>;

    /// Load the record under the given key, if any
    async fn get(&self, key: &str) -> Result<Option<WalletRecord>>;

    /// Delete the record under the given key
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check whether a record exists under the given key
    async fn exists(&self, key: &str) -> Result<bool>;
}

/// In-memory store for testing
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<String, WalletRecord>>>,
}

impl MemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WalletStore for MemoryStore {
    async fn put(&self, key: &str, record: &WalletRecord) -> Result<()> {
        let mut records = self.records.write().await;
        records.insert(key.to_string(), record.clone());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<WalletRecord>> {
        let records = self.records.read().await;
        Ok(records.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut records = self.records.write().await;
        records.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let records = self.records.read().await;
        Ok(records.contains_key(key))
    }
}

/// File system store for local persistence
#[derive(Debug)]
pub struct FileStore {
    /// Base directory for wallet files
    base_path: PathBuf,
}

impl FileStore {
    /// Create a new file store, creating the directory if needed
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();

        if !base_path.exists() {
            std::fs::create_dir_all(&base_path)?;
        }

        Ok(Self { base_path })
    }

    /// Get the file path for a record key
    fn record_path(&self, key: &str) -> PathBuf {
        // Sanitize to prevent path traversal
        let safe_key = key.replace(['/', '\\', '.', '~'], "_");
        self.base_path.join(format!("{}.wallet", safe_key))
    }
}

#[async_trait]
impl WalletStore for FileStore {
    async fn put(&self, key: &str, record: &WalletRecord) -> Result<()> {
        let path = self.record_path(key);
        let data = serde_json::to_vec_pretty(record)?;

        tokio::fs::write(&path, data).await?;

        // Envelope is encrypted, but keep the file private anyway
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&path, perms)?;
        }

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<WalletRecord>> {
        let path = self.record_path(key);

        if !path.exists() {
            return Ok(None);
        }

        let data = tokio::fs::read(&path).await?;
        let record: WalletRecord =
            serde_json::from_slice(&data).map_err(|e| Error::Storage(e.to_string()))?;

        Ok(Some(record))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.record_path(key);

        if path.exists() {
            // Overwrite with zeros before deleting
            let size = tokio::fs::metadata(&path).await?.len() as usize;
            let zeros = vec![0u8; size];
            tokio::fs::write(&path, zeros).await?;
            tokio::fs::remove_file(&path).await?;
        }

        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.record_path(key).exists())
    }
}
