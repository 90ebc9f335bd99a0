//! Object storage for uploaded asset files.
//!
//! Keys are relative, slash-separated paths such as
//! `projects/12/ceremony/1735689600000-IMG_0001.jpg`. The provider decides
//! where the bytes live and which public URL serves them.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

/// Default root directory when `STORAGE_DIR` is unset.
const DEFAULT_STORAGE_DIR: &str = "./storage";

/// Default public prefix when `STORAGE_PUBLIC_URL` is unset.
const DEFAULT_PUBLIC_URL: &str = "http://localhost:3000/files";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),
}

/// Where an uploaded object ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
    pub size_bytes: i64,
}

/// Storage backend trait
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Write `bytes` under `key`, replacing any existing object.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<StoredObject, StorageError>;

    /// Remove the object. Missing objects are not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Public URL the object is served from.
    fn public_url(&self, key: &str) -> String;
}

// ---------------------------------------------------------------------------
// Local filesystem
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LocalStorageConfig {
    pub root_path: PathBuf,
    /// URL prefix the API serves `root_path` under.
    pub public_url: String,
}

impl LocalStorageConfig {
    /// | Variable             | Default                        |
    /// |----------------------|--------------------------------|
    /// | `STORAGE_DIR`        | `./storage`                    |
    /// | `STORAGE_PUBLIC_URL` | `http://localhost:3000/files`  |
    pub fn from_env() -> Self {
        Self {
            root_path: std::env::var("STORAGE_DIR")
                .unwrap_or_else(|_| DEFAULT_STORAGE_DIR.to_string())
                .into(),
            public_url: std::env::var("STORAGE_PUBLIC_URL")
                .unwrap_or_else(|_| DEFAULT_PUBLIC_URL.to_string()),
        }
    }
}

/// Local filesystem storage backend
pub struct LocalStorage {
    config: LocalStorageConfig,
}

impl LocalStorage {
    pub fn new(config: LocalStorageConfig) -> Self {
        Self { config }
    }

    pub fn root(&self) -> &Path {
        &self.config.root_path
    }

    /// Resolve a key below the root, refusing anything that could escape it.
    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let is_clean = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_clean {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.config.root_path.join(relative))
    }
}

#[async_trait]
impl StorageProvider for LocalStorage {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<StoredObject, StorageError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::File::create(&path).await?;
        file.write_all(bytes).await?;
        file.flush().await?;

        tracing::debug!(key, size = bytes.len(), "Stored object");
        Ok(StoredObject {
            key: key.to_string(),
            url: self.public_url(key),
            size_bytes: bytes.len() as i64,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.resolve(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.config.public_url.trim_end_matches('/'), key)
    }
}
