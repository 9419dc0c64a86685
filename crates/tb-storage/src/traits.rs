//! Storage abstraction trait.

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for tb_core::Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::IoError(source) => tb_core::Error::Io { source },
            StorageError::ConfigError(msg) => tb_core::Error::Internal(msg),
            other => tb_core::Error::Storage(other.to_string()),
        }
    }
}

/// Durable blob storage the pipeline relocates media into.
///
/// Uploads make a single attempt. A failed upload does not leave a visible
/// object behind: multipart uploads are aborted and single puts are atomic.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Short backend name used in logs (`s3`, `local`, `memory`).
    fn backend(&self) -> &'static str;

    /// Stream `reader` to `key` with `content_type` recorded as object
    /// metadata. Returns the number of bytes sent.
    async fn upload(
        &self,
        key: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
        content_type: &str,
    ) -> StorageResult<u64>;

    /// Remove the object at `key`. Removing a missing object is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Whether an object exists at `key`.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Public URL clients use to fetch `key`.
    fn public_url(&self, key: &str) -> String;
}
