use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Path-addressed blob storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `data` at `path`, creating parent directories as needed.
    ///
    /// Fails with `StorageError::AlreadyExists` when the path is taken.
    async fn save(&self, path: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Open the blob at `path` for streaming.
    async fn open(&self, path: &str) -> Result<BoxReader, StorageError>;

    /// Read the whole blob at `path`.
    async fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.open(path).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Remove the blob at `path`. A missing blob is not an error.
    async fn delete(&self, path: &str) -> Result<(), StorageError>;

    /// Check whether a blob exists at `path`.
    async fn exists(&self, path: &str) -> Result<bool, StorageError>;
}
