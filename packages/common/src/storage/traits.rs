use std::io::Cursor;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Separate namespaces for uploaded files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadArea {
    /// Lesson media, essay files and editor uploads.
    General,
    /// Digital library resources.
    Library,
}

/// Name-addressed file storage for uploads.
///
/// Callers choose the stored name; the store only refuses names that are
/// not flat filenames.
#[async_trait]
pub trait UploadStore: Send + Sync {
    /// Store bytes under `name`, returning the number of bytes written.
    async fn put(&self, area: UploadArea, name: &str, data: &[u8]) -> Result<u64, StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.put_stream(area, name, reader).await
    }

    /// Store data from an async reader, returning the number of bytes written.
    async fn put_stream(
        &self,
        area: UploadArea,
        name: &str,
        reader: BoxReader,
    ) -> Result<u64, StorageError>;

    /// Retrieve all bytes of a stored file.
    async fn get(&self, area: UploadArea, name: &str) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.get_stream(area, name).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Retrieve a stored file as a streaming async reader.
    async fn get_stream(&self, area: UploadArea, name: &str) -> Result<BoxReader, StorageError>;

    async fn exists(&self, area: UploadArea, name: &str) -> Result<bool, StorageError>;

    /// Returns `true` if the file was deleted, `false` if it did not exist.
    async fn delete(&self, area: UploadArea, name: &str) -> Result<bool, StorageError>;
}
