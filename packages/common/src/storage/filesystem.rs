use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};

use super::error::StorageError;
use super::traits::{BoxReader, UploadArea, UploadStore};
use crate::filename::validate_flat_filename;

/// Filesystem-backed upload store.
///
/// General uploads live directly under `{base_path}`, library files under
/// `{base_path}/library`. Writes go to `{base_path}/.tmp` first and are
/// renamed into place once complete.
pub struct FilesystemUploadStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemUploadStore {
    /// Create the store, making sure its directories exist.
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join("library")).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            max_size,
        })
    }

    fn area_dir(&self, area: UploadArea) -> PathBuf {
        match area {
            UploadArea::General => self.base_path.clone(),
            UploadArea::Library => self.base_path.join("library"),
        }
    }

    fn file_path(&self, area: UploadArea, name: &str) -> Result<PathBuf, StorageError> {
        let name = validate_flat_filename(name)
            .map_err(|e| StorageError::InvalidName(e.message().to_string()))?;
        Ok(self.area_dir(area).join(name))
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl UploadStore for FilesystemUploadStore {
    async fn put_stream(
        &self,
        area: UploadArea,
        name: &str,
        mut reader: BoxReader,
    ) -> Result<u64, StorageError> {
        let target = self.file_path(area, name)?;
        let temp_path = self.temp_path();
        let mut total_bytes: u64 = 0;

        let mut buf = vec![0u8; 64 * 1024];
        let mut temp_file = fs::File::create(&temp_path).await?;

        loop {
            let n = match reader.read(&mut buf).await {
                Ok(n) => n,
                Err(e) => {
                    drop(temp_file);
                    let _ = fs::remove_file(&temp_path).await;
                    return Err(e.into());
                }
            };
            if n == 0 {
                break;
            }

            total_bytes += n as u64;
            if total_bytes > self.max_size {
                drop(temp_file);
                let _ = fs::remove_file(&temp_path).await;
                return Err(StorageError::SizeLimitExceeded {
                    actual: total_bytes,
                    limit: self.max_size,
                });
            }

            temp_file.write_all(&buf[..n]).await?;
        }

        temp_file.flush().await?;
        drop(temp_file);

        if let Err(e) = fs::rename(&temp_path, &target).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::debug!(?area, name, bytes = total_bytes, "Stored upload");
        Ok(total_bytes)
    }

    async fn get_stream(&self, area: UploadArea, name: &str) -> Result<BoxReader, StorageError> {
        let path = self.file_path(area, name)?;
        match fs::File::open(&path).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, area: UploadArea, name: &str) -> Result<bool, StorageError> {
        let path = self.file_path(area, name)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn delete(&self, area: UploadArea, name: &str) -> Result<bool, StorageError> {
        let path = self.file_path(area, name)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
