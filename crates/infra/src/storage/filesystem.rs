use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use super::{ObjectStorage, StorageError, check_name};

/// Stores objects as `root/<bucket>/<filename>`.
#[derive(Debug, Clone)]
pub struct FilesystemStorage {
    root: PathBuf,
}

impl FilesystemStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn ensure_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        check_name(bucket)?;
        tokio::fs::create_dir_all(self.root.join(bucket)).await?;
        Ok(())
    }

    pub fn object_path(&self, bucket: &str, filename: &str) -> Result<PathBuf, StorageError> {
        check_name(bucket)?;
        check_name(filename)?;
        Ok(self.root.join(bucket).join(filename))
    }
}

#[async_trait]
impl ObjectStorage for FilesystemStorage {
    async fn save(
        &self,
        bucket: &str,
        filename: &str,
        content_type: &str,
        source: &Path,
    ) -> Result<(), StorageError> {
        let target = self.object_path(bucket, filename)?;
        self.ensure_bucket(bucket).await?;
        tokio::fs::copy(source, &target).await?;
        info!(bucket, filename, content_type, "object saved to filesystem storage");
        Ok(())
    }

    async fn get_link(&self, bucket: &str, filename: &str) -> Result<String, StorageError> {
        Ok(self.object_path(bucket, filename)?.display().to_string())
    }

    async fn delete(&self, bucket: &str, filename: &str) -> Result<(), StorageError> {
        tokio::fs::remove_file(self.object_path(bucket, filename)?).await?;
        Ok(())
    }
}
