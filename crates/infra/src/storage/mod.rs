//! Object storage for generated invoices and uploaded images.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

pub mod filesystem;
pub mod minio;

pub use filesystem::FilesystemStorage;
pub use minio::{MinioConfig, MinioStorage};

pub const INVOICES_BUCKET: &str = "invoices";
pub const IMAGES_BUCKET: &str = "images";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("object store request failed: {0}")]
    Remote(#[from] s3::error::S3Error),

    #[error("object store credentials rejected: {0}")]
    Credentials(#[from] s3::creds::error::CredentialsError),

    #[error("object store returned status {status} for {bucket}/{filename}")]
    Status {
        status: u16,
        bucket: String,
        filename: String,
    },

    #[error("invalid object name `{0}`")]
    InvalidName(String),
}

/// Object storage addressed by bucket and file name.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload the file at `source` as `bucket/filename`.
    async fn save(
        &self,
        bucket: &str,
        filename: &str,
        content_type: &str,
        source: &Path,
    ) -> Result<(), StorageError>;

    /// A link clients can use to fetch `bucket/filename`.
    async fn get_link(&self, bucket: &str, filename: &str) -> Result<String, StorageError>;

    async fn delete(&self, bucket: &str, filename: &str) -> Result<(), StorageError>;
}

#[async_trait]
impl<S> ObjectStorage for Arc<S>
where
    S: ObjectStorage + ?Sized,
{
    async fn save(
        &self,
        bucket: &str,
        filename: &str,
        content_type: &str,
        source: &Path,
    ) -> Result<(), StorageError> {
        (**self).save(bucket, filename, content_type, source).await
    }

    async fn get_link(&self, bucket: &str, filename: &str) -> Result<String, StorageError> {
        (**self).get_link(bucket, filename).await
    }

    async fn delete(&self, bucket: &str, filename: &str) -> Result<(), StorageError> {
        (**self).delete(bucket, filename).await
    }
}

/// Which storage backend to use. Unknown names fail config deserialization.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    Minio { minio: MinioConfig },
    Filesystem { filesystem: FilesystemConfig },
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilesystemConfig {
    pub root: std::path::PathBuf,
}

/// Build the configured backend and make sure its buckets exist.
pub async fn connect(config: &StorageConfig) -> Result<Arc<dyn ObjectStorage>, StorageError> {
    let buckets = [INVOICES_BUCKET, IMAGES_BUCKET];
    match config {
        StorageConfig::Minio { minio } => {
            let storage = MinioStorage::new(minio)?;
            for bucket in buckets {
                storage.ensure_bucket(bucket).await?;
            }
            Ok(Arc::new(storage))
        }
        StorageConfig::Filesystem { filesystem } => {
            let storage = FilesystemStorage::new(&filesystem.root);
            for bucket in buckets {
                storage.ensure_bucket(bucket).await?;
            }
            Ok(Arc::new(storage))
        }
    }
}

/// Object names are single path segments.
pub(crate) fn check_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_is_selected_by_tag() {
        let cfg: StorageConfig =
            serde_json::from_str(r#"{"backend":"filesystem","filesystem":{"root":"/tmp/x"}}"#).unwrap();
        assert!(matches!(cfg, StorageConfig::Filesystem { .. }));

        let cfg: StorageConfig = serde_json::from_str(
            r#"{"backend":"minio","minio":{"host":"localhost","port":9000,"access_key":"a","secret_key":"b"}}"#,
        )
        .unwrap();
        assert!(matches!(cfg, StorageConfig::Minio { .. }));
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let res = serde_json::from_str::<StorageConfig>(r#"{"backend":"ftp"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn names_must_be_single_segments() {
        assert!(check_name("invoice_2026.md").is_ok());
        assert!(check_name("../etc/passwd").is_err());
        assert!(check_name("a/b").is_err());
        assert!(check_name("").is_err());
    }
}
