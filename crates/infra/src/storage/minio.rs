use std::path::Path;

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use serde::Deserialize;
use tracing::{info, warn};

use super::{ObjectStorage, StorageError, check_name};

#[derive(Debug, Clone, Deserialize)]
pub struct MinioConfig {
    pub host: String,
    pub port: u16,
    pub access_key: String,
    pub secret_key: String,
    #[serde(default)]
    pub ssl: bool,
    #[serde(default = "default_region")]
    pub region: String,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl MinioConfig {
    pub fn endpoint(&self) -> String {
        let scheme = if self.ssl { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }
}

/// S3-compatible object storage (MinIO) using path-style bucket addressing.
#[derive(Debug, Clone)]
pub struct MinioStorage {
    endpoint: String,
    region: Region,
    credentials: Credentials,
}

impl MinioStorage {
    pub fn new(config: &MinioConfig) -> Result<Self, StorageError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )?;
        let endpoint = config.endpoint();

        Ok(Self {
            region: Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            endpoint,
            credentials,
        })
    }

    fn bucket(&self, name: &str) -> Result<Box<Bucket>, StorageError> {
        check_name(name)?;
        Ok(Bucket::new(name, self.region.clone(), self.credentials.clone())?.with_path_style())
    }

    /// Create `name` unless it already exists.
    pub async fn ensure_bucket(&self, name: &str) -> Result<(), StorageError> {
        check_name(name)?;
        let response = Bucket::create_with_path_style(
            name,
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await?;

        match response.response_code {
            200..=299 => info!(bucket = name, "bucket created"),
            409 => info!(bucket = name, "bucket exists"),
            status => {
                warn!(bucket = name, status, body = %response.response_text, "bucket creation failed");
                return Err(StorageError::Status {
                    status,
                    bucket: name.to_string(),
                    filename: String::new(),
                });
            }
        }
        Ok(())
    }
}

fn check_status(status: u16, bucket: &str, filename: &str) -> Result<(), StorageError> {
    if (200..300).contains(&status) {
        return Ok(());
    }
    Err(StorageError::Status {
        status,
        bucket: bucket.to_string(),
        filename: filename.to_string(),
    })
}

#[async_trait]
impl ObjectStorage for MinioStorage {
    async fn save(
        &self,
        bucket: &str,
        filename: &str,
        content_type: &str,
        source: &Path,
    ) -> Result<(), StorageError> {
        check_name(filename)?;
        let content = tokio::fs::read(source).await?;
        let response = self
            .bucket(bucket)?
            .put_object_with_content_type(filename, &content, content_type)
            .await?;
        check_status(response.status_code(), bucket, filename)?;

        info!(bucket, filename, bytes = content.len(), "object saved to minio");
        Ok(())
    }

    async fn get_link(&self, bucket: &str, filename: &str) -> Result<String, StorageError> {
        check_name(bucket)?;
        check_name(filename)?;
        Ok(format!("{}/{bucket}/{filename}", self.endpoint))
    }

    async fn delete(&self, bucket: &str, filename: &str) -> Result<(), StorageError> {
        check_name(filename)?;
        let response = self.bucket(bucket)?.delete_object(filename).await?;
        check_status(response.status_code(), bucket, filename)
    }
}
