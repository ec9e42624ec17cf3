//! MinIO/S3-compatible storage client
//!
//! Keeps uploaded workbooks private under a single key prefix.
//! Uses rust-s3 crate for lightweight S3 operations.

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::{debug, info, warn};

use super::ObjectStorage;
use crate::core::config::MinIOConfig;
use crate::core::error::AppError;

/// MinIO/S3-compatible storage client
pub struct MinIOClient {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    endpoint: String,
    public_endpoint: String,
    prefix: String,
}

impl MinIOClient {
    /// Create a new MinIO client and make sure its bucket exists
    pub async fn new(config: MinIOConfig) -> Result<Self, AppError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to create MinIO bucket: {}", e)))?;

        // Path-style URLs for MinIO (http://endpoint/bucket instead of http://bucket.endpoint)
        bucket.set_path_style();

        let client = Self {
            bucket,
            region,
            credentials,
            endpoint: config.endpoint,
            public_endpoint: config.public_endpoint,
            prefix: config.prefix,
        };

        client.ensure_bucket_exists().await;

        info!(
            "MinIO client initialized for endpoint: {}, bucket: {}, prefix: {}",
            client.endpoint,
            client.bucket.name(),
            client.prefix
        );

        Ok(client)
    }

    /// Ensure the bucket exists, create if not
    async fn ensure_bucket_exists(&self) {
        match self.create_bucket().await {
            Ok(_) => info!("Bucket '{}' created successfully", self.bucket.name()),
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                } else {
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        self.bucket.name(),
                        e
                    );
                }
            }
        }
    }

    async fn create_bucket(&self) -> Result<(), AppError> {
        Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await
        .map_err(|e| {
            AppError::Storage(format!(
                "Failed to create bucket '{}': {}",
                self.bucket.name(),
                e
            ))
        })?;

        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for MinIOClient {
    fn backend_name(&self) -> &'static str {
        "minio"
    }

    fn generate_key(&self, path: &str) -> String {
        format!("{}/{}", self.prefix, path)
    }

    async fn upload(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<String, AppError> {
        let response = self
            .bucket
            .put_object_with_content_type(key, &data, content_type)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to upload file '{}': {}", key, e)))?;
        ensure_success(response.status_code(), "upload", key)?;

        debug!("Uploaded file '{}' to bucket '{}'", key, self.bucket.name());
        Ok(self.get_file_url(key))
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>, AppError> {
        let response = self.bucket.get_object(key).await.map_err(|e| {
            AppError::Storage(format!("Failed to download file '{}': {}", key, e))
        })?;

        if response.status_code() == 404 {
            return Err(AppError::NotFound("Stored file not found".to_string()));
        }
        ensure_success(response.status_code(), "download", key)?;

        debug!(
            "Downloaded file '{}' from bucket '{}'",
            key,
            self.bucket.name()
        );
        Ok(response.to_vec())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        let response = self
            .bucket
            .delete_object(key)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to delete file '{}': {}", key, e)))?;
        ensure_success(response.status_code(), "delete", key)?;

        debug!(
            "Deleted file '{}' from bucket '{}'",
            key,
            self.bucket.name()
        );
        Ok(())
    }

    fn get_file_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_endpoint, self.bucket.name(), key)
    }
}

/// rust-s3 hands back error responses as data, so the status decides
fn ensure_success(status: u16, action: &str, key: &str) -> Result<(), AppError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(AppError::Storage(format!(
            "Failed to {} file '{}': status {}",
            action, key, status
        )))
    }
}
