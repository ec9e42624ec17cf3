//! Storage module for uploaded workbooks
//!
//! Provides a MinIO/S3-compatible client and a local directory backend
//! behind one `ObjectStorage` trait.

mod local_storage;
mod minio_client;

pub use local_storage::LocalStorage;
pub use minio_client::MinIOClient;

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::config::StorageConfig;
use crate::core::error::AppError;

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Full key for a path relative to the backend's prefix
    fn generate_key(&self, path: &str) -> String;

    /// Store the object, returning its URL (or local path)
    async fn upload(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<String, AppError>;

    async fn download(&self, key: &str) -> Result<Vec<u8>, AppError>;

    async fn delete(&self, key: &str) -> Result<(), AppError>;

    fn get_file_url(&self, key: &str) -> String;
}

/// Build the backend selected by configuration
pub async fn create_storage(config: StorageConfig) -> Result<Arc<dyn ObjectStorage>, AppError> {
    match config {
        StorageConfig::MinIO(minio) => Ok(Arc::new(MinIOClient::new(minio).await?)),
        StorageConfig::Local(local) => Ok(Arc::new(LocalStorage::new(local).await?)),
    }
}
