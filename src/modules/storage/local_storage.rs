//! Local filesystem storage, used when no object store is configured

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

use super::ObjectStorage;
use crate::core::config::LocalStorageConfig;
use crate::core::error::AppError;

pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    pub async fn new(config: LocalStorageConfig) -> Result<Self, AppError> {
        tokio::fs::create_dir_all(&config.root_dir)
            .await
            .map_err(|e| {
                AppError::Storage(format!(
                    "Failed to create upload directory '{}': {}",
                    config.root_dir.display(),
                    e
                ))
            })?;

        info!(
            "Local storage initialized at: {}",
            config.root_dir.display()
        );

        Ok(Self {
            root_dir: config.root_dir,
        })
    }

    /// Resolve a key inside the root, refusing anything that escapes it
    fn resolve(&self, key: &str) -> Result<PathBuf, AppError> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(AppError::BadRequest(format!("Invalid storage key '{}'", key)));
        }
        Ok(self.root_dir.join(relative))
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    fn backend_name(&self) -> &'static str {
        "local"
    }

    fn generate_key(&self, path: &str) -> String {
        path.to_string()
    }

    async fn upload(&self, key: &str, data: Vec<u8>, _content_type: &str) -> Result<String, AppError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create '{}': {}", parent.display(), e)))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write '{}': {}", path.display(), e)))?;

        debug!("Stored file at '{}'", path.display());
        Ok(self.get_file_url(key))
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>, AppError> {
        let path = self.resolve(key)?;
        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => AppError::NotFound("Stored file not found".to_string()),
            _ => AppError::Storage(format!("Failed to read '{}': {}", path.display(), e)),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted file at '{}'", path.display());
                Ok(())
            }
            // Already gone
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to delete '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    fn get_file_url(&self, key: &str) -> String {
        self.root_dir.join(key).to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    async fn storage() -> LocalStorage {
        let root_dir = std::env::temp_dir().join(format!("sheetlytics-test-{}", Uuid::new_v4()));
        LocalStorage::new(LocalStorageConfig { root_dir }).await.unwrap()
    }

    #[tokio::test]
    async fn test_upload_download_delete() {
        let storage = storage().await;
        let key = storage.generate_key("user-1/book.xlsx");

        let url = storage
            .upload(&key, b"workbook".to_vec(), "application/octet-stream")
            .await
            .unwrap();
        assert!(url.ends_with("book.xlsx"));

        assert_eq!(storage.download(&key).await.unwrap(), b"workbook");

        storage.delete(&key).await.unwrap();
        assert!(matches!(
            storage.download(&key).await,
            Err(AppError::NotFound(_))
        ));
        // Deleting twice is fine
        storage.delete(&key).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_keys_outside_root() {
        let storage = storage().await;
        assert!(storage.download("../etc/passwd").await.is_err());
        assert!(storage.download("/etc/passwd").await.is_err());
        assert!(storage.download("").await.is_err());
    }
}
