use crate::features::downloads::handlers;
use crate::features::downloads::services::DownloadService;
use axum::{routing::post, Router};
use std::sync::Arc;

pub fn routes(service: Arc<DownloadService>) -> Router {
    Router::new()
        .route("/api/download/pdf", post(handlers::download_pdf))
        .route("/api/download/csv", post(handlers::download_csv))
        .route("/api/download/chart", post(handlers::download_chart))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{LocalStorageConfig, UploadConfig};
    use crate::features::activities::ActivityService;
    use crate::features::files::FileService;
    use crate::features::history::HistoryService;
    use crate::modules::storage::LocalStorage;
    use crate::shared::test_helpers::{lazy_pool, with_user_auth};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;

    async fn server() -> TestServer {
        let pool = lazy_pool();
        let root_dir =
            std::env::temp_dir().join(format!("sheetlytics-download-{}", uuid::Uuid::new_v4()));
        let storage = Arc::new(LocalStorage::new(LocalStorageConfig { root_dir }).await.unwrap());
        let activities = Arc::new(ActivityService::new(pool.clone()));
        let history = Arc::new(HistoryService::new(pool.clone()));
        let files = Arc::new(FileService::new(
            pool,
            storage,
            activities.clone(),
            history.clone(),
            UploadConfig {
                max_file_size: 1024,
                sample_rows: 10,
            },
        ));
        TestServer::new(with_user_auth(routes(Arc::new(DownloadService::new(
            files, activities, history,
        )))))
        .unwrap()
    }

    #[tokio::test]
    async fn test_chart_download_requires_chart_data() {
        server()
            .await
            .post("/api/download/chart")
            .json(&json!({
                "file_id": "7f1c2c4e-4b7a-4d8e-9c53-2a8f5d1e0b11",
                "chart_type": "bar"
            }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_csv_download_rejects_long_file_name() {
        server()
            .await
            .post("/api/download/csv")
            .json(&json!({
                "file_id": "7f1c2c4e-4b7a-4d8e-9c53-2a8f5d1e0b11",
                "file_name": "x".repeat(300)
            }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
