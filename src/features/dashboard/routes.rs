use axum::{routing::get, Router};
use std::sync::Arc;

use crate::features::dashboard::handlers;
use crate::features::dashboard::services::DashboardService;
use crate::features::files::FileService;

/// Dashboard routes; both require an authenticated caller
pub fn routes(
    dashboard_service: Arc<DashboardService>,
    file_service: Arc<FileService>,
) -> Router {
    Router::new()
        .route("/api/dashboard/stats", get(handlers::get_stats))
        .with_state(dashboard_service)
        .merge(
            Router::new()
                .route("/api/dashboard/files", get(handlers::get_files))
                .with_state(file_service),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{LocalStorageConfig, UploadConfig};
    use crate::features::activities::ActivityService;
    use crate::features::history::HistoryService;
    use crate::modules::storage::LocalStorage;
    use crate::shared::test_helpers::lazy_pool;
    use axum::http::StatusCode;
    use axum_test::TestServer;

    async fn router() -> Router {
        let pool = lazy_pool();
        let activities = Arc::new(ActivityService::new(pool.clone()));
        let root_dir = std::env::temp_dir().join("sheetlytics-dashboard-tests");
        let storage = LocalStorage::new(LocalStorageConfig { root_dir })
            .await
            .unwrap();
        let files = Arc::new(FileService::new(
            pool.clone(),
            Arc::new(storage),
            activities.clone(),
            Arc::new(HistoryService::new(pool.clone())),
            UploadConfig {
                max_file_size: 1024,
                sample_rows: 10,
            },
        ));
        routes(Arc::new(DashboardService::new(pool, activities)), files)
    }

    #[tokio::test]
    async fn test_dashboard_requires_authenticated_caller() {
        let server = TestServer::new(router().await).unwrap();

        let response = server.get("/api/dashboard/stats").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], false);

        server
            .get("/api/dashboard/files")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
