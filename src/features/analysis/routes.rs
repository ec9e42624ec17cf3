use crate::features::analysis::handlers;
use crate::features::analysis::services::AnalysisService;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub fn routes(service: Arc<AnalysisService>) -> Router {
    Router::new()
        .route("/api/analysis/chart", post(handlers::generate_chart))
        .route("/api/analysis/save-chart", post(handlers::save_chart))
        .route(
            "/api/analysis/history/{file_id}",
            get(handlers::analysis_history),
        )
        .route("/api/analysis/pdf-data/{file_id}", get(handlers::pdf_data))
        .route("/api/analysis/{file_id}", get(handlers::get_analysis_file))
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
            std::env::temp_dir().join(format!("sheetlytics-analysis-{}", uuid::Uuid::new_v4()));
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
        let service = Arc::new(AnalysisService::new(files, activities, history));
        TestServer::new(with_user_auth(routes(service))).unwrap()
    }

    #[tokio::test]
    async fn test_chart_rejects_unknown_chart_type() {
        server()
            .await
            .post("/api/analysis/chart")
            .json(&json!({
                "file_id": "7f1c2c4e-4b7a-4d8e-9c53-2a8f5d1e0b11",
                "chart_type": "heatmap",
                "x_axis": "Month",
                "y_axis": "Revenue"
            }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_chart_requires_axes() {
        server()
            .await
            .post("/api/analysis/chart")
            .json(&json!({
                "file_id": "7f1c2c4e-4b7a-4d8e-9c53-2a8f5d1e0b11",
                "chart_type": "bar",
                "x_axis": "",
                "y_axis": "Revenue"
            }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_save_chart_rejects_malformed_chart_data() {
        server()
            .await
            .post("/api/analysis/save-chart")
            .json(&json!({
                "file_id": "7f1c2c4e-4b7a-4d8e-9c53-2a8f5d1e0b11",
                "chart_type": "bar",
                "chart_data": "not an object"
            }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
