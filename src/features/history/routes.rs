use crate::features::history::handlers;
use crate::features::history::services::HistoryService;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub fn routes(service: Arc<HistoryService>) -> Router {
    Router::new()
        .route("/api/history", post(handlers::create_history))
        .route("/api/history/user", get(handlers::list_history))
        .route("/api/history/stats", get(handlers::history_stats))
        .route(
            "/api/history/{id}",
            get(handlers::get_history).delete(handlers::delete_history),
        )
        .route("/api/history/file/{file_id}", get(handlers::file_timeline))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{lazy_pool, with_user_auth};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;

    fn server() -> TestServer {
        let service = Arc::new(HistoryService::new(lazy_pool()));
        TestServer::new(with_user_auth(routes(service))).unwrap()
    }

    #[tokio::test]
    async fn test_create_rejects_empty_file_name() {
        let response = server()
            .post("/api/history")
            .json(&json!({
                "file_id": "7f1c2c4e-4b7a-4d8e-9c53-2a8f5d1e0b11",
                "file_name": "",
                "action": "analysis"
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_action() {
        let response = server()
            .post("/api/history")
            .json(&json!({
                "file_id": "7f1c2c4e-4b7a-4d8e-9c53-2a8f5d1e0b11",
                "file_name": "sales.xlsx",
                "action": "printed"
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_rejects_malformed_id() {
        server()
            .get("/api/history/not-a-uuid")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
