use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::features::admin::handlers;
use crate::features::admin::services::AdminService;

/// Create admin routes (all require admin access), nested under `/api/admin`
pub fn routes(admin_service: Arc<AdminService>) -> Router {
    Router::new()
        .route("/stats", get(handlers::get_stats))
        .route("/users", get(handlers::list_users))
        .route("/users/{id}", put(handlers::update_user_status))
        .route("/users/{id}/{action}", post(handlers::change_user_status))
        .route("/activities", get(handlers::list_activities))
        .with_state(admin_service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::activities::ActivityService;
    use crate::shared::test_helpers::{lazy_pool, with_admin_auth, with_user_auth};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;

    fn router() -> Router {
        let pool = lazy_pool();
        let activities = Arc::new(ActivityService::new(pool.clone()));
        Router::new().nest("/api/admin", routes(Arc::new(AdminService::new(pool, activities))))
    }

    #[tokio::test]
    async fn test_regular_user_is_forbidden() {
        let server = TestServer::new(with_user_auth(router())).unwrap();

        server
            .get("/api/admin/stats")
            .await
            .assert_status(StatusCode::FORBIDDEN);
        server
            .get("/api/admin/activities")
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_unknown_status_action_is_rejected() {
        let server = TestServer::new(with_admin_auth(router())).unwrap();

        server
            .post("/api/admin/users/7f1c2c4e-4b7a-4d8e-9c53-2a8f5d1e0b11/promote")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_status_value_is_rejected() {
        let server = TestServer::new(with_admin_auth(router())).unwrap();

        let response = server
            .put("/api/admin/users/7f1c2c4e-4b7a-4d8e-9c53-2a8f5d1e0b11")
            .json(&json!({ "status": "suspended" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], false);
    }
}
