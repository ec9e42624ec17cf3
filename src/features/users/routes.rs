use crate::features::users::handlers::profile_handler;
use crate::features::users::services::UserProfileService;
use axum::{
    routing::{delete, get, put},
    Router,
};
use std::sync::Arc;

pub fn routes(service: Arc<UserProfileService>) -> Router {
    Router::new()
        .route(
            "/api/auth/profile",
            get(profile_handler::get_profile).put(profile_handler::update_profile),
        )
        .route("/api/auth/password", put(profile_handler::change_password))
        .route("/api/auth/account", delete(profile_handler::delete_account))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::LocalStorageConfig;
    use crate::features::activities::ActivityService;
    use crate::modules::storage::LocalStorage;
    use crate::shared::test_helpers::{lazy_pool, with_user_auth};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;

    async fn server() -> TestServer {
        let pool = lazy_pool();
        let root_dir = std::env::temp_dir().join("sheetlytics-profile-tests");
        let storage = Arc::new(
            LocalStorage::new(LocalStorageConfig { root_dir })
                .await
                .unwrap(),
        );
        let activities = Arc::new(ActivityService::new(pool.clone()));
        let service = Arc::new(UserProfileService::new(pool, storage, activities));
        TestServer::new(with_user_auth(routes(service))).unwrap()
    }

    #[tokio::test]
    async fn test_update_profile_rejects_invalid_email() {
        let response = server()
            .await
            .put("/api/auth/profile")
            .json(&json!({ "email": "nope" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_change_password_rejects_short_password() {
        server()
            .await
            .put("/api/auth/password")
            .json(&json!({ "current_password": "secret1", "new_password": "123" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_account_requires_password() {
        server()
            .await
            .delete("/api/auth/account")
            .json(&json!({ "password": "" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
