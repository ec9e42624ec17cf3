use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::files::handlers::{
    delete_file, get_file, list_files, reparse_file, upload_file,
};
use crate::features::files::services::FileService;

pub fn routes(file_service: Arc<FileService>) -> Router {
    // Room for multipart overhead on top of the file itself
    let body_limit = file_service.max_file_size() + 1024 * 1024;

    Router::new()
        .route(
            "/api/upload",
            post(upload_file).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/upload/files", get(list_files))
        .route("/api/upload/file/{id}", get(get_file).delete(delete_file))
        .route("/api/upload/file/{id}/reparse", post(reparse_file))
        .with_state(file_service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{LocalStorageConfig, UploadConfig};
    use crate::features::activities::ActivityService;
    use crate::features::history::HistoryService;
    use crate::modules::storage::LocalStorage;
    use crate::shared::test_helpers::{lazy_pool, with_user_auth};
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;

    async fn server(max_file_size: usize) -> TestServer {
        let pool = lazy_pool();
        let root_dir =
            std::env::temp_dir().join(format!("sheetlytics-upload-{}", uuid::Uuid::new_v4()));
        let storage = LocalStorage::new(LocalStorageConfig { root_dir })
        .await
        .unwrap();
        let service = Arc::new(FileService::new(
            pool.clone(),
            Arc::new(storage),
            Arc::new(ActivityService::new(pool.clone())),
            Arc::new(HistoryService::new(pool)),
            UploadConfig {
                max_file_size,
                sample_rows: 10,
            },
        ));
        TestServer::new(with_user_auth(routes(service))).unwrap()
    }

    #[tokio::test]
    async fn test_upload_requires_file_field() {
        let form = MultipartForm::new().add_text("note", "no file here");
        server(1024)
            .await
            .post("/api/upload")
            .multipart(form)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_rejects_non_spreadsheet() {
        let part = Part::bytes(b"hello".to_vec())
            .file_name("notes.txt")
            .mime_type("text/plain");
        server(1024)
            .await
            .post("/api/upload")
            .multipart(MultipartForm::new().add_part("file", part))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_rejects_oversized_file() {
        let part = Part::bytes(vec![0u8; 4096])
            .file_name("big.xlsx")
            .mime_type("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet");
        server(1024)
            .await
            .post("/api/upload")
            .multipart(MultipartForm::new().add_part("file", part))
            .await
            .assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_file_routes_reject_malformed_id() {
        server(1024)
            .await
            .get("/api/upload/file/42")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
