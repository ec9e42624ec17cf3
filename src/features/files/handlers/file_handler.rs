use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::core::extractor::ClientContext;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::files::dtos::{
    validate_upload, DeleteFileResponseDto, FileDetailDto, FileSummaryDto, UploadFileDto,
    UploadResponseDto,
};
use crate::features::files::services::FileService;
use crate::shared::types::{ApiResponse, Meta};

fn multipart_error(e: MultipartError) -> AppError {
    debug!("Failed to read multipart data: {}", e);
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("File too large".to_string())
    } else {
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    }
}

/// Upload a spreadsheet
///
/// Accepts multipart/form-data with a `file` field.
#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "upload",
    request_body(
        content = UploadFileDto,
        content_type = "multipart/form-data",
        description = "Spreadsheet upload form",
    ),
    responses(
        (status = 201, description = "File uploaded and parsed", body = ApiResponse<UploadResponseDto>),
        (status = 400, description = "Missing file, invalid format or unreadable workbook"),
        (status = 401, description = "Authentication required"),
        (status = 413, description = "File too large")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_file(
    user: AuthenticatedUser,
    ctx: ClientContext,
    State(service): State<Arc<FileService>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<UploadResponseDto>>), AppError> {
    let mut upload: Option<(Vec<u8>, String, String)> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or("").to_string();
        if field_name != "file" {
            debug!("Ignoring unknown field: {}", field_name);
            continue;
        }

        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let file_name = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unnamed".to_string());
        let data = field.bytes().await.map_err(multipart_error)?;

        upload = Some((data.to_vec(), file_name, content_type));
    }

    let (data, file_name, content_type) =
        upload.ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;

    validate_upload(&file_name, &content_type, data.len(), service.max_file_size())?;

    let response = service
        .upload(user.user_id, &ctx, data, &file_name, &content_type)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(response),
            Some("File uploaded and parsed successfully".to_string()),
            None,
        )),
    ))
}

/// List the caller's files
#[utoipa::path(
    get,
    path = "/api/upload/files",
    tag = "upload",
    responses(
        (status = 200, description = "Files retrieved", body = ApiResponse<Vec<FileSummaryDto>>),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_files(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
) -> Result<Json<ApiResponse<Vec<FileSummaryDto>>>, AppError> {
    let files = service.list(user.user_id).await?;
    let total = files.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(files),
        None,
        Some(Meta { total }),
    )))
}

/// Get a file's parsed content and stats
#[utoipa::path(
    get,
    path = "/api/upload/file/{id}",
    tag = "upload",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File retrieved", body = ApiResponse<FileDetailDto>),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_file(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<FileDetailDto>>, AppError> {
    let file = service.detail(user.user_id, id).await?;
    Ok(Json(ApiResponse::success(Some(file), None, None)))
}

/// Parse the stored workbook again
#[utoipa::path(
    post,
    path = "/api/upload/file/{id}/reparse",
    tag = "upload",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File re-parsed", body = ApiResponse<FileDetailDto>),
        (status = 400, description = "Stored workbook could not be parsed"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn reparse_file(
    user: AuthenticatedUser,
    State(service): State<Arc<FileService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<FileDetailDto>>, AppError> {
    let file = service.reparse(user.user_id, id).await?;
    Ok(Json(ApiResponse::success(
        Some(file),
        Some("File re-parsed successfully".to_string()),
        None,
    )))
}

/// Delete a file
///
/// Only the owner can delete it.
#[utoipa::path(
    delete,
    path = "/api/upload/file/{id}",
    tag = "upload",
    params(
        ("id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File deleted", body = ApiResponse<DeleteFileResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "File not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_file(
    user: AuthenticatedUser,
    ctx: ClientContext,
    State(service): State<Arc<FileService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeleteFileResponseDto>>, AppError> {
    let response = service.delete(user.user_id, &ctx, id).await?;
    Ok(Json(ApiResponse::success(
        Some(response),
        Some("File deleted successfully".to_string()),
        None,
    )))
}
