use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, ClientContext};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::history::dtos::{
    CreateHistoryDto, FileHistoryDto, FileTimelineDto, HistoryListResponseDto, HistoryQuery,
    HistoryStatsDto,
};
use crate::features::history::services::HistoryService;
use crate::shared::types::ApiResponse;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// List the caller's history, grouped by day
#[utoipa::path(
    get,
    path = "/api/history/user",
    params(HistoryQuery),
    responses(
        (status = 200, description = "History retrieved successfully", body = ApiResponse<HistoryListResponseDto>),
        (status = 400, description = "Invalid filter"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "history",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_history(
    user: AuthenticatedUser,
    State(service): State<Arc<HistoryService>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<HistoryListResponseDto>>> {
    let list = service.list(user.user_id, query).await?;
    Ok(Json(ApiResponse::success(Some(list), None, None)))
}

/// Aggregate statistics over the caller's history
#[utoipa::path(
    get,
    path = "/api/history/stats",
    responses(
        (status = 200, description = "Statistics retrieved successfully", body = ApiResponse<HistoryStatsDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "history",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn history_stats(
    user: AuthenticatedUser,
    State(service): State<Arc<HistoryService>>,
) -> Result<Json<ApiResponse<HistoryStatsDto>>> {
    let stats = service.stats(user.user_id).await?;
    Ok(Json(ApiResponse::success(Some(stats), None, None)))
}

/// Record a history entry
#[utoipa::path(
    post,
    path = "/api/history",
    request_body = CreateHistoryDto,
    responses(
        (status = 201, description = "History entry created", body = ApiResponse<FileHistoryDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "history",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_history(
    user: AuthenticatedUser,
    ctx: ClientContext,
    State(service): State<Arc<HistoryService>>,
    AppJson(dto): AppJson<CreateHistoryDto>,
) -> Result<(StatusCode, Json<ApiResponse<FileHistoryDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let entry = service.create(user.user_id, dto, &ctx).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(entry),
            Some("History entry created".to_string()),
            None,
        )),
    ))
}

/// Get one history entry
#[utoipa::path(
    get,
    path = "/api/history/{id}",
    params(
        ("id" = Uuid, Path, description = "History entry ID")
    ),
    responses(
        (status = 200, description = "History entry retrieved", body = ApiResponse<FileHistoryDto>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "History entry not found")
    ),
    tag = "history",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_history(
    user: AuthenticatedUser,
    State(service): State<Arc<HistoryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<FileHistoryDto>>> {
    let entry = service.get(user.user_id, id).await?;
    Ok(Json(ApiResponse::success(Some(entry), None, None)))
}

/// Delete one history entry
#[utoipa::path(
    delete,
    path = "/api/history/{id}",
    params(
        ("id" = Uuid, Path, description = "History entry ID")
    ),
    responses(
        (status = 200, description = "History entry deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "History entry not found")
    ),
    tag = "history",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_history(
    user: AuthenticatedUser,
    State(service): State<Arc<HistoryService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(user.user_id, id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("History entry deleted".to_string()),
        None,
    )))
}

/// Chronological timeline of one file
#[utoipa::path(
    get,
    path = "/api/history/file/{file_id}",
    params(
        ("file_id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File timeline retrieved", body = ApiResponse<FileTimelineDto>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No history found for this file")
    ),
    tag = "history",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn file_timeline(
    user: AuthenticatedUser,
    State(service): State<Arc<HistoryService>>,
    Path(file_id): Path<Uuid>,
) -> Result<Json<ApiResponse<FileTimelineDto>>> {
    let timeline = service.file_timeline(user.user_id, file_id).await?;
    Ok(Json(ApiResponse::success(Some(timeline), None, None)))
}
