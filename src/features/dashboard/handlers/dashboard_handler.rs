use axum::{extract::State, Json};
use std::sync::Arc;

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::dashboard::dtos::DashboardStatsDto;
use crate::features::dashboard::services::DashboardService;
use crate::features::files::dtos::FileSummaryDto;
use crate::features::files::FileService;
use crate::shared::types::{ApiResponse, Meta};

/// Totals and latest activities of the caller
#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Dashboard statistics", body = ApiResponse<DashboardStatsDto>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_stats(
    user: AuthenticatedUser,
    State(service): State<Arc<DashboardService>>,
) -> Result<Json<ApiResponse<DashboardStatsDto>>, AppError> {
    let stats = service.stats(user.user_id).await?;
    Ok(Json(ApiResponse::success(Some(stats), None, None)))
}

/// Files of the caller, newest first
#[utoipa::path(
    get,
    path = "/api/dashboard/files",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Caller's files", body = ApiResponse<Vec<FileSummaryDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_files(
    user: AuthenticatedUser,
    State(files): State<Arc<FileService>>,
) -> Result<Json<ApiResponse<Vec<FileSummaryDto>>>, AppError> {
    let list = files.list(user.user_id).await?;
    let total = list.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(list),
        None,
        Some(Meta { total }),
    )))
}
