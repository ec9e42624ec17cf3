use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::activities::dtos::AdminActivityDto;
use crate::features::admin::dtos::*;
use crate::features::admin::services::AdminService;
use crate::features::auth::guards::RequireAdmin;
use crate::features::auth::models::UserStatus;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// Platform statistics
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses(
        (status = 200, description = "Platform statistics", body = ApiResponse<AdminStatsDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin access required")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_stats(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<AdminService>>,
) -> Result<Json<ApiResponse<AdminStatsDto>>> {
    let stats = service.stats().await?;
    Ok(Json(ApiResponse::success(Some(stats), None, None)))
}

/// List all users (paginated)
#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(PaginationQuery),
    responses(
        (status = 200, description = "List of users", body = ApiResponse<Vec<AdminUserDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin access required")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_users(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Query(params): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<AdminUserDto>>>> {
    let (items, total) = service.list_users(params.offset(), params.limit()).await?;

    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Meta { total }),
    )))
}

/// Set a user's status
#[utoipa::path(
    put,
    path = "/api/admin/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdateUserStatusDto,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<AdminUserDto>),
        (status = 400, description = "Invalid status or self-block"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin access required"),
        (status = 404, description = "User not found")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_user_status(
    RequireAdmin(admin): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateUserStatusDto>,
) -> Result<Json<ApiResponse<AdminUserDto>>> {
    let user = service.set_user_status(admin.user_id, id, dto.status).await?;
    Ok(Json(ApiResponse::success(Some(user), None, None)))
}

/// Block or unblock a user
#[utoipa::path(
    post,
    path = "/api/admin/users/{id}/{action}",
    params(
        ("id" = Uuid, Path, description = "User ID"),
        ("action" = String, Path, description = "`block` or `unblock`")
    ),
    responses(
        (status = 200, description = "User updated", body = ApiResponse<AdminUserDto>),
        (status = 400, description = "Unknown action or self-block"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin access required"),
        (status = 404, description = "User not found")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn change_user_status(
    RequireAdmin(admin): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Path((id, action)): Path<(Uuid, String)>,
) -> Result<Json<ApiResponse<AdminUserDto>>> {
    let status = match action.as_str() {
        "block" => UserStatus::Blocked,
        "unblock" => UserStatus::Active,
        other => {
            return Err(AppError::BadRequest(format!(
                "Unknown action '{}', expected block or unblock",
                other
            )))
        }
    };

    let user = service.set_user_status(admin.user_id, id, status).await?;
    Ok(Json(ApiResponse::success(
        Some(user),
        Some(format!("User {}ed", action)),
        None,
    )))
}

/// Most recent activities across all users
#[utoipa::path(
    get,
    path = "/api/admin/activities",
    responses(
        (status = 200, description = "Recent activities", body = ApiResponse<Vec<AdminActivityDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin access required")
    ),
    tag = "admin",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_activities(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<AdminService>>,
) -> Result<Json<ApiResponse<Vec<AdminActivityDto>>>> {
    let items = service.recent_activities().await?;
    Ok(Json(ApiResponse::success(Some(items), None, None)))
}
