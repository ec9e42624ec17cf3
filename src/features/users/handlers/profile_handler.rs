use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::users::dtos::{
    ChangePasswordDto, DeleteAccountDto, DeleteAccountResponseDto, UpdateProfileDto,
    UserProfileDto,
};
use crate::features::users::services::UserProfileService;
use crate::shared::types::ApiResponse;
use axum::{extract::State, Json};
use std::sync::Arc;
use validator::Validate;

/// Get the caller's profile
#[utoipa::path(
    get,
    path = "/api/auth/profile",
    responses(
        (status = 200, description = "Profile retrieved successfully", body = ApiResponse<UserProfileDto>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    tag = "profile",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_profile(
    user: AuthenticatedUser,
    State(service): State<Arc<UserProfileService>>,
) -> Result<Json<ApiResponse<UserProfileDto>>> {
    let profile = service.get_profile(user.user_id).await?;
    Ok(Json(ApiResponse::success(Some(profile), None, None)))
}

/// Update the caller's name or email
#[utoipa::path(
    put,
    path = "/api/auth/profile",
    request_body = UpdateProfileDto,
    responses(
        (status = 200, description = "Profile updated successfully", body = ApiResponse<UserProfileDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Email already registered")
    ),
    tag = "profile",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_profile(
    user: AuthenticatedUser,
    State(service): State<Arc<UserProfileService>>,
    AppJson(dto): AppJson<UpdateProfileDto>,
) -> Result<Json<ApiResponse<UserProfileDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let profile = service.update_profile(user.user_id, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(profile),
        Some("Profile updated successfully".to_string()),
        None,
    )))
}

/// Change the caller's password
#[utoipa::path(
    put,
    path = "/api/auth/password",
    request_body = ChangePasswordDto,
    responses(
        (status = 200, description = "Password changed successfully"),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Current password is incorrect")
    ),
    tag = "profile",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn change_password(
    user: AuthenticatedUser,
    State(service): State<Arc<UserProfileService>>,
    AppJson(dto): AppJson<ChangePasswordDto>,
) -> Result<Json<ApiResponse<()>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    service.change_password(user.user_id, dto).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Password changed successfully".to_string()),
        None,
    )))
}

/// Delete the caller's account with all of its files
#[utoipa::path(
    delete,
    path = "/api/auth/account",
    request_body = DeleteAccountDto,
    responses(
        (status = 200, description = "Account deleted", body = ApiResponse<DeleteAccountResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Password is incorrect")
    ),
    tag = "profile",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_account(
    user: AuthenticatedUser,
    State(service): State<Arc<UserProfileService>>,
    AppJson(dto): AppJson<DeleteAccountDto>,
) -> Result<Json<ApiResponse<DeleteAccountResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let result = service.delete_account(user.user_id, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(result),
        Some("Account deleted successfully".to_string()),
        None,
    )))
}
