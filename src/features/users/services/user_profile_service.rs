use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::activities::models::{ActivityType, NewActivity};
use crate::features::activities::ActivityService;
use crate::features::auth::dtos::normalize_email;
use crate::features::auth::models::{User, USER_COLUMNS};
use crate::features::auth::password::{hash_password_async, verify_password_async};
use crate::features::users::dtos::{
    ChangePasswordDto, DeleteAccountDto, DeleteAccountResponseDto, UpdateProfileDto,
    UserProfileDto,
};
use crate::modules::storage::ObjectStorage;

/// Account settings of the signed-in user
pub struct UserProfileService {
    pool: PgPool,
    storage: Arc<dyn ObjectStorage>,
    activities: Arc<ActivityService>,
}

impl UserProfileService {
    pub fn new(
        pool: PgPool,
        storage: Arc<dyn ObjectStorage>,
        activities: Arc<ActivityService>,
    ) -> Self {
        Self {
            pool,
            storage,
            activities,
        }
    }

    async fn find_user(&self, user_id: Uuid) -> Result<User> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<UserProfileDto> {
        Ok(self.find_user(user_id).await?.into())
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        dto: UpdateProfileDto,
    ) -> Result<UserProfileDto> {
        let fields = dto.changed_fields();
        let name = dto
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        let email = dto.email.as_deref().map(normalize_email);

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name), email = COALESCE($3, email), updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(name)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict("Email already registered".to_string())
            }
            _ => {
                tracing::error!("Failed to update profile: {:?}", e);
                AppError::Database(e)
            }
        })?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        self.activities
            .log(
                NewActivity::new(user_id, ActivityType::Profile, "Profile updated")
                    .metadata(json!({ "fields": fields })),
            )
            .await?;

        info!("Profile updated: id={}", user.id);
        Ok(user.into())
    }

    pub async fn change_password(&self, user_id: Uuid, dto: ChangePasswordDto) -> Result<()> {
        let user = self.find_user(user_id).await?;

        if !verify_password_async(dto.current_password.clone(), user.password_hash).await? {
            return Err(AppError::Unauthorized(
                "Current password is incorrect".to_string(),
            ));
        }
        if dto.current_password == dto.new_password {
            return Err(AppError::BadRequest(
                "New password must be different from the current password".to_string(),
            ));
        }

        let password_hash = hash_password_async(dto.new_password).await?;
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to change password: {:?}", e);
                AppError::Database(e)
            })?;

        self.activities
            .log(NewActivity::new(
                user_id,
                ActivityType::Profile,
                "Password changed",
            ))
            .await?;

        info!("Password changed: id={}", user_id);
        Ok(())
    }

    /// Remove the account after removing every stored workbook it owns
    pub async fn delete_account(
        &self,
        user_id: Uuid,
        dto: DeleteAccountDto,
    ) -> Result<DeleteAccountResponseDto> {
        let user = self.find_user(user_id).await?;

        if !verify_password_async(dto.password, user.password_hash).await? {
            return Err(AppError::Unauthorized("Password is incorrect".to_string()));
        }

        let keys: Vec<String> =
            sqlx::query_scalar("SELECT storage_key FROM files WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;

        for key in &keys {
            self.storage.delete(key).await?;
        }

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete account: {:?}", e);
                AppError::Database(e)
            })?;

        info!(
            "Account deleted: id={}, files_removed={}",
            user_id,
            keys.len()
        );
        Ok(DeleteAccountResponseDto {
            deleted: true,
            files_removed: keys.len(),
        })
    }
}
