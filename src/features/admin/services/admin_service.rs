use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::activities::dtos::AdminActivityDto;
use crate::features::activities::ActivityService;
use crate::features::admin::dtos::{AdminStatsDto, AdminUserDto};
use crate::features::auth::models::UserStatus;
use crate::shared::constants::ADMIN_RECENT_ACTIVITIES;

/// Service for admin queries
pub struct AdminService {
    pool: PgPool,
    activities: Arc<ActivityService>,
}

impl AdminService {
    pub fn new(pool: PgPool, activities: Arc<ActivityService>) -> Self {
        Self { pool, activities }
    }

    pub async fn stats(&self) -> Result<AdminStatsDto> {
        let stats = sqlx::query_as::<_, AdminStatsDto>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COUNT(*) FROM files) AS total_files,
                (SELECT COUNT(*) FROM activities) AS total_activities,
                (SELECT COUNT(*) FROM users
                    WHERE created_at >= date_trunc('day', NOW())) AS new_users_today,
                (SELECT COUNT(*) FROM files
                    WHERE created_at >= date_trunc('day', NOW())) AS files_today,
                (SELECT COALESCE(SUM(file_size), 0)::BIGINT FROM files) AS total_storage
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get admin stats: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(stats)
    }

    /// List users with pagination
    /// Returns (users, total_count)
    pub async fn list_users(&self, offset: i64, limit: i64) -> Result<(Vec<AdminUserDto>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count users: {:?}", e);
                AppError::Database(e)
            })?;

        let users = sqlx::query_as::<_, AdminUserDto>(
            r#"
            SELECT u.id, u.email, u.name, u.role, u.status, u.last_login_at, u.created_at,
                   (SELECT COUNT(*) FROM files f WHERE f.user_id = u.id) AS file_count
            FROM users u
            ORDER BY u.created_at DESC
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list users: {:?}", e);
            AppError::Database(e)
        })?;

        Ok((users, total))
    }

    /// Change an account's status. Admins cannot block their own account.
    pub async fn set_user_status(
        &self,
        admin_id: Uuid,
        user_id: Uuid,
        status: UserStatus,
    ) -> Result<AdminUserDto> {
        if admin_id == user_id && status == UserStatus::Blocked {
            return Err(AppError::BadRequest(
                "You cannot block your own account".to_string(),
            ));
        }

        let user = sqlx::query_as::<_, AdminUserDto>(
            r#"
            UPDATE users u
            SET status = $2, updated_at = NOW()
            WHERE u.id = $1
            RETURNING u.id, u.email, u.name, u.role, u.status, u.last_login_at, u.created_at,
                      (SELECT COUNT(*) FROM files f WHERE f.user_id = u.id) AS file_count
            "#,
        )
        .bind(user_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update user status: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        info!(
            "User status changed: id={}, status={}, by={}",
            user.id, user.status, admin_id
        );
        Ok(user)
    }

    pub async fn recent_activities(&self) -> Result<Vec<AdminActivityDto>> {
        self.activities.list_all_recent(ADMIN_RECENT_ACTIVITIES).await
    }
}
