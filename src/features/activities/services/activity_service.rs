use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::activities::dtos::{ActivityDto, AdminActivityDto};
use crate::features::activities::models::{Activity, ActivityType, NewActivity, ACTIVITY_COLUMNS};

/// Append-only activity log
pub struct ActivityService {
    pool: PgPool,
}

impl ActivityService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn log(&self, activity: NewActivity) -> Result<Activity> {
        let saved = sqlx::query_as::<_, Activity>(&format!(
            r#"
            INSERT INTO activities (user_id, activity_type, description, file_id, metadata)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            ACTIVITY_COLUMNS
        ))
        .bind(activity.user_id)
        .bind(activity.activity_type)
        .bind(&activity.description)
        .bind(activity.file_id)
        .bind(&activity.metadata)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to log activity: {:?}", e);
            AppError::Database(e)
        })?;

        debug!(
            "Activity logged: id={}, type={}, user={}",
            saved.id, saved.activity_type, saved.user_id
        );
        Ok(saved)
    }

    /// Newest activities of one user
    pub async fn list_recent(&self, user_id: Uuid, limit: i64) -> Result<Vec<ActivityDto>> {
        let rows = sqlx::query_as::<_, Activity>(&format!(
            "SELECT {} FROM activities WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
            ACTIVITY_COLUMNS
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ActivityDto::from).collect())
    }

    /// A user's activities on one file with the given types, newest first
    pub async fn list_for_file(
        &self,
        user_id: Uuid,
        file_id: Uuid,
        types: &[ActivityType],
        limit: Option<i64>,
    ) -> Result<Vec<Activity>> {
        let type_names: Vec<String> = types.iter().map(ToString::to_string).collect();

        let rows = sqlx::query_as::<_, Activity>(&format!(
            r#"
            SELECT {} FROM activities
            WHERE user_id = $1 AND file_id = $2 AND activity_type::text = ANY($3)
            ORDER BY created_at DESC
            LIMIT $4
            "#,
            ACTIVITY_COLUMNS
        ))
        .bind(user_id)
        .bind(file_id)
        .bind(&type_names)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Newest activities across all users, with the owner's email
    pub async fn list_all_recent(&self, limit: i64) -> Result<Vec<AdminActivityDto>> {
        let rows = sqlx::query_as::<_, AdminActivityDto>(
            r#"
            SELECT a.id, a.user_id, u.email AS user_email, a.activity_type, a.description,
                   a.file_id, a.metadata, a.created_at
            FROM activities a
            JOIN users u ON u.id = a.user_id
            ORDER BY a.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
