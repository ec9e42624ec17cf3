use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::activities::ActivityService;
use crate::features::dashboard::dtos::{DashboardStatsDto, FileTotals};
use crate::shared::constants::DASHBOARD_RECENT_ACTIVITIES;

/// Per-user overview shown after sign-in
pub struct DashboardService {
    pool: PgPool,
    activities: Arc<ActivityService>,
}

impl DashboardService {
    pub fn new(pool: PgPool, activities: Arc<ActivityService>) -> Self {
        Self { pool, activities }
    }

    pub async fn stats(&self, user_id: Uuid) -> Result<DashboardStatsDto> {
        let totals = sqlx::query_as::<_, FileTotals>(
            r#"
            SELECT
                COUNT(*) AS total_files,
                COUNT(*) FILTER (WHERE created_at >= date_trunc('day', NOW())) AS files_today,
                COALESCE(SUM(row_count), 0)::BIGINT AS total_rows,
                COALESCE(SUM(file_size), 0)::BIGINT AS storage_used
            FROM files
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get dashboard totals: {:?}", e);
            AppError::Database(e)
        })?;

        let recent_activities = self
            .activities
            .list_recent(user_id, DASHBOARD_RECENT_ACTIVITIES)
            .await?;

        Ok(DashboardStatsDto {
            totals,
            recent_activities,
        })
    }
}
